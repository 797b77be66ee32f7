//! Chat session
//!
//! Owns one session's conversation and cumulative usage, and runs turns
//! against the active provider. Messages are persisted in the background so
//! storage latency never delays the reply.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::store::SessionStore;
use crate::config::{Config, TurnConfig};
use crate::context::{HistoryBuilder, WindowLimits};
use crate::error::{Error, Result};
use crate::orchestration::{TurnOptions, TurnOrchestrator, TurnOutcome};
use crate::provider::{
    format_usage, ClassifiedError, Message, ProviderClient, Role, Usage, UsageTracker,
};
use crate::tools::ToolExecutor;

const CANCELLED_BY_USER: &str = "Request cancelled by user";

/// A conversation bound to one store session and one active provider
pub struct ChatSession {
    id: String,
    provider: String,
    client: Arc<dyn ProviderClient>,
    executor: Option<Arc<dyn ToolExecutor>>,
    store: Arc<dyn SessionStore>,
    conversation: Vec<Message>,
    history: HistoryBuilder,
    options: TurnOptions,
    turn_timeout: Duration,
    persist_timeout: Duration,
    usage: UsageTracker,
    pending_writes: Vec<JoinHandle<()>>,
}

impl ChatSession {
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        client: Arc<dyn ProviderClient>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let turn = TurnConfig::default();
        Self {
            id: id.into(),
            provider: provider.into(),
            client,
            executor: None,
            store,
            conversation: Vec::new(),
            history: HistoryBuilder::default(),
            options: turn.options(),
            turn_timeout: turn.turn_timeout(),
            persist_timeout: turn.persist_timeout(),
            usage: UsageTracker::new(),
            pending_writes: Vec::new(),
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Apply history limits and turn settings from configuration
    pub fn with_config(self, config: &Config) -> Self {
        self.with_history_limits(config.history.limits())
            .with_turn_config(&config.turn)
    }

    pub fn with_history_limits(mut self, limits: WindowLimits) -> Self {
        self.history = HistoryBuilder::new(limits);
        self
    }

    pub fn with_turn_config(mut self, turn: &TurnConfig) -> Self {
        let context = self.options.system_prompt.context().map(str::to_string);
        self.options = turn.options();
        if let Some(context) = context {
            self.options.system_prompt = self.options.system_prompt.with_context(context);
        }
        self.turn_timeout = turn.turn_timeout();
        self.persist_timeout = turn.persist_timeout();
        self
    }

    /// Context submitted with every turn as an ephemeral System message
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.options.system_prompt = self.options.system_prompt.with_context(context);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn last_usage(&self) -> Option<Usage> {
        self.usage.last()
    }

    pub fn cumulative_usage(&self) -> Usage {
        self.usage.cumulative()
    }

    /// Usage line for the last turn, empty when nothing was reported
    pub fn usage_footer(&self) -> String {
        format_usage(self.usage.last().as_ref())
    }

    /// Rebuild the conversation from the store
    ///
    /// Stored User/Assistant messages are tagged with the session's current
    /// provider. Returns the number of messages loaded.
    pub async fn load(&mut self) -> Result<usize> {
        let stored = self
            .store
            .get_messages(&self.id, 0)
            .await
            .map_err(|e| Error::Session(format!("Failed to load session {}: {:#}", self.id, e)))?;

        self.conversation = stored
            .into_iter()
            .map(|m| Message::new(m.role, m.content).with_provider(&self.provider))
            .collect();

        info!(session = %self.id, messages = self.conversation.len(), "Loaded session");
        Ok(self.conversation.len())
    }

    /// Point the session at another provider
    ///
    /// Stored history is untouched; messages tagged with other providers are
    /// simply no longer submitted.
    pub fn switch_provider(
        &mut self,
        provider: impl Into<String>,
        client: Arc<dyn ProviderClient>,
    ) {
        self.provider = provider.into();
        self.client = client;
        info!(session = %self.id, provider = %self.provider, "Switched provider");
    }

    /// Run one turn for `text`
    ///
    /// On failure a local System message describing the error is added to the
    /// conversation; it is never persisted or submitted.
    pub async fn send(
        &mut self,
        cancel: &CancellationToken,
        text: &str,
    ) -> std::result::Result<TurnOutcome, ClassifiedError> {
        let history = self.history.build(&self.conversation, &self.provider, text);

        self.conversation
            .push(Message::user(text).with_provider(&self.provider));
        self.persist(Role::User, text);

        let mut orchestrator =
            TurnOrchestrator::new(self.client.clone()).with_options(self.options.clone());
        if let Some(executor) = &self.executor {
            orchestrator = orchestrator.with_executor(executor.clone());
        }

        let turn = orchestrator.run(cancel, history);
        let result = match tokio::time::timeout(self.turn_timeout, turn).await {
            Ok(result) => result,
            Err(_) => {
                warn!(session = %self.id, timeout = ?self.turn_timeout, "Turn timed out");
                Err(ClassifiedError::timeout())
            }
        };

        match result {
            Ok(outcome) => {
                self.conversation
                    .push(Message::assistant(&outcome.content).with_provider(&self.provider));
                self.persist(Role::Assistant, &outcome.content);
                self.usage.record(outcome.usage);
                debug!(session = %self.id, rounds = outcome.tool_rounds, "Turn recorded");
                Ok(outcome)
            }
            Err(err) => {
                let notice = if err.kind.is_cancellation() {
                    CANCELLED_BY_USER.to_string()
                } else {
                    format!("Error: {}", err.message)
                };
                self.conversation.push(Message::system(notice));
                Err(err)
            }
        }
    }

    /// Wait for background persistence started so far
    pub async fn flush(&mut self) {
        for handle in self.pending_writes.drain(..) {
            if let Err(e) = handle.await {
                warn!("Persistence task failed: {}", e);
            }
        }
    }

    fn persist(&mut self, role: Role, content: &str) {
        self.pending_writes.retain(|handle| !handle.is_finished());

        let store = self.store.clone();
        let session_id = self.id.clone();
        let content = content.to_string();
        let limit = self.persist_timeout;

        self.pending_writes.push(tokio::spawn(async move {
            let write = store.add_message(&session_id, role, &content);
            match tokio::time::timeout(limit, write).await {
                Ok(Ok(())) => debug!(session = %session_id, %role, "Persisted message"),
                Ok(Err(e)) => {
                    warn!(session = %session_id, %role, "Failed to persist message: {:#}", e)
                }
                Err(_) => warn!(session = %session_id, %role, "Persisting message timed out"),
            }
        }));
    }
}
