//! Turn orchestration
//!
//! Drives one user turn to completion:
//! - Sends the windowed history (plus an ephemeral tool-use instruction)
//! - Executes requested tool calls sequentially, in response order
//! - Feeds the results back and resubmits until the model answers
//! - Nudges the model once if it announced an action without a tool call
//! - Sums the usage of every provider call in the turn
//!
//! The tool loop is a plain loop with a bounded round counter. Each round's
//! user-visible narrative is accumulated so intermediate tool output survives
//! into the final answer.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::formatting::{format_tool_block, format_tool_result_for_llm, tool_results_message};
use super::intent::IntentDetector;
use super::system_prompt::{SystemPrompt, CORRECTIVE_NUDGE};
use crate::provider::{
    classify_error, combine_usage, ClassifiedError, Message, ProviderClient, Response, Usage,
};
use crate::tools::{ToolDescriptor, ToolExecutor, ToolResult};

/// Default bound on tool rounds per turn
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// Separator between the tool narrative and the model's final answer
pub const RESULT_SEPARATOR: &str = "\n\n---\n\n";

const EMPTY_REPLY_NOTE: &str =
    "*Note: AI response was empty. This might indicate rate limiting or a timeout.*";
const EMPTY_RETRY_NOTE: &str = "*Note: AI retry response was empty.*";

/// Per-turn options
#[derive(Debug, Clone)]
pub struct TurnOptions {
    /// Maximum tool rounds before the turn is closed with a note (minimum 1)
    pub max_tool_iterations: usize,
    /// Instruction submitted with tool-enabled calls
    pub system_prompt: SystemPrompt,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            system_prompt: SystemPrompt::default(),
        }
    }
}

/// Final result of a successful turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Accumulated tool narrative (if any), separator, and final model text
    pub content: String,
    /// Sum of every usage reported during the turn
    pub usage: Option<Usage>,
    /// Number of tool rounds executed
    pub tool_rounds: usize,
    /// Whether the corrective nudge was sent
    pub nudged: bool,
}

/// Mutable bookkeeping for one turn
#[derive(Debug, Default)]
struct TurnState {
    usage: Option<Usage>,
    narrative: Vec<String>,
    rounds: usize,
    nudged: bool,
    /// Reply that triggered the nudge, shown ahead of the retry's answer
    nudged_reply: Option<String>,
}

impl TurnState {
    fn finish(self, final_text: String) -> TurnOutcome {
        let content = if self.narrative.is_empty() {
            final_text
        } else {
            format!("{}{}{}", self.narrative.join("\n\n"), RESULT_SEPARATOR, final_text)
        };
        TurnOutcome {
            content,
            usage: self.usage,
            tool_rounds: self.rounds,
            nudged: self.nudged,
        }
    }

    /// Final text when the model returned nothing usable
    fn finish_empty(mut self) -> TurnOutcome {
        match self.nudged_reply.take() {
            Some(reply) if self.narrative.is_empty() => self.finish(reply),
            Some(reply) => self.finish(format!("{}\n\n{}", reply, EMPTY_RETRY_NOTE)),
            None => self.finish(EMPTY_REPLY_NOTE.to_string()),
        }
    }
}

/// Runs turns against one provider and an optional tool executor
pub struct TurnOrchestrator {
    provider: Arc<dyn ProviderClient>,
    executor: Option<Arc<dyn ToolExecutor>>,
    options: TurnOptions,
    detector: IntentDetector,
}

impl TurnOrchestrator {
    pub fn new(provider: Arc<dyn ProviderClient>) -> Self {
        Self {
            provider,
            executor: None,
            options: TurnOptions::default(),
            detector: IntentDetector::default(),
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_options(mut self, options: TurnOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_intent_detector(mut self, detector: IntentDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn provider(&self) -> &Arc<dyn ProviderClient> {
        &self.provider
    }

    pub fn options(&self) -> &TurnOptions {
        &self.options
    }

    /// Run one turn over `history` (already windowed, ending with the new user message)
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        history: Vec<Message>,
    ) -> Result<TurnOutcome, ClassifiedError> {
        if cancel.is_cancelled() {
            return Err(ClassifiedError::cancelled());
        }

        let tools = self
            .executor
            .as_ref()
            .map(|e| e.list_tools())
            .unwrap_or_default();

        if tools.is_empty() {
            return self.run_without_tools(cancel, history).await;
        }

        let mut messages = self.preamble(true);
        messages.extend(history);
        let max_rounds = self.options.max_tool_iterations.max(1);
        let mut state = TurnState::default();

        loop {
            let response = self.send(cancel, &messages, &tools).await?;
            let Some(response) = response else {
                if state.rounds == 0 && !state.nudged {
                    return Err(ClassifiedError::empty_response());
                }
                warn!(rounds = state.rounds, "Provider returned no response, closing turn");
                return Ok(state.finish_empty());
            };
            state.usage = combine_usage(state.usage, response.usage);

            if response.wants_tools() {
                if state.rounds >= max_rounds {
                    warn!(max_rounds, "Tool round limit reached, closing turn");
                    let note = format!(
                        "*Note: Stopped after {} tool rounds. Ask again to continue.*",
                        max_rounds
                    );
                    return Ok(state.finish(note));
                }

                state.nudged_reply = None;
                let narrative = self.run_tool_round(cancel, &response, &mut messages).await?;
                state.narrative.push(narrative);
                state.rounds += 1;
                continue;
            }

            if response.is_empty() {
                if state.rounds == 0 && !state.nudged {
                    return Err(ClassifiedError::empty_response());
                }
                warn!(rounds = state.rounds, "Provider returned empty content, closing turn");
                return Ok(state.finish_empty());
            }

            if !state.nudged && self.detector.detect(&response.content) {
                info!("Model described an action without calling a tool, sending corrective nudge");
                state.nudged = true;
                messages.push(Message::assistant(&response.content));
                messages.push(Message::user(CORRECTIVE_NUDGE));
                state.nudged_reply = Some(response.content);
                continue;
            }

            let final_text = match state.nudged_reply.take() {
                Some(reply) => format!("{}\n\n{}", reply, response.content),
                None => response.content,
            };
            debug!(rounds = state.rounds, nudged = state.nudged, "Turn complete");
            return Ok(state.finish(final_text));
        }
    }

    /// Single plain call used when no tools are registered
    async fn run_without_tools(
        &self,
        cancel: &CancellationToken,
        history: Vec<Message>,
    ) -> Result<TurnOutcome, ClassifiedError> {
        let mut messages = self.preamble(false);
        messages.extend(history);

        debug!(
            provider = self.provider.name(),
            messages = messages.len(),
            "Sending without tools"
        );
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClassifiedError::cancelled()),
            result = self.provider.send_with_history(cancel, &messages) => result,
        };
        let text = result.map_err(|e| self.classify(cancel, &e))?;
        if text.trim().is_empty() {
            return Err(ClassifiedError::empty_response());
        }

        Ok(TurnState::default().finish(text))
    }

    /// Ephemeral System messages placed ahead of the history
    fn preamble(&self, with_tools: bool) -> Vec<Message> {
        let prompt = &self.options.system_prompt;
        let mut messages = Vec::new();
        if with_tools {
            messages.push(Message::system(prompt.base()));
        }
        if let Some(context) = prompt.context() {
            messages.push(Message::system(context));
        }
        messages
    }

    async fn send(
        &self,
        cancel: &CancellationToken,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<Option<Response>, ClassifiedError> {
        if cancel.is_cancelled() {
            return Err(ClassifiedError::cancelled());
        }

        debug!(
            provider = self.provider.name(),
            messages = messages.len(),
            tools = tools.len(),
            "Sending to provider"
        );
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClassifiedError::cancelled()),
            result = self.provider.send_with_tools_and_history(cancel, messages, tools) => result,
        };
        result.map_err(|e| self.classify(cancel, &e))
    }

    fn classify(&self, cancel: &CancellationToken, err: &anyhow::Error) -> ClassifiedError {
        if cancel.is_cancelled() {
            return ClassifiedError::cancelled();
        }
        let classified = classify_error(err);
        warn!(
            provider = self.provider.name(),
            kind = ?classified.kind,
            "Provider call failed: {:#}",
            err
        );
        classified
    }

    /// Execute every tool call in order and fold the results into `messages`
    ///
    /// Returns the user-visible narrative for this round.
    async fn run_tool_round(
        &self,
        cancel: &CancellationToken,
        response: &Response,
        messages: &mut Vec<Message>,
    ) -> Result<String, ClassifiedError> {
        let Some(executor) = self.executor.as_ref() else {
            return Err(ClassifiedError::generic(
                "Tool use requested but no tool executor is configured",
            ));
        };

        let mut user_blocks = Vec::with_capacity(response.tool_calls.len());
        let mut llm_blocks = Vec::with_capacity(response.tool_calls.len());

        for call in &response.tool_calls {
            if cancel.is_cancelled() {
                return Err(ClassifiedError::cancelled());
            }

            debug!(tool = %call.name, id = %call.id, "Executing tool call");
            let result = match executor.execute(cancel, &call.name, &call.input).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(tool = %call.name, "Tool execution failed: {:#}", e);
                    ToolResult::from_error(&e)
                }
            };

            user_blocks.push(format_tool_block(call, &result));
            llm_blocks.push(format_tool_result_for_llm(call, &result));
        }

        if !response.content.is_empty() {
            messages.push(Message::assistant(&response.content));
        }
        messages.push(Message::user(tool_results_message(&llm_blocks)));

        let mut narrative = String::new();
        if !response.content.is_empty() {
            narrative.push_str(&response.content);
            narrative.push_str("\n\n");
        }
        narrative.push_str(&user_blocks.join("\n\n"));
        Ok(narrative)
    }
}
