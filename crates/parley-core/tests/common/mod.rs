//! Shared test collaborators
//!
//! Scripted provider and recording tool executor used by the turn and
//! session integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use parley_core::provider::{Message, ProviderClient, Response};
use parley_core::tools::{ToolDescriptor, ToolExecutor, ToolResult};
use parley_core::ToolInput;

/// Install a test subscriber once; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One scripted provider reply
pub enum Reply {
    Respond(Option<Response>),
    Fail(String),
    /// Sleep before answering; used to exercise timeouts
    Slow(Duration, Response),
}

/// Provider that replays scripted replies and records every request
pub struct ScriptedProvider {
    name: String,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(name: &str, replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Vec<Message> {
        self.requests.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_with_tools_and_history(
        &self,
        _cancel: &CancellationToken,
        messages: &[Message],
        _tools: &[ToolDescriptor],
    ) -> anyhow::Result<Option<Response>> {
        self.requests.lock().push(messages.to_vec());
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(anyhow::anyhow!(message)),
            Some(Reply::Slow(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(Some(response))
            }
            None => Err(anyhow::anyhow!("script exhausted")),
        }
    }

    async fn send_with_history(
        &self,
        cancel: &CancellationToken,
        messages: &[Message],
    ) -> anyhow::Result<String> {
        let response = self.send_with_tools_and_history(cancel, messages, &[]).await?;
        Ok(response.map(|r| r.content).unwrap_or_default())
    }
}

/// Tool executor that returns canned outputs and records each call
pub struct RecordingExecutor {
    tools: Vec<ToolDescriptor>,
    calls: Mutex<Vec<(String, ToolInput)>>,
}

impl RecordingExecutor {
    pub fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            tools: names
                .iter()
                .map(|name| ToolDescriptor {
                    name: name.to_string(),
                    description: format!("{} tool", name),
                    parameters: serde_json::json!({ "type": "object" }),
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, ToolInput)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ToolExecutor for RecordingExecutor {
    async fn execute(
        &self,
        _cancel: &CancellationToken,
        name: &str,
        input: &ToolInput,
    ) -> anyhow::Result<ToolResult> {
        self.calls.lock().push((name.to_string(), input.clone()));
        match name {
            "read_file" => Ok(ToolResult::success("region: us-east-1\nstage: prod\ncidr: 10.0.0.0/16")),
            "failing_tool" => anyhow::bail!("permission denied: /etc/shadow"),
            "empty_tool" => Ok(ToolResult::success("")),
            other => Ok(ToolResult::success(format!("{} done", other))),
        }
    }

    fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.clone()
    }
}

/// Tool input from string pairs
pub fn input(pairs: &[(&str, &str)]) -> ToolInput {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), (*v).into()))
        .collect()
}
