//! Tool system for the conversation core
//!
//! The orchestrator only sees [`ToolExecutor`]: something that can list tool
//! descriptors and execute a named tool. [`ToolRegistry`] is the standard
//! executor, dispatching to registered [`Tool`] implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, ToolError};
use crate::provider::ToolInput;

/// Tool definition for LLM consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Outcome of one tool execution
///
/// Failures are data, not errors: they are shown to the model like any other
/// result so it can react to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Failed result built from an executor error
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            success: false,
            output: format!("Error: {:#}", err),
            error: Some(format!("{:#}", err)),
        }
    }
}

/// Executes tool calls on behalf of the orchestrator
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute tool `name` with `input`
    async fn execute(
        &self,
        cancel: &CancellationToken,
        name: &str,
        input: &ToolInput,
    ) -> anyhow::Result<ToolResult>;

    /// Tools available to the model
    fn list_tools(&self) -> Vec<ToolDescriptor>;
}

/// Core trait for registry-backed tools
pub trait Tool: Send + Sync {
    /// Tool name (used by LLM to invoke)
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with given parameters
    fn execute(&self, input: ToolInput) -> BoxFuture<'_, Result<ToolResult, ToolError>>;

    /// Convert to tool descriptor for LLM
    fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Registry of available tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// List all available tools, sorted by name
    pub fn list(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.values().map(|t| t.to_descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(
        &self,
        cancel: &CancellationToken,
        name: &str,
        input: &ToolInput,
    ) -> anyhow::Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!(tool = name, params = input.len(), "Executing tool");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled.into()),
            result = tool.execute(input.clone()) => Ok(result?),
        }
    }

    fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.list()
    }
}
