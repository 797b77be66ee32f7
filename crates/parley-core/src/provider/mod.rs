//! LLM provider abstraction
//!
//! The conversation core never talks to a vendor directly. Every backend
//! (Anthropic, OpenAI, Gemini, Bedrock, ...) sits behind [`ProviderClient`],
//! which must normalize vendor stop reasons to [`StopReason`] and report
//! token counts as [`Usage`].

pub mod errors;
pub mod usage;

pub use errors::{classify_error, classify_message, clean_error_message, ClassifiedError, ErrorKind};
pub use usage::{combine_usage, format_usage, Usage, UsageTracker};

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::tools::ToolDescriptor;

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation message
///
/// `provider` records which backend produced (or was sent) the turn. It is
/// only ever set on User/Assistant messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            provider: None,
        }
    }

    /// Tag the message with a provider. System messages stay untagged.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        if self.role != Role::System {
            let provider = provider.into();
            self.provider = (!provider.is_empty()).then_some(provider);
        }
        self
    }

    /// Provider tag, with an absent tag read as the empty string
    pub fn provider_tag(&self) -> &str {
        self.provider.as_deref().unwrap_or("")
    }
}

/// Tool input value
///
/// Tool arguments arrive from the model as arbitrary JSON. They are kept as an
/// explicit union rather than an untyped map so summaries and serialization
/// stay type-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ToolValue>),
    Map(BTreeMap<String, ToolValue>),
}

impl ToolValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ToolValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.clone())
    }
}

impl fmt::Display for ToolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolValue::Null => f.write_str("null"),
            ToolValue::Bool(b) => write!(f, "{}", b),
            ToolValue::Integer(i) => write!(f, "{}", i),
            ToolValue::Float(x) => write!(f, "{}", x),
            ToolValue::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for ToolValue {
    fn from(s: &str) -> Self {
        ToolValue::String(s.to_string())
    }
}

impl From<String> for ToolValue {
    fn from(s: String) -> Self {
        ToolValue::String(s)
    }
}

impl From<bool> for ToolValue {
    fn from(b: bool) -> Self {
        ToolValue::Bool(b)
    }
}

impl From<i64> for ToolValue {
    fn from(i: i64) -> Self {
        ToolValue::Integer(i)
    }
}

impl From<serde_json::Value> for ToolValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ToolValue::Null,
            Value::Bool(b) => ToolValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ToolValue::Integer(i),
                None => ToolValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => ToolValue::String(s),
            Value::Array(items) => ToolValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                ToolValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<ToolValue> for serde_json::Value {
    fn from(value: ToolValue) -> Self {
        use serde_json::Value;
        match value {
            ToolValue::Null => Value::Null,
            ToolValue::Bool(b) => Value::Bool(b),
            ToolValue::Integer(i) => Value::from(i),
            ToolValue::Float(x) => serde_json::Number::from_f64(x)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ToolValue::String(s) => Value::String(s),
            ToolValue::List(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            ToolValue::Map(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Tool arguments keyed by parameter name
pub type ToolInput = BTreeMap<String, ToolValue>;

/// A model-issued request to invoke a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: ToolInput,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: ToolInput) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// String-valued argument, if present
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(ToolValue::as_str)
    }
}

/// Why generation stopped, normalized across vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
}

/// Response from a tool-enabled provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: StopReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Response {
    /// A plain text completion
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
            usage: None,
        }
    }

    /// A tool-use completion with optional reasoning text
    pub fn tool_use(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            stop_reason: StopReason::ToolUse,
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// The model asked for at least one tool call
    pub fn wants_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse && !self.tool_calls.is_empty()
    }

    /// No text and no tool calls (throttling or truncation upstream)
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && !self.wants_tools()
    }
}

/// Backend client consumed by the turn orchestrator
///
/// Implementations should observe `cancel` inside their HTTP calls. A `None`
/// response means the backend answered without a body.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Provider name (e.g., "anthropic", "openai")
    fn name(&self) -> &str;

    /// Send the full message list with tool definitions attached
    async fn send_with_tools_and_history(
        &self,
        cancel: &CancellationToken,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> anyhow::Result<Option<Response>>;

    /// Send the message list without tools and return the reply text
    async fn send_with_history(
        &self,
        cancel: &CancellationToken,
        messages: &[Message],
    ) -> anyhow::Result<String>;
}
