//! Parley Core - conversational core of an infrastructure assistant
//!
//! This crate provides:
//! - Provider-isolated, windowed conversation history
//! - A cheap token estimator
//! - The turn orchestrator with its bounded tool loop and corrective nudge
//! - Action-intent detection
//! - Usage accounting and error classification
//! - Chat sessions with background persistence

pub mod config;
pub mod context;
pub mod error;
pub mod orchestration;
pub mod provider;
pub mod session;
pub mod tools;

pub use config::{Config, ConfigManager, HistoryConfig, TurnConfig};
pub use context::{
    build_history, estimate_tokens, filter_by_provider, format_token_count, window,
    HistoryBuilder, WindowLimits,
};
pub use error::{Error, Result, ToolError};
pub use orchestration::{
    detect_action_intent, IntentDetector, SystemPrompt, TurnOptions, TurnOrchestrator,
    TurnOutcome,
};
pub use provider::{
    classify_error, combine_usage, format_usage, ClassifiedError, ErrorKind, Message,
    ProviderClient, Response, Role, StopReason, ToolCall, ToolInput, ToolValue, Usage,
    UsageTracker,
};
pub use session::{ChatSession, MemorySessionStore, SessionStore, StoredMessage};
pub use tools::{Tool, ToolDescriptor, ToolExecutor, ToolRegistry, ToolResult};
