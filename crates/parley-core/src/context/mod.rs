//! Context management for conversation turns
//!
//! This module provides:
//! - Token estimation (tokens)
//! - Provider-isolated, windowed history construction (history)

pub mod history;
pub mod tokens;

pub use history::{build_history, filter_by_provider, window, HistoryBuilder, WindowLimits};
pub use tokens::{estimate_tokens, format_token_count};
