//! Token usage accounting
//!
//! Per-call counters are merged nil-safely into a turn total, and turn totals
//! into a session-cumulative total that only ever grows.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::context::format_token_count;

/// Token counters reported by a provider for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    #[serde(default)]
    pub cache_read_tokens: u64,
    #[serde(default)]
    pub cache_creation_tokens: u64,
}

impl Usage {
    /// Usage with total = input + output and no cache activity
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
            ..Self::default()
        }
    }

    pub fn with_cache(mut self, read: u64, creation: u64) -> Self {
        self.cache_read_tokens = read;
        self.cache_creation_tokens = creation;
        self
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Usage) -> Usage {
        Usage {
            input_tokens: self.input_tokens.saturating_add(rhs.input_tokens),
            output_tokens: self.output_tokens.saturating_add(rhs.output_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
            cache_read_tokens: self.cache_read_tokens.saturating_add(rhs.cache_read_tokens),
            cache_creation_tokens: self
                .cache_creation_tokens
                .saturating_add(rhs.cache_creation_tokens),
        }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Usage) {
        *self = *self + rhs;
    }
}

/// Combine two optional usages: `None + None = None`, `None + x = x`
pub fn combine_usage(a: Option<Usage>, b: Option<Usage>) -> Option<Usage> {
    match (a, b) {
        (None, None) => None,
        (Some(u), None) | (None, Some(u)) => Some(u),
        (Some(a), Some(b)) => Some(a + b),
    }
}

/// Session-level usage counters
///
/// Reset only by replacing the tracker (i.e. the session) itself.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    last: Option<Usage>,
    cumulative: Usage,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the usage of a completed turn
    pub fn record(&mut self, usage: Option<Usage>) {
        if let Some(usage) = usage {
            self.last = Some(usage);
            self.cumulative += usage;
        }
    }

    /// Usage of the most recent turn that reported any
    pub fn last(&self) -> Option<Usage> {
        self.last
    }

    pub fn cumulative(&self) -> Usage {
        self.cumulative
    }
}

/// Format usage for display, e.g. `↑ 7.1k · ↓ 512 · cache: 3.0k`
///
/// Returns an empty string when there is nothing worth showing.
pub fn format_usage(usage: Option<&Usage>) -> String {
    let Some(usage) = usage else {
        return String::new();
    };
    if usage.total_tokens == 0 {
        return String::new();
    }

    let mut parts = Vec::new();
    if usage.input_tokens > 0 {
        parts.push(format!("↑ {}", format_token_count(usage.input_tokens)));
    }
    if usage.output_tokens > 0 {
        parts.push(format!("↓ {}", format_token_count(usage.output_tokens)));
    }
    if usage.cache_read_tokens > 0 {
        parts.push(format!("cache: {}", format_token_count(usage.cache_read_tokens)));
    }

    parts.join(" · ")
}
