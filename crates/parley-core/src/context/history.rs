//! History construction for provider calls
//!
//! Turns a stored conversation into the exact message list submitted to a
//! backend: system notices are dropped, only turns belonging to the active
//! provider survive, and the result is windowed by message count and token
//! budget before the new user message is appended.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tokens::estimate_tokens;
use crate::provider::{Message, Role};

/// Sliding-window limits; 0 means unlimited
///
/// When both are set, whichever prunes more wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLimits {
    pub max_messages: usize,
    pub max_tokens: usize,
}

impl WindowLimits {
    pub fn new(max_messages: usize, max_tokens: usize) -> Self {
        Self {
            max_messages,
            max_tokens,
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_messages == 0 && self.max_tokens == 0
    }
}

/// Keep only User/Assistant messages tagged with `provider`
///
/// An untagged message only matches an empty provider key.
pub fn filter_by_provider(conversation: &[Message], provider: &str) -> Vec<Message> {
    conversation
        .iter()
        .filter(|m| m.role != Role::System && m.provider_tag() == provider)
        .cloned()
        .collect()
}

/// Index of the first message to keep after applying `limits`
fn prune_index(messages: &[Message], limits: WindowLimits) -> usize {
    let mut prune = 0;

    if limits.max_messages > 0 && messages.len() > limits.max_messages {
        prune = messages.len() - limits.max_messages;
    }

    if limits.max_tokens > 0 {
        let mut total = 0;
        let mut token_prune = 0;
        for (i, msg) in messages.iter().enumerate().rev() {
            let tokens = estimate_tokens(&msg.content);
            if total + tokens > limits.max_tokens {
                token_prune = i + 1;
                break;
            }
            total += tokens;
        }
        prune = prune.max(token_prune);
    }

    prune
}

/// Trim `messages` to the most recent suffix allowed by `limits`
pub fn window(mut messages: Vec<Message>, limits: WindowLimits) -> Vec<Message> {
    let prune = prune_index(&messages, limits);
    if prune > 0 {
        debug!(
            kept = messages.len() - prune,
            pruned = prune,
            max_messages = limits.max_messages,
            max_tokens = limits.max_tokens,
            "Windowed conversation history"
        );
        messages.drain(..prune);
    }
    messages
}

/// Build the message list for one provider call
///
/// The new user message is appended untagged; the caller tags it once it has
/// been recorded in the session.
pub fn build_history(
    conversation: &[Message],
    active_provider: &str,
    new_user_text: &str,
    limits: WindowLimits,
) -> Vec<Message> {
    let mut messages = window(filter_by_provider(conversation, active_provider), limits);
    messages.push(Message::user(new_user_text));
    messages
}

/// History builder bound to a fixed set of window limits
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryBuilder {
    limits: WindowLimits,
}

impl HistoryBuilder {
    pub fn new(limits: WindowLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> WindowLimits {
        self.limits
    }

    pub fn build(
        &self,
        conversation: &[Message],
        active_provider: &str,
        new_user_text: &str,
    ) -> Vec<Message> {
        build_history(conversation, active_provider, new_user_text, self.limits)
    }
}
