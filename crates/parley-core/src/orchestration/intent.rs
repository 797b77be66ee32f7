//! Action-intent detection
//!
//! Flags replies where the model announced an action ("I'll read the file")
//! but ended its turn without calling a tool. Tuned for recall: a false
//! positive costs one extra round-trip, a false negative lets an unactioned
//! promise reach the user.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Phrases announcing that the model is about to act
pub const INTENT_PHRASES: &[&str] = &[
    "i'll",
    "i will",
    "let me",
    "i'm going to",
    "i am going to",
    "now i'll",
    "now i will",
    "first, i'll",
    "first, i will",
    "i'll now",
    "i will now",
];

/// Verbs that make an intent phrase actionable
pub const ACTION_VERBS: &[&str] = &[
    "read", "edit", "fix", "update", "modify", "change", "create", "delete", "search", "find",
    "execute", "run", "check", "validate", "describe", "list", "use", "start", "begin", "try",
    "call", "invoke", "get", "fetch", "retrieve", "query",
];

/// Heuristic classifier over an intent-phrase list and an action-verb list
#[derive(Debug, Clone)]
pub struct IntentDetector {
    phrases: Vec<String>,
    verbs: HashSet<String>,
}

impl Default for IntentDetector {
    fn default() -> Self {
        Self::new(INTENT_PHRASES, ACTION_VERBS)
    }
}

impl IntentDetector {
    pub fn new(phrases: &[&str], verbs: &[&str]) -> Self {
        Self {
            phrases: phrases.iter().map(|p| p.to_lowercase()).collect(),
            verbs: verbs.iter().map(|v| v.to_lowercase()).collect(),
        }
    }

    /// True if `text` contains an intent phrase and an action verb as a word
    pub fn detect(&self, text: &str) -> bool {
        let lower = text.to_lowercase().replace('\u{2019}', "'");

        if !self.phrases.iter().any(|p| lower.contains(p.as_str())) {
            return false;
        }

        lower
            .split(|c: char| !(c.is_alphanumeric() || matches!(c, '\'' | '_' | '-')))
            .any(|word| self.verbs.contains(word))
    }
}

static DEFAULT_DETECTOR: LazyLock<IntentDetector> = LazyLock::new(IntentDetector::default);

/// Detect action intent using the default phrase and verb lists
pub fn detect_action_intent(text: &str) -> bool {
    DEFAULT_DETECTOR.detect(text)
}
