//! Provider error classification
//!
//! Maps raw provider/transport errors onto a closed, user-facing taxonomy.
//! Matching is done on the rendered error text, most specific pattern first.
//! The order matters: a single raw message can match several patterns
//! (e.g. a 429 body that also mentions a 404 URL).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Closed set of turn failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedToolCalling,
    RateLimited,
    AuthFailed,
    PermissionDenied,
    ModelNotFound,
    Timeout,
    ContextTooLong,
    /// Provider answered without any content or tool calls
    EmptyResponse,
    Cancelled,
    Generic,
}

impl ErrorKind {
    /// Fixed user-facing message, if the kind has one
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            ErrorKind::UnsupportedToolCalling => Some(
                "This model doesn't support function calling (tool use). Please switch to a different model.",
            ),
            ErrorKind::RateLimited => Some(
                "Rate limit exceeded. Please wait a moment and try again, or contact your provider to increase your rate limit.",
            ),
            ErrorKind::AuthFailed => Some("Authentication failed. Please check your API key configuration."),
            ErrorKind::PermissionDenied => Some(
                "Permission denied. Your API key may not have access to this model or feature.",
            ),
            ErrorKind::ModelNotFound => Some("Model not found. Please check your model configuration."),
            ErrorKind::Timeout => Some(
                "Request timed out. The AI provider took too long to respond. Please try again.",
            ),
            ErrorKind::ContextTooLong => Some(
                "Context length exceeded. Your conversation is too long. Try starting a new session.",
            ),
            ErrorKind::EmptyResponse => Some(
                "Received an empty response from the AI provider. This might indicate rate limiting or truncation.",
            ),
            ErrorKind::Cancelled => Some("Request cancelled"),
            ErrorKind::Generic => None,
        }
    }

    /// Whether the failure came from the caller cancelling the turn
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ErrorKind::Cancelled)
    }
}

/// A turn failure, ready to show to the user
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    /// Build an error of `kind` using its fixed message
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.user_message().unwrap_or_default().to_string(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Generic,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::from_kind(ErrorKind::Cancelled)
    }

    pub fn empty_response() -> Self {
        Self::from_kind(ErrorKind::EmptyResponse)
    }

    pub fn timeout() -> Self {
        Self::from_kind(ErrorKind::Timeout)
    }
}

/// Classify an error by its full rendered chain (`outer: inner: ...`)
pub fn classify_error(err: &anyhow::Error) -> ClassifiedError {
    classify_message(&format!("{:#}", err))
}

/// Classify raw error text
pub fn classify_message(text: &str) -> ClassifiedError {
    match detect_kind(text) {
        ErrorKind::Generic => ClassifiedError::generic(clean_error_message(text)),
        kind => ClassifiedError::from_kind(kind),
    }
}

fn detect_kind(text: &str) -> ErrorKind {
    let lower = text.to_lowercase();
    let has = |needle: &str| text.contains(needle);

    if lower.contains("function calling")
        && (lower.contains("not enabled") || lower.contains("not supported"))
    {
        return ErrorKind::UnsupportedToolCalling;
    }
    if has("429") || has("Too Many Requests") || has("rate_limit_error") {
        return ErrorKind::RateLimited;
    }
    if has("401") || has("Unauthorized") || has("authentication_error") {
        return ErrorKind::AuthFailed;
    }
    if has("403") || has("Forbidden") || has("permission_error") {
        return ErrorKind::PermissionDenied;
    }
    if has("404") || has("Not Found") || has("model not found") {
        return ErrorKind::ModelNotFound;
    }
    if ["timeout", "timed out", "deadline exceeded"]
        .iter()
        .any(|p| lower.contains(p))
    {
        return ErrorKind::Timeout;
    }
    if has("context_length_exceeded") || lower.contains("maximum context length") {
        return ErrorKind::ContextTooLong;
    }
    ErrorKind::Generic
}

/// Wrapper prefixes added by provider clients around the real error
const WRAPPER_PREFIXES: &[&str] = &[
    "failed to send message: ",
    "failed to send message with tools: ",
    "failed to send messages with history: ",
    "failed to send messages with history and tools: ",
];

static REQUEST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\(request-id:.*$").expect("valid request-id pattern"));

static HTTP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:GET|POST|PUT|PATCH|DELETE) "[^"]*":\s*"#).expect("valid http prefix pattern")
});

/// Strip request IDs, JSON bodies, HTTP method/URL prefixes and wrapper prefixes
pub fn clean_error_message(text: &str) -> String {
    let mut msg = REQUEST_ID.replace(text, "").into_owned();

    if let Some(idx) = msg.find(r#"{"type":"error""#) {
        msg.truncate(idx);
    }

    let mut msg = msg.trim().to_string();
    loop {
        let before = msg.len();
        for prefix in WRAPPER_PREFIXES {
            if let Some(rest) = msg.strip_prefix(prefix) {
                msg = rest.to_string();
            }
        }
        msg = HTTP_PREFIX.replace(&msg, "").trim().to_string();
        if msg.len() == before {
            break;
        }
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str) -> ErrorKind {
        classify_message(text).kind
    }

    #[test]
    fn test_rate_limit() {
        assert_eq!(kind("429 Too Many Requests"), ErrorKind::RateLimited);
        assert_eq!(
            kind("failed to send messages: rate_limit_error: This request would exceed the rate limit"),
            ErrorKind::RateLimited
        );
        assert_eq!(
            classify_message(r#"POST "https://api.anthropic.com/v1/messages": 429 Too Many Requests"#).message,
            ErrorKind::RateLimited.user_message().unwrap()
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            kind(r#"POST "https://api.openai.com/v1/chat/completions": 401 Unauthorized"#),
            ErrorKind::AuthFailed
        );
        assert_eq!(kind("403 Forbidden: You do not have access to this model"), ErrorKind::PermissionDenied);
        assert_eq!(kind("404 Not Found: model xyz"), ErrorKind::ModelNotFound);
    }

    #[test]
    fn test_order_prefers_rate_limit() {
        assert_eq!(kind("upstream 404 while handling 429"), ErrorKind::RateLimited);
    }

    #[test]
    fn test_unsupported_function_calling_checked_first() {
        let text = "Error 400, Message: Function calling is not enabled for models/gemini-2.0-flash-preview-image-generation, Status: INVALID_ARGUMENT";
        assert_eq!(kind(text), ErrorKind::UnsupportedToolCalling);
        assert_eq!(kind("429: function calling not supported"), ErrorKind::UnsupportedToolCalling);
    }

    #[test]
    fn test_timeout_and_context() {
        assert_eq!(
            kind("context deadline exceeded: request timed out after 5 minutes"),
            ErrorKind::Timeout
        );
        assert_eq!(
            kind("context_length_exceeded: Your message exceeded the maximum context length"),
            ErrorKind::ContextTooLong
        );
    }

    #[test]
    fn test_generic_strips_json_body_and_http_prefix() {
        let err = classify_message(
            r#"POST "https://api.anthropic.com/v1/messages": 500 Internal Server Error {"type":"error","error":{"type":"internal_error","message":"Something went wrong"}}"#,
        );
        assert_eq!(err.kind, ErrorKind::Generic);
        assert_eq!(err.message, "500 Internal Server Error");
    }

    #[test]
    fn test_generic_strips_request_id_and_wrappers() {
        let err = classify_message(
            r#"failed to send messages with history and tools: POST "https://api.example.com/v1": 502 Bad Gateway (Request-ID: req_011CUYpGVDM4KU1nVwW9rzX4)"#,
        );
        assert_eq!(err.message, "502 Bad Gateway");
    }

    #[test]
    fn test_generic_passthrough() {
        assert_eq!(classify_message("network connection failed").message, "network connection failed");
    }

    #[test]
    fn test_classify_error_uses_full_chain() {
        let err = anyhow::anyhow!("429 Too Many Requests").context("failed to send message");
        assert_eq!(classify_error(&err).kind, ErrorKind::RateLimited);
    }

    #[test]
    fn test_cancellation_flag() {
        assert!(ClassifiedError::cancelled().kind.is_cancellation());
        assert!(!ClassifiedError::empty_response().kind.is_cancellation());
    }
}
