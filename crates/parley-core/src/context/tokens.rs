//! Token estimation utilities for context management
//!
//! A vendor-agnostic heuristic: roughly 1.3 tokens per whitespace-separated
//! word. Accurate to within 10-20% for English prose and config files, which
//! is enough to keep history under a budget. It is not meant for billing.

/// Estimate the token count of `text`
///
/// `words × 1.3`, truncated toward zero. Empty text is 0 tokens.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    words * 13 / 10
}

/// Format a token count for display (e.g. `7.1k`, `15k`, `1.2M`)
pub fn format_token_count(count: u64) -> String {
    match count {
        0..1_000 => count.to_string(),
        1_000..1_000_000 => {
            let k = count as f64 / 1_000.0;
            if k < 10.0 {
                format!("{:.1}k", k)
            } else {
                format!("{:.0}k", k)
            }
        }
        _ => {
            let m = count as f64 / 1_000_000.0;
            if m < 10.0 {
                format!("{:.1}M", m)
            } else {
                format!("{:.0}M", m)
            }
        }
    }
}
