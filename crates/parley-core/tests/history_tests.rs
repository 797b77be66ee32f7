//! History builder integration tests
//!
//! Provider isolation and sliding-window properties over realistic
//! multi-provider conversations.

use parley_core::context::{
    build_history, estimate_tokens, filter_by_provider, window, HistoryBuilder, WindowLimits,
};
use parley_core::provider::{Message, Role};

/// Alternating user/assistant turns tagged with `provider`
fn turns(provider: &str, count: usize, offset: usize) -> Vec<Message> {
    (0..count)
        .map(|i| {
            let n = offset + i;
            let msg = if n % 2 == 0 {
                Message::user(format!("question {} about the {} stack", n, provider))
            } else {
                Message::assistant(format!("answer {} from {}", n, provider))
            };
            msg.with_provider(provider)
        })
        .collect()
}

/// Six anthropic messages with two openai messages and a system notice mixed in
fn mixed_conversation() -> Vec<Message> {
    let mut conversation = turns("anthropic", 3, 0);
    conversation.extend(turns("openai", 2, 100));
    conversation.push(Message::system("Error: rate limit exceeded"));
    conversation.extend(turns("anthropic", 3, 3));
    conversation
}

mod filter_tests {
    use super::*;

    #[test]
    fn test_filter_is_idempotent() {
        let conversation = mixed_conversation();
        for provider in ["anthropic", "openai", "gemini", ""] {
            let once = filter_by_provider(&conversation, provider);
            let twice = filter_by_provider(&once, provider);
            assert_eq!(once, twice, "provider {:?}", provider);
        }
    }

    #[test]
    fn test_filter_keeps_order_and_drops_system() {
        let filtered = filter_by_provider(&mixed_conversation(), "anthropic");
        assert_eq!(filtered.len(), 6);
        assert!(filtered.iter().all(|m| m.role != Role::System));
        assert!(filtered.iter().all(|m| m.provider_tag() == "anthropic"));
        assert!(filtered[0].content.starts_with("question 0"));
        assert!(filtered[5].content.starts_with("answer 5"));
    }

    #[test]
    fn test_untagged_never_matches_named_provider() {
        let conversation = vec![Message::user("untagged"), Message::assistant("also untagged")];
        assert!(filter_by_provider(&conversation, "anthropic").is_empty());
        assert_eq!(filter_by_provider(&conversation, "").len(), 2);
    }
}

mod window_tests {
    use super::*;

    #[test]
    fn test_provider_switch_scenario() {
        let history = build_history(
            &mixed_conversation(),
            "anthropic",
            "what changed?",
            WindowLimits::new(4, 0),
        );

        assert_eq!(history.len(), 5);
        let expected: Vec<Message> = filter_by_provider(&mixed_conversation(), "anthropic")
            .into_iter()
            .skip(2)
            .collect();
        assert_eq!(&history[..4], expected.as_slice());
        assert!(history.iter().all(|m| m.provider_tag() != "openai"));

        let last = history.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "what changed?");
        assert_eq!(last.provider, None);
    }

    #[test]
    fn test_message_limit_yields_suffix() {
        let filtered = filter_by_provider(&mixed_conversation(), "anthropic");
        for n in 1..=8 {
            let windowed = window(filtered.clone(), WindowLimits::new(n, 0));
            assert!(windowed.len() <= n);
            assert!(filtered.ends_with(&windowed), "limit {}", n);
            assert_eq!(windowed.len(), n.min(filtered.len()));
        }
    }

    #[test]
    fn test_token_limit_yields_longest_fitting_suffix() {
        let filtered = filter_by_provider(&mixed_conversation(), "anthropic");
        for budget in [1, 5, 8, 13, 20, 40, 1000] {
            let windowed = window(filtered.clone(), WindowLimits::new(0, budget));
            let used: usize = windowed.iter().map(|m| estimate_tokens(&m.content)).sum();
            assert!(used <= budget, "budget {} used {}", budget, used);
            assert!(filtered.ends_with(&windowed));

            // One more message would not fit
            if windowed.len() < filtered.len() {
                let next = &filtered[filtered.len() - windowed.len() - 1];
                assert!(used + estimate_tokens(&next.content) > budget);
            }
        }
    }

    #[test]
    fn test_stricter_limit_applies() {
        let filtered = filter_by_provider(&mixed_conversation(), "anthropic");
        let by_count = window(filtered.clone(), WindowLimits::new(2, 0));
        let by_tokens = window(filtered.clone(), WindowLimits::new(0, 20));
        let both = window(filtered, WindowLimits::new(2, 20));
        assert_eq!(both.len(), by_count.len().min(by_tokens.len()));
    }

    #[test]
    fn test_empty_conversation_unlimited() {
        let history = HistoryBuilder::default().build(&[], "anthropic", "hello");
        assert_eq!(history, vec![Message::user("hello")]);
    }

    #[test]
    fn test_builder_matches_free_function() {
        let limits = WindowLimits::new(3, 50);
        let builder = HistoryBuilder::new(limits);
        assert_eq!(builder.limits(), limits);
        assert_eq!(
            builder.build(&mixed_conversation(), "openai", "next"),
            build_history(&mixed_conversation(), "openai", "next", limits)
        );
    }
}
