//! Property tests for tokenization and containment correctness.

use linedex::index::IndexConfig;
use linedex::utils::{contains_tokens, tokenize};
use linedex::{Corpus, Engine};
use proptest::prelude::*;
use std::collections::HashSet;

/// Small alphabet so random phrases actually occur in random lines
fn line() -> impl Strategy<Value = String> {
    "[aAbBé .,!]{0,12}"
}

fn phrase() -> impl Strategy<Value = String> {
    "[aAbé .]{0,6}"
}

fn expected_lines(lines: &[String], phrase: &str) -> HashSet<u32> {
    let needle = tokenize(phrase);
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| contains_tokens(&tokenize(line), &needle))
        .map(|(i, _)| i as u32)
        .collect()
}

fn engine(lines: &[String], config: IndexConfig) -> Engine {
    Engine::build(Corpus::new(lines.iter().map(String::as_str)), config)
}

fn found(engine: &Engine, phrase: &str) -> HashSet<u32> {
    engine
        .search(phrase)
        .map(|m| m.line_ids().collect())
        .unwrap_or_default()
}

proptest! {
    #[test]
    fn prop_tokenize_idempotent(text in "\\PC{0,40}") {
        let once = tokenize(&text).concat();
        let twice = tokenize(&once).concat();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_tokenize_lowercase_is_fixed_point(text in "[a-zA-Z0-9 ,.;]{0,40}") {
        let tokens = tokenize(&text);
        prop_assert_eq!(tokenize(&tokens.concat()), tokens);
    }

    #[test]
    fn prop_tokens_concatenate_to_lowercase(text in "\\PC{0,40}") {
        prop_assert_eq!(tokenize(&text).concat(), text.to_lowercase());
    }

    #[test]
    fn prop_greek_tokens_concatenate_to_lowercase(text in "[ΑΣΒσς .'·]{0,20}") {
        prop_assert_eq!(tokenize(&text).concat(), text.to_lowercase());
    }

    #[test]
    fn prop_tokens_alternate_class(text in "[a-zA-Z0-9 ,.;:!?é-]{1,40}") {
        let tokens = tokenize(&text);
        let classes: Vec<bool> = tokens
            .iter()
            .map(|t| t.chars().next().is_some_and(char::is_alphanumeric))
            .collect();

        for token in &tokens {
            prop_assert!(!token.is_empty());
            let first = token.chars().next().is_some_and(char::is_alphanumeric);
            prop_assert!(token.chars().all(|c| c.is_alphanumeric() == first));
        }
        for pair in classes.windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn prop_search_is_containment(
        lines in prop::collection::vec(line(), 0..12),
        phrase in phrase(),
    ) {
        let engine = engine(&lines, IndexConfig::default());
        prop_assert_eq!(found(&engine, &phrase), expected_lines(&lines, &phrase));
    }

    #[test]
    fn prop_depth_limit_keeps_containment(
        lines in prop::collection::vec(line(), 0..12),
        phrase in phrase(),
        limit in 1usize..4,
    ) {
        let engine = engine(&lines, IndexConfig::with_limit(limit));
        prop_assert_eq!(found(&engine, &phrase), expected_lines(&lines, &phrase));
    }

    #[test]
    fn prop_every_line_finds_itself(lines in prop::collection::vec(line(), 1..8)) {
        let engine = engine(&lines, IndexConfig::default());
        for (i, line) in lines.iter().enumerate() {
            prop_assert!(found(&engine, line).contains(&(i as u32)));
        }
    }
}
