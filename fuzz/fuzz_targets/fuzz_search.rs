#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use linedex::index::IndexConfig;
use linedex::utils::{contains_tokens, tokenize};
use linedex::{Corpus, Engine};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    lines: Vec<&'a str>,
    phrase: &'a str,
    limit: u8,
}

fuzz_target!(|input: Input<'_>| {
    // Lines never contain line breaks once loaded
    let lines: Vec<&str> = input
        .lines
        .iter()
        .filter(|line| !line.contains(['\n', '\r']))
        .copied()
        .collect();

    let config = match input.limit % 5 {
        0 => IndexConfig::default(),
        n => IndexConfig::with_limit(n as usize),
    };
    let engine = Engine::build(Corpus::new(lines.iter().copied()), config);

    let needle = tokenize(input.phrase);
    let found: Vec<u32> = engine
        .search(input.phrase)
        .map(|m| m.line_ids().collect())
        .unwrap_or_default();

    for (i, line) in lines.iter().enumerate() {
        let expected = contains_tokens(&tokenize(line), &needle);
        assert_eq!(found.contains(&(i as u32)), expected, "line {:?}", line);
    }
});
