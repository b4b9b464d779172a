#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let tokens = linedex::tokenize(text);
    assert!(!tokens.is_empty());
    assert_eq!(tokens.concat(), text.to_lowercase());

    let spans: Vec<&str> = linedex::utils::token_spans(text).collect();
    assert_eq!(spans.concat(), text);
});
