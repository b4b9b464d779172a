use crate::index::engine::Engine;
use crate::index::types::ROOT;
use std::path::Path;

/// How many of the most common first tokens to list
const TOP_TOKENS: usize = 15;

/// Display index statistics
pub fn show_stats(engine: &Engine, source: &Path) {
    let stats = engine.stats();

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Corpus:           {}", source.display());
    println!("Lines:            {}", stats.lines);
    println!("Tokens:           {}", stats.tokens);
    println!("Trie nodes:       {}", stats.nodes);
    println!("Postings:         {}", stats.postings);
    println!(
        "Phrase limit:     {}",
        engine
            .config()
            .max_phrase_len
            .map(|n| n.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let top = top_tokens(engine, TOP_TOKENS);
    let distinct = engine.trie().children(ROOT).count();

    println!();
    println!("Most common tokens ({} distinct):", distinct);
    for (token, lines) in &top {
        println!("  {:20} {}", format!("{:?}", token), lines);
    }

    if distinct > top.len() {
        println!("  ... and {} more", distinct - top.len());
    }
}

/// Tokens under the root ordered by the number of lines containing them
pub fn top_tokens(engine: &Engine, limit: usize) -> Vec<(String, u64)> {
    let trie = engine.trie();
    let mut counts: Vec<_> = trie
        .children(ROOT)
        .map(|(token, node)| (token.to_string(), trie.occurrences(node).len()))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_tokens_order() {
        let engine = Engine::from_text("a b\na\nb c a\n");
        let top = top_tokens(&engine, 3);
        assert_eq!(top[0], ("a".to_string(), 3));
        assert_eq!(top[1], (" ".to_string(), 2));
        assert_eq!(top[2], ("b".to_string(), 2));
    }

    #[test]
    fn test_top_tokens_limit() {
        let engine = Engine::from_text("x y z\n");
        assert_eq!(top_tokens(&engine, 1).len(), 1);
        assert_eq!(top_tokens(&engine, 10).len(), 4);
    }
}
