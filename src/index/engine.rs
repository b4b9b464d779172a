//! Immutable search handle bundling a trie with the corpus it was built from

use crate::index::build::build_trie;
use crate::index::corpus::Corpus;
use crate::index::trie::TrieIndex;
use crate::index::types::{IndexConfig, IndexStats, LineId};
use crate::query::{self, SearchError, SearchMatches};

/// A built index and its line store.
///
/// Created once, then shared (usually as `Arc<Engine>`) by every search.
/// Rebuilding means constructing a new `Engine` and publishing it in place
/// of the old one; an existing engine is never modified.
#[derive(Debug, Clone)]
pub struct Engine {
    trie: TrieIndex,
    corpus: Corpus,
    stats: IndexStats,
}

impl Engine {
    pub fn build(corpus: Corpus, config: IndexConfig) -> Self {
        Self::build_with(corpus, config, |_| {})
    }

    /// Build with a per-line progress callback
    pub fn build_with<F: FnMut(usize)>(corpus: Corpus, config: IndexConfig, on_progress: F) -> Self {
        let (trie, tokens) = build_trie(corpus.lines(), config, on_progress);
        let stats = IndexStats {
            lines: corpus.len(),
            tokens,
            ..trie.stats()
        };
        Self { trie, corpus, stats }
    }

    /// Build over in-memory text split into lines
    pub fn from_text(text: &str) -> Self {
        Self::build(Corpus::from_text(text), IndexConfig::default())
    }

    pub fn search(&self, phrase: &str) -> Result<SearchMatches<'_>, SearchError> {
        query::search(self, phrase)
    }

    pub fn line(&self, line: LineId) -> Option<&str> {
        self.corpus.get(line)
    }

    pub fn trie(&self) -> &TrieIndex {
        &self.trie
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn config(&self) -> &IndexConfig {
        self.trie.config()
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}
