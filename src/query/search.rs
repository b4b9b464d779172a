//! Phrase lookup against a built index.
//!
//! A phrase is tokenized exactly like the indexed lines and its token path
//! is walked from the root. When the index was built with a depth limit
//! shorter than the phrase, the phrase is looked up as overlapping windows
//! and every candidate line is checked for the full token sequence.

use crate::index::{Corpus, Engine, LineId, TrieIndex};
use crate::utils::{contains_tokens, tokenize};
use roaring::RoaringBitmap;
use std::borrow::Cow;
use thiserror::Error;

/// Outcome of a search that matched nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// No line contains the phrase
    #[error("Not found phrase '{phrase}'")]
    NotFound { phrase: String },
}

/// Lines matching a phrase. Never empty.
///
/// Iteration follows ascending line ids, but callers should treat the order
/// as unspecified and compare results as sets.
#[derive(Debug, Clone)]
pub struct SearchMatches<'a> {
    corpus: &'a Corpus,
    lines: Cow<'a, RoaringBitmap>,
}

impl<'a> SearchMatches<'a> {
    /// Raw number of matching lines
    pub fn count(&self) -> u64 {
        self.lines.len()
    }

    pub fn line_ids(&self) -> impl Iterator<Item = LineId> + '_ {
        self.lines.iter()
    }

    /// Ids of the matching lines as a set
    pub fn bitmap(&self) -> &RoaringBitmap {
        &self.lines
    }

    /// Matching lines resolved against the corpus
    pub fn lines(&self) -> impl Iterator<Item = &'a str> + '_ {
        let corpus = self.corpus;
        self.lines.iter().filter_map(move |id| corpus.get(id))
    }

    /// Matching lines paired with their ids
    pub fn entries(&self) -> impl Iterator<Item = (LineId, &'a str)> + '_ {
        let corpus = self.corpus;
        self.lines
            .iter()
            .filter_map(move |id| corpus.get(id).map(|line| (id, line)))
    }

    /// Matching lines joined with `sep`
    pub fn join(&self, sep: &str) -> String {
        let lines: Vec<&str> = self.lines().collect();
        lines.join(sep)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.lines().map(str::to_string).collect()
    }
}

/// Search `engine` for every line containing `phrase`
pub fn search<'a>(engine: &'a Engine, phrase: &str) -> Result<SearchMatches<'a>, SearchError> {
    search_in(engine.trie(), engine.corpus(), phrase)
}

/// Search a trie and the corpus it was built from
pub fn search_in<'a>(
    trie: &'a TrieIndex,
    corpus: &'a Corpus,
    phrase: &str,
) -> Result<SearchMatches<'a>, SearchError> {
    let not_found = || SearchError::NotFound {
        phrase: phrase.to_string(),
    };

    let tokens = tokenize(phrase);
    let depth = trie.config().depth_for(tokens.len());

    if depth == tokens.len() {
        let lines = trie.lookup(&tokens).ok_or_else(not_found)?;
        return Ok(SearchMatches {
            corpus,
            lines: Cow::Borrowed(lines),
        });
    }

    let mut candidates: Option<RoaringBitmap> = None;
    for start in window_starts(tokens.len(), depth) {
        let window = trie
            .lookup(&tokens[start..start + depth])
            .ok_or_else(not_found)?;

        let narrowed = match candidates.take() {
            Some(mut acc) => {
                acc &= window;
                acc
            }
            None => window.clone(),
        };
        if narrowed.is_empty() {
            return Err(not_found());
        }
        candidates = Some(narrowed);
    }

    // Windows only bound the candidates; confirm the whole sequence per line
    let verified: RoaringBitmap = candidates
        .unwrap_or_default()
        .iter()
        .filter(|&id| {
            corpus
                .get(id)
                .is_some_and(|line| contains_tokens(&tokenize(line), &tokens))
        })
        .collect();

    if verified.is_empty() {
        return Err(not_found());
    }

    Ok(SearchMatches {
        corpus,
        lines: Cow::Owned(verified),
    })
}

/// Start offsets of `depth`-sized windows covering `len` tokens, the last one
/// aligned to the end. Requires `0 < depth < len`.
fn window_starts(len: usize, depth: usize) -> impl Iterator<Item = usize> {
    (0..len - depth)
        .step_by(depth)
        .chain(std::iter::once(len - depth))
}
