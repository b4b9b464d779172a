use crate::index::corpus::Corpus;
use crate::index::engine::Engine;
use crate::index::trie::TrieIndex;
use crate::index::types::{IndexConfig, MAX_LINES, line_id};
use crate::utils::progress::{ProgressBar, ProgressStyle};
use crate::utils::tokenize;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Lines tokenized in parallel before being inserted by the single writer
const TOKENIZE_CHUNK: usize = 4096;

/// Build a trie over every suffix of every line, indexing suffixes in full
pub fn build_index<S: AsRef<str> + Sync>(lines: &[S]) -> TrieIndex {
    build_index_with(lines, IndexConfig::default(), |_| {})
}

/// Build a trie with `config`, calling `on_progress` with the number of
/// lines indexed so far after each line
pub fn build_index_with<S, F>(lines: &[S], config: IndexConfig, on_progress: F) -> TrieIndex
where
    S: AsRef<str> + Sync,
    F: FnMut(usize),
{
    build_trie(lines, config, on_progress).0
}

/// Returns the trie and the number of tokens seen
///
/// # Panics
///
/// If there are more than [`MAX_LINES`] lines.
pub(crate) fn build_trie<S, F>(
    lines: &[S],
    config: IndexConfig,
    mut on_progress: F,
) -> (TrieIndex, usize)
where
    S: AsRef<str> + Sync,
    F: FnMut(usize),
{
    check_line_count(lines.len());
    let mut trie = TrieIndex::with_config(config);
    let mut token_count = 0;

    for (chunk_idx, chunk) in lines.chunks(TOKENIZE_CHUNK).enumerate() {
        let tokenized: Vec<Vec<String>> = chunk
            .par_iter()
            .map(|line| tokenize(line.as_ref()))
            .collect();

        let base = chunk_idx * TOKENIZE_CHUNK;
        for (offset, tokens) in tokenized.iter().enumerate() {
            let line_idx = base + offset;
            trie.index_tokens(tokens, line_id(line_idx));
            token_count += tokens.len();
            on_progress(line_idx + 1);
        }
    }

    (trie, token_count)
}

/// Fail before any indexing work when ids could not be assigned to every line
fn check_line_count(len: usize) {
    assert!(len <= MAX_LINES, "corpus has more than {} lines", MAX_LINES);
}

/// Build an engine, reporting progress through a progress bar and log events
pub fn build_engine_with_progress(
    corpus: Corpus,
    config: IndexConfig,
    progress_every: usize,
    silent: bool,
) -> Engine {
    let total = corpus.len();
    let start = Instant::now();

    let progress_bar = if !silent {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        pb.set_message("Indexing lines...");
        Some(pb)
    } else {
        None
    };

    let every = progress_every.max(1);
    let engine = Engine::build_with(corpus, config, |done| {
        if let Some(ref pb) = progress_bar {
            pb.set_position(done as u64);
        }
        if done % every == 0 {
            info!("Indexed line {} from {}", done, total);
        }
    });

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("Indexed {} lines", total));
    }

    let stats = engine.stats();
    info!(
        "Indexed line {} from {} ({} tokens, {} trie nodes) in {:?}",
        total,
        total,
        stats.tokens,
        stats.nodes,
        start.elapsed()
    );

    engine
}

/// Load a corpus file and build an engine over it
pub fn load_engine(path: &Path, config: IndexConfig, progress_every: usize, silent: bool) -> Result<Engine> {
    let corpus =
        Corpus::load(path).with_context(|| format!("Failed to load corpus '{}'", path.display()))?;
    info!("Read {} lines from '{}'", corpus.len(), path.display());

    match config.max_phrase_len {
        Some(limit) => info!("Maximum length of indexed phrases is set to {}", limit),
        None => info!("No limit to length of indexed phrases"),
    }

    Ok(build_engine_with_progress(corpus, config, progress_every, silent))
}
