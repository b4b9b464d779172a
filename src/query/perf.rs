//! Concurrent load generator hammering one engine with the same phrase

use crate::index::Engine;
use crate::query::SearchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;
use tracing::debug;

/// How often a worker logs how far it got
const LOG_EVERY: usize = 10_000;

/// Result of a load run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfReport {
    pub phrase: String,
    pub threads: usize,
    pub searches_per_thread: usize,
    pub total_searches: u64,
    /// Lines matching the phrase
    pub found_in_lines: u64,
    pub elapsed_ms: f64,
    pub searches_per_sec: u64,
    /// Searches whose output differed from the first search
    pub mismatches: u64,
}

impl fmt::Display for PerfReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance test took {:.0}ms", self.elapsed_ms)?;
        writeln!(
            f,
            "Phrase '{}' found in {} lines",
            self.phrase, self.found_in_lines
        )?;
        writeln!(
            f,
            "Performed {} searches on {} threads",
            self.total_searches, self.threads
        )?;
        write!(f, "Throughput: {}/s", self.searches_per_sec)?;
        if self.mismatches > 0 {
            write!(f, "\nMismatched results: {}", self.mismatches)?;
        }
        Ok(())
    }
}

/// Run `searches` searches for `phrase` on each of `threads` threads.
///
/// Every search builds the joined result text, as a serving layer would.
/// Fails up front when the phrase matches nothing.
pub fn run_perf(
    engine: &Engine,
    phrase: &str,
    threads: usize,
    searches: usize,
) -> Result<PerfReport, SearchError> {
    let expected = engine.search(phrase)?;
    let found_in_lines = expected.count();
    let expected = expected.join("\n");

    let threads = threads.max(1);
    let mismatches = AtomicU64::new(0);

    let start = Instant::now();
    thread::scope(|scope| {
        for worker in 0..threads {
            let expected = expected.as_str();
            let mismatches = &mismatches;
            scope.spawn(move || {
                for i in 0..searches {
                    let same = engine
                        .search(phrase)
                        .is_ok_and(|m| m.join("\n") == expected);
                    if !same {
                        mismatches.fetch_add(1, Ordering::Relaxed);
                    }
                    if (i + 1) % LOG_EVERY == 0 {
                        debug!(worker, "Performed {} searches of '{}'", i + 1, phrase);
                    }
                }
            });
        }
    });
    let elapsed = start.elapsed();

    let total_searches = (threads as u64).saturating_mul(searches as u64);
    let secs = elapsed.as_secs_f64();
    let searches_per_sec = if secs > 0.0 {
        (total_searches as f64 / secs) as u64
    } else {
        total_searches
    };

    Ok(PerfReport {
        phrase: phrase.to_string(),
        threads,
        searches_per_thread: searches,
        total_searches,
        found_in_lines,
        elapsed_ms: secs * 1000.0,
        searches_per_sec,
        mismatches: mismatches.into_inner(),
    })
}
