//! Phrase search and load generation over a built [`Engine`](crate::index::Engine)

pub mod perf;
pub mod search;

pub use perf::{PerfReport, run_perf};
pub use search::{SearchError, SearchMatches, search, search_in};
