//! # linedex - phrase search over the lines of a text
//!
//! linedex loads a text corpus into memory, indexes every suffix of every
//! line's token sequence in a trie, and answers "which lines contain this
//! phrase" by walking the phrase's tokens from the root.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - Corpus loading, trie construction, the [`Engine`] handle
//! - [`query`] - Phrase search and the concurrent load generator
//! - [`server`] - TCP server and client keeping an engine warm
//! - [`output`] - Terminal formatting of matched lines
//! - [`utils`] - Tokenizer, configuration, progress bars
//!
//! ## Quick Start
//!
//! ```
//! use linedex::Engine;
//!
//! let engine = Engine::from_text("Captain Nemo\nNed Land\nned land and Nemo");
//!
//! let matches = engine.search("NED LAND").unwrap();
//! assert_eq!(matches.count(), 2);
//! assert!(engine.search("land ned").is_err());
//! ```
//!
//! ## Matching rules
//!
//! Lines and phrases are cut into runs of alphanumeric and non-alphanumeric
//! characters and lower-cased. A phrase matches a line when its runs appear
//! contiguously in the line's runs, so `"land"` does not match `"landed"`
//! and `" "` matches every line containing a single space between words.

pub mod index;
pub mod output;
pub mod query;
pub mod server;
pub mod utils;

pub use index::{Corpus, Engine, IndexConfig, LineId, TrieIndex, build_index};
pub use query::{SearchError, SearchMatches, search};
pub use utils::tokenize;
