pub mod build;
pub mod corpus;
pub mod engine;
pub mod stats;
pub mod trie;
pub mod types;

pub use build::{build_index, build_index_with, load_engine};
pub use corpus::{Corpus, CorpusError};
pub use engine::Engine;
pub use trie::TrieIndex;
pub use types::*;
