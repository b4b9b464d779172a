use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Position of a line in the corpus (0-based)
pub type LineId = u32;

/// Most lines a corpus may hold; every line id stays below this
pub const MAX_LINES: usize = LineId::MAX as usize;

/// Id of the line at position `idx`
///
/// # Panics
///
/// If `idx` is not below [`MAX_LINES`].
#[inline]
pub fn line_id(idx: usize) -> LineId {
    match LineId::try_from(idx) {
        Ok(id) if idx < MAX_LINES => id,
        _ => panic!("corpus has more than {} lines", MAX_LINES),
    }
}

/// Index of a node in the trie arena
pub type NodeId = u32;

/// The root node always lives at slot 0 of the arena
pub const ROOT: NodeId = 0;

/// Configuration for the indexer
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IndexConfig {
    /// Deepest token path stored per suffix. `None` indexes every suffix in full.
    #[serde(default)]
    pub max_phrase_len: Option<NonZeroUsize>,
}

impl IndexConfig {
    /// Config that indexes suffixes at most `depth` tokens deep
    pub fn with_limit(depth: usize) -> Self {
        Self {
            max_phrase_len: NonZeroUsize::new(depth),
        }
    }

    /// Number of tokens to walk for a suffix of `len` tokens
    #[inline]
    pub fn depth_for(&self, len: usize) -> usize {
        match self.max_phrase_len {
            Some(limit) => len.min(limit.get()),
            None => len,
        }
    }
}

/// Size counters for a built index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub lines: usize,
    pub tokens: usize,
    pub nodes: usize,
    pub postings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_id_in_range() {
        assert_eq!(line_id(0), 0);
        assert_eq!(line_id(MAX_LINES - 1), LineId::MAX - 1);
    }

    #[test]
    #[should_panic(expected = "corpus has more than")]
    fn test_line_id_at_limit_panics() {
        line_id(MAX_LINES);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "corpus has more than")]
    fn test_line_id_does_not_wrap() {
        // Would truncate to 0 with a plain cast
        line_id(1 << 32);
    }

    #[test]
    fn test_depth_for() {
        assert_eq!(IndexConfig::default().depth_for(7), 7);
        assert_eq!(IndexConfig::with_limit(3).depth_for(7), 3);
        assert_eq!(IndexConfig::with_limit(3).depth_for(2), 2);
    }
}
