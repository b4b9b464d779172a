//! Token trie over every suffix of every indexed line.
//!
//! Nodes live in a flat arena and point at their children by [`NodeId`].
//! Each node keeps the set of lines whose token sequence contains the path
//! from the root to that node, starting at some offset. The root stands for
//! the empty path and never records a line.

use crate::index::types::{IndexConfig, IndexStats, LineId, NodeId, ROOT};
use crate::utils::tokenize;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
struct Node {
    token: Box<str>,
    occurrences: RoaringBitmap,
    children: FxHashMap<Box<str>, NodeId>,
}

impl Node {
    fn new(token: &str) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }
}

/// Suffix trie keyed by tokens.
///
/// Built by a single writer through [`TrieIndex::index_line`], then shared
/// read-only. There is no interior mutability, so `&TrieIndex` can be handed
/// to any number of threads.
#[derive(Debug, Clone)]
pub struct TrieIndex {
    nodes: Vec<Node>,
    config: IndexConfig,
}

impl Default for TrieIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieIndex {
    /// Empty trie that indexes every suffix in full
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            nodes: vec![Node::default()],
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Tokenize `line` and insert all of its suffixes tagged with `line_id`
    pub fn index_line(&mut self, line: &str, line_id: LineId) {
        let tokens = tokenize(line);
        self.index_tokens(&tokens, line_id);
    }

    /// Insert every suffix of an already tokenized line
    pub fn index_tokens<S: AsRef<str>>(&mut self, tokens: &[S], line_id: LineId) {
        for start in 0..tokens.len() {
            let suffix = &tokens[start..];
            let depth = self.config.depth_for(suffix.len());

            let mut node = ROOT;
            for token in &suffix[..depth] {
                node = self.child_or_insert(node, token.as_ref());
                self.nodes[node as usize].occurrences.insert(line_id);
            }
        }
    }

    fn child_or_insert(&mut self, parent: NodeId, token: &str) -> NodeId {
        if let Some(&child) = self.nodes[parent as usize].children.get(token) {
            return child;
        }

        let child = self.nodes.len() as NodeId;
        self.nodes.push(Node::new(token));
        self.nodes[parent as usize].children.insert(token.into(), child);
        child
    }

    /// Follow `tokens` from the root and return the node reached, if the path exists
    pub fn walk<S: AsRef<str>>(&self, tokens: &[S]) -> Option<NodeId> {
        tokens
            .iter()
            .try_fold(ROOT, |node, token| self.child(node, token.as_ref()))
    }

    /// Lines containing `tokens` contiguously.
    ///
    /// `None` when the path is absent. An empty token slice resolves to the
    /// root, which never matches.
    pub fn lookup<S: AsRef<str>>(&self, tokens: &[S]) -> Option<&RoaringBitmap> {
        match self.walk(tokens)? {
            ROOT => None,
            node => Some(&self.nodes[node as usize].occurrences),
        }
    }

    pub fn child(&self, node: NodeId, token: &str) -> Option<NodeId> {
        self.nodes
            .get(node as usize)
            .and_then(|n| n.children.get(token))
            .copied()
    }

    /// Children of `node` in arbitrary order
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.nodes
            .get(node as usize)
            .into_iter()
            .flat_map(|n| n.children.iter().map(|(token, &id)| (token.as_ref(), id)))
    }

    /// Token labelling the edge into `node` (empty for the root)
    pub fn token(&self, node: NodeId) -> &str {
        &self.nodes[node as usize].token
    }

    pub fn occurrences(&self, node: NodeId) -> &RoaringBitmap {
        &self.nodes[node as usize].occurrences
    }

    /// Number of nodes including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Size counters; `lines` and `tokens` are left for the caller to fill
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            nodes: self.nodes.len(),
            postings: self.nodes.iter().map(|n| n.occurrences.len()).sum(),
            ..IndexStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(trie: &TrieIndex, node: NodeId) -> Vec<String> {
        let mut keys: Vec<_> = trie.children(node).map(|(t, _)| t.to_string()).collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_index_line_shape() {
        let mut trie = TrieIndex::new();
        trie.index_line("a B c", 1);

        assert_eq!(keys(&trie, ROOT), vec![" ", "a", "b", "c"]);

        let b = trie.child(ROOT, "b").unwrap();
        assert_eq!(trie.token(b), "b");
        assert!(trie.occurrences(b).contains(1));
        assert_eq!(trie.occurrences(b).len(), 1);
        assert_eq!(keys(&trie, b), vec![" "]);

        let c = trie.child(ROOT, "c").unwrap();
        assert_eq!(trie.occurrences(c).len(), 1);
        assert!(keys(&trie, c).is_empty());

        let space = trie.child(ROOT, " ").unwrap();
        assert!(trie.occurrences(space).contains(1));
        assert_eq!(keys(&trie, space), vec!["b", "c"]);
    }

    #[test]
    fn test_root_never_records_lines() {
        let mut trie = TrieIndex::new();
        trie.index_line("x y", 0);
        trie.index_line("", 1);
        assert!(trie.occurrences(ROOT).is_empty());
        assert_eq!(trie.token(ROOT), "");
        assert!(trie.lookup::<&str>(&[]).is_none());
    }

    #[test]
    fn test_empty_line_indexes_empty_token() {
        let mut trie = TrieIndex::new();
        trie.index_line("", 3);
        let lines = trie.lookup(&[""]).unwrap();
        assert_eq!(lines.iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_repeated_tokens_share_nodes() {
        let mut trie = TrieIndex::new();
        trie.index_line("a a a", 0);
        trie.index_line("a a a", 0);
        // paths: a, a·' ', a·' '·a, ... every node records line 0 once
        let node = trie.walk(&["a", " ", "a", " ", "a"]).unwrap();
        assert_eq!(trie.occurrences(node).len(), 1);
        let before = trie.node_count();
        trie.index_line("a a", 0);
        assert_eq!(trie.node_count(), before);
    }

    #[test]
    fn test_depth_limit() {
        let mut trie = TrieIndex::with_config(IndexConfig::with_limit(2));
        trie.index_line("a b c", 0);
        assert!(trie.lookup(&["a", " "]).is_some());
        assert!(trie.lookup(&["a", " ", "b"]).is_none());
        assert!(trie.lookup(&["b", " "]).is_some());
        assert!(trie.lookup(&["c"]).is_some());
    }

    #[test]
    fn test_stats_counts_postings() {
        let mut trie = TrieIndex::new();
        trie.index_line("a b", 0);
        // suffixes: [a, ' ', b] (3 nodes), [' ', b] (2 nodes), [b] (1 node)
        let stats = trie.stats();
        assert_eq!(stats.nodes, 7);
        assert_eq!(stats.postings, 6);
    }

    #[test]
    fn test_trie_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrieIndex>();
    }
}
