//! Prefix tree over a sorted pattern set.
//!
//! Nodes live in a flat arena and only remember the range of sorted patterns
//! they cover, so the strings themselves are never copied per node.

use core::ops::Range;

use crate::errors::{DacmarkError, Result};

/// Code of the child that marks the end of a pattern.
///
/// Sorts before every real code point, which is why U+0000 is rejected in
/// patterns.
pub const END_CODE: u32 = 0;

pub struct TrieNode {
    pub code: u32,
    pub depth: usize,
    pub left: usize,
    pub right: usize,
    pub is_end: bool,

    /// Slot assigned by the double-array encoder.
    pub index: usize,

    /// Value stored at `index`: the next state, or the negative terminal encoding.
    pub base: isize,

    /// Children are contiguous in the arena, ordered by code.
    pub children: Range<usize>,
}

impl TrieNode {
    const fn new(code: u32, depth: usize, left: usize, right: usize) -> Self {
        Self {
            code,
            depth,
            left,
            right,
            is_end: code == END_CODE,
            index: 0,
            base: 0,
            children: 0..0,
        }
    }
}

pub struct Trie {
    patterns: Vec<Vec<char>>,
    nodes: Vec<TrieNode>,
}

impl Trie {
    pub const ROOT_ID: usize = 0;

    /// Sorts and deduplicates the patterns and creates the root node.
    ///
    /// Children are not expanded here; the encoder calls [`Trie::fetch`] as it
    /// descends.
    pub fn new<I, P>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut sorted = vec![];
        for (i, pattern) in patterns.into_iter().enumerate() {
            let pattern = pattern.as_ref();
            if pattern.is_empty() {
                return Err(DacmarkError::invalid_pattern(i, "pattern is empty"));
            }
            if pattern.contains('\0') {
                return Err(DacmarkError::invalid_pattern(i, "pattern contains U+0000"));
            }
            sorted.push(pattern.chars().collect::<Vec<_>>());
        }
        if sorted.is_empty() {
            return Err(DacmarkError::EmptyDictionary);
        }

        // Slice ordering compares code point by code point and puts a prefix
        // before its extensions.
        sorted.sort_unstable();
        sorted.dedup();

        let root = TrieNode::new(u32::MAX, 0, 0, sorted.len());
        Ok(Self {
            patterns: sorted,
            nodes: vec![root],
        })
    }

    pub fn patterns(&self) -> &[Vec<char>] {
        &self.patterns
    }

    pub fn into_patterns(self) -> Vec<Vec<char>> {
        self.patterns
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: usize) -> &TrieNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: usize) -> &mut TrieNode {
        &mut self.nodes[id]
    }

    /// Code points from the root down to the given node.
    ///
    /// For a terminal node this is the whole pattern it ends.
    pub fn sub_code(&self, id: usize) -> &[char] {
        let node = &self.nodes[id];
        let pattern = &self.patterns[node.left];
        &pattern[..node.depth.min(pattern.len())]
    }

    /// Expands the children of a node by scanning its range once.
    ///
    /// Returns the arena ids of the children. Terminal nodes have no children.
    pub fn fetch(&mut self, id: usize) -> Range<usize> {
        let node = &self.nodes[id];
        if node.is_end {
            return 0..0;
        }
        if !node.children.is_empty() {
            return node.children.clone();
        }
        let (depth, left, right) = (node.depth, node.left, node.right);

        let first = self.nodes.len();
        let mut prev = None;
        for i in left..right {
            let code = self.patterns[i]
                .get(depth)
                .map_or(END_CODE, |&c| u32::from(c));
            if prev == Some(code) {
                continue;
            }
            if let Some(last) = self.nodes[first..].last_mut() {
                last.right = i;
            }
            self.nodes.push(TrieNode::new(code, depth + 1, i, right));
            prev = Some(code);
        }

        let children = first..self.nodes.len();
        self.nodes[id].children = children.clone();
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(trie: &Trie, children: Range<usize>) -> Vec<u32> {
        children.map(|id| trie.node(id).code).collect()
    }

    #[test]
    fn test_empty_dictionary() {
        let patterns: [&str; 0] = [];
        assert!(matches!(
            Trie::new(patterns),
            Err(DacmarkError::EmptyDictionary)
        ));
    }

    #[test]
    fn test_empty_pattern() {
        match Trie::new(["a", ""]) {
            Err(DacmarkError::InvalidPattern(e)) => assert_eq!(1, e.index()),
            _ => panic!("empty pattern must be rejected"),
        }
    }

    #[test]
    fn test_nul_pattern() {
        assert!(matches!(
            Trie::new(["a\0b"]),
            Err(DacmarkError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_sort_prefix_first() {
        let trie = Trie::new(["hers", "she", "he", "his", "he"]).unwrap();
        let sorted: Vec<String> = trie
            .patterns()
            .iter()
            .map(|p| p.iter().collect())
            .collect();
        assert_eq!(vec!["he", "hers", "his", "she"], sorted);
    }

    #[test]
    fn test_fetch_root() {
        let mut trie = Trie::new(["hers", "she", "he", "his"]).unwrap();
        let children = trie.fetch(Trie::ROOT_ID);
        assert_eq!(vec![u32::from('h'), u32::from('s')], codes(&trie, children.clone()));
        let h = trie.node(children.start);
        assert_eq!((0, 3, 1), (h.left, h.right, h.depth));
        let s = trie.node(children.start + 1);
        assert_eq!((3, 4, 1), (s.left, s.right, s.depth));
    }

    #[test]
    fn test_fetch_terminal_and_continuation() {
        let mut trie = Trie::new(["he", "hers"]).unwrap();
        let h = trie.fetch(Trie::ROOT_ID).start;
        let e = trie.fetch(h).start;
        let children = trie.fetch(e);
        assert_eq!(vec![END_CODE, u32::from('r')], codes(&trie, children.clone()));

        let end = trie.node(children.start);
        assert!(end.is_end);
        assert_eq!((0, 1), (end.left, end.right));
        assert_eq!(&['h', 'e'], trie.sub_code(children.start));

        let r = trie.node(children.start + 1);
        assert!(!r.is_end);
        assert_eq!((1, 2), (r.left, r.right));
        assert_eq!(&['h', 'e', 'r'], trie.sub_code(children.start + 1));

        assert!(trie.fetch(children.start).is_empty());
    }

    #[test]
    fn test_fetch_single_code_point() {
        let mut trie = Trie::new(["a"]).unwrap();
        let a = trie.fetch(Trie::ROOT_ID).start;
        let children = trie.fetch(a);
        assert_eq!(vec![END_CODE], codes(&trie, children.clone()));
        assert_eq!(&['a'], trie.sub_code(children.start));
    }

    #[test]
    fn test_fetch_twice() {
        let mut trie = Trie::new(["ab", "ac"]).unwrap();
        let first = trie.fetch(Trie::ROOT_ID);
        let n_nodes = trie.n_nodes();
        assert_eq!(first, trie.fetch(Trie::ROOT_ID));
        assert_eq!(n_nodes, trie.n_nodes());
    }
}
