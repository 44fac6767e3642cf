//! Failure links over the encoded states.

use std::collections::VecDeque;

use crate::double_array::{DoubleArrayTrie, ROOT_STATE, START_STATE};
use crate::trie::Trie;

/// Computes the failure state of every live state by breadth-first search.
///
/// By default a child only looks at the failure state of its parent: if that
/// state has a transition on the child's code, it is followed, otherwise the
/// child falls back to the root. With `chained` set, the failure chain of the
/// parent is walked until a transition is found or the root is reached.
pub fn build_failure(trie: &Trie, da: &DoubleArrayTrie, chained: bool) -> Vec<usize> {
    let mut failure = vec![ROOT_STATE; da.len()];
    let mut queue = VecDeque::new();

    for id in trie.node(Trie::ROOT_ID).children.clone() {
        let node = trie.node(id);
        if node.is_end {
            continue;
        }
        failure[node.base as usize] = ROOT_STATE;
        queue.push_back(id);
    }

    while let Some(id) = queue.pop_front() {
        let node = trie.node(id);
        let node_state = node.base as usize;
        for child_id in node.children.clone() {
            let child = trie.node(child_id);
            if child.is_end {
                continue;
            }
            debug_assert_eq!(da.base[child.index], child.base);

            let mut fail = failure[node_state];
            let child_fail = loop {
                let from = if fail == ROOT_STATE { START_STATE } else { fail };
                if let Some(next) = da.next_state(from, child.code) {
                    break next;
                }
                if !chained || fail == ROOT_STATE {
                    break ROOT_STATE;
                }
                fail = failure[fail];
            };
            failure[child.base as usize] = child_fail;
            queue.push_back(child_id);
        }
    }

    failure
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::double_array::DoubleArrayEncoder;

    fn build(patterns: &[&str], chained: bool) -> (DoubleArrayTrie, Vec<usize>) {
        let mut trie = Trie::new(patterns).unwrap();
        let da = DoubleArrayEncoder::new(&mut trie, 64).encode();
        let failure = build_failure(&trie, &da, chained);
        (da, failure)
    }

    fn walk(da: &DoubleArrayTrie, text: &str) -> usize {
        let mut state = START_STATE;
        for c in text.chars() {
            state = da.next_state(state, u32::from(c)).unwrap();
        }
        state
    }

    #[test]
    fn test_depth_one_falls_back_to_root() {
        let (da, failure) = build(&["ab", "b"], false);
        assert_eq!(ROOT_STATE, failure[walk(&da, "a")]);
        assert_eq!(ROOT_STATE, failure[walk(&da, "b")]);
    }

    #[test]
    fn test_suffix_through_root() {
        let (da, failure) = build(&["ab", "bc"], false);
        assert_eq!(walk(&da, "b"), failure[walk(&da, "ab")]);
        assert_eq!(ROOT_STATE, failure[walk(&da, "bc")]);
    }

    #[test]
    fn test_parent_failure_only() {
        let (da, failure) = build(&["abcd", "bx", "ce"], false);
        assert_eq!(walk(&da, "b"), failure[walk(&da, "ab")]);
        assert_eq!(ROOT_STATE, failure[walk(&da, "abc")]);
    }

    #[test]
    fn test_chained_failure() {
        let (da, failure) = build(&["abcd", "bx", "ce"], true);
        assert_eq!(walk(&da, "b"), failure[walk(&da, "ab")]);
        assert_eq!(walk(&da, "c"), failure[walk(&da, "abc")]);
    }

    #[test]
    fn test_failure_targets_live_states() {
        let (da, failure) = build(&["he", "she", "his", "hers", "usher"], true);
        for &state in &failure {
            if state != ROOT_STATE {
                assert!(da.base.iter().any(|&b| b == state as isize));
            }
        }
        assert_eq!(walk(&da, "she"), failure[walk(&da, "ushe")]);
        assert_eq!(walk(&da, "he"), failure[walk(&da, "she")]);
    }
}
