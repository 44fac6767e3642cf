//! Double-array encoding of the pattern trie.

use core::ops::Range;

use hashbrown::HashSet;

use crate::trie::Trie;

/// The conceptual root stored in failure links.
pub const ROOT_STATE: usize = 0;

/// The begin offset the children of the root are encoded at.
///
/// Matching starts from this state on every line.
pub const START_STATE: usize = 1;

/// Marks a slot without an output.
pub const NO_OUTPUT: usize = usize::MAX;

pub struct DoubleArrayTrie {
    pub base: Vec<isize>,
    pub check: Vec<usize>,

    /// Pattern id confirmed at a terminal slot, or [`NO_OUTPUT`].
    pub output: Vec<usize>,
}

impl DoubleArrayTrie {
    /// Follows the transition from `state` on `code`.
    ///
    /// Terminal slots are not live states and never count as a transition.
    #[inline(always)]
    pub fn next_state(&self, state: usize, code: u32) -> Option<usize> {
        let idx = state + code as usize;
        if self.check.get(idx) == Some(&state) {
            let base = self.base[idx];
            if base > 0 {
                return Some(base as usize);
            }
        }
        None
    }

    /// Pattern terminated by `state`, if any.
    ///
    /// The terminal child of a state sits at `state + END_CODE`, which is the
    /// state index itself.
    #[inline(always)]
    pub fn output(&self, state: usize) -> Option<usize> {
        match self.output.get(state) {
            Some(&id) if id != NO_OUTPUT => Some(id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.check.len()
    }
}

/// Negative encoding of a terminal slot.
#[inline(always)]
pub const fn terminal_base(left: usize) -> isize {
    -(left as isize) - 1
}

/// Sibling group whose subtrees are still being placed.
struct PendingGroup {
    siblings: Range<usize>,
    cursor: usize,
    begin: usize,

    /// Node and slot whose base is this group's begin.
    parent: Option<(usize, usize)>,
}

pub struct DoubleArrayEncoder<'a> {
    trie: &'a mut Trie,
    base: Vec<isize>,
    check: Vec<usize>,
    output: Vec<usize>,
    used: HashSet<usize>,
    last_pos: usize,
    act_size: usize,
    step_size: usize,
}

impl<'a> DoubleArrayEncoder<'a> {
    pub fn new(trie: &'a mut Trie, step_size: usize) -> Self {
        Self {
            trie,
            base: vec![],
            check: vec![],
            output: vec![],
            used: HashSet::new(),
            last_pos: 0,
            act_size: 0,
            step_size: step_size.max(1),
        }
    }

    /// Encodes the whole trie.
    ///
    /// The trie nodes keep their assigned `index` and `base`, which the failure
    /// link builder walks afterwards.
    pub fn encode(mut self) -> DoubleArrayTrie {
        let children = self.trie.fetch(Trie::ROOT_ID);
        let begin = self.insert(children);
        debug_assert_eq!(START_STATE, begin);
        let root = self.trie.node_mut(Trie::ROOT_ID);
        root.base = begin as isize;

        let DoubleArrayEncoder {
            mut base,
            mut check,
            mut output,
            act_size,
            ..
        } = self;
        base.truncate(act_size);
        check.truncate(act_size);
        output.truncate(act_size);
        DoubleArrayTrie {
            base,
            check,
            output,
        }
    }

    /// Places a sibling group and everything below it, depth first.
    ///
    /// A child group is placed as soon as its parent sibling is visited, before
    /// the next sibling. Pending groups are kept on an explicit stack, so long
    /// patterns do not grow the call stack.
    ///
    /// Returns the begin offset of the group, which is the state of the parent.
    fn insert(&mut self, siblings: Range<usize>) -> usize {
        let root_begin = self.place(siblings.clone());
        let mut stack = vec![PendingGroup {
            cursor: siblings.start,
            siblings,
            begin: root_begin,
            parent: None,
        }];

        while let Some(group) = stack.last_mut() {
            if group.cursor == group.siblings.end {
                let (begin, parent) = (group.begin, group.parent);
                stack.pop();
                if let Some((id, idx)) = parent {
                    self.set_base(id, idx, begin as isize);
                }
                continue;
            }
            let id = group.cursor;
            group.cursor += 1;
            let idx = group.begin + self.trie.node(id).code as usize;

            let children = self.trie.fetch(id);
            if children.is_empty() {
                let left = self.trie.node(id).left;
                debug_assert_eq!(self.trie.sub_code(id), self.trie.patterns()[left].as_slice());
                self.output[idx] = left;
                self.set_base(id, idx, terminal_base(left));
            } else {
                let begin = self.place(children.clone());
                stack.push(PendingGroup {
                    cursor: children.start,
                    siblings: children,
                    begin,
                    parent: Some((id, idx)),
                });
            }
        }

        root_begin
    }

    /// Finds a begin offset for a sibling group and claims its slots.
    fn place(&mut self, siblings: Range<usize>) -> usize {
        let first_code = self.trie.node(siblings.start).code as usize;

        // Positions start past the first code, so every begin is at least 1 and
        // never mistaken for a free slot or a terminal.
        let mut pos = first_code.max(self.last_pos + 1);
        let begin = 'search: loop {
            pos += 1;
            self.extend_arrays(pos + 1);
            if self.check[pos] != 0 {
                continue;
            }
            let begin = pos - first_code;
            if self.used.contains(&begin) {
                continue;
            }
            for id in siblings.clone() {
                let idx = begin + self.trie.node(id).code as usize;
                self.extend_arrays(idx + 1);
                if self.check[idx] != 0 {
                    continue 'search;
                }
            }
            break begin;
        };

        self.last_pos = pos;
        for id in siblings {
            let idx = begin + self.trie.node(id).code as usize;
            self.check[idx] = begin;
            self.act_size = self.act_size.max(idx + 1);
        }
        self.used.insert(begin);
        begin
    }

    fn set_base(&mut self, id: usize, idx: usize, base: isize) {
        self.base[idx] = base;
        let node = self.trie.node_mut(id);
        node.index = idx;
        node.base = base;
    }

    fn extend_arrays(&mut self, min_size: usize) {
        if min_size > self.base.len() {
            let new_len = ((min_size - self.base.len() - 1) / self.step_size + 1) * self.step_size
                + self.base.len();
            self.base.resize(new_len, 0);
            self.check.resize(new_len, 0);
            self.output.resize(new_len, NO_OUTPUT);
        }
    }
}
