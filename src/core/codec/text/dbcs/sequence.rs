use std::collections::HashMap;

use super::encode_table::MultiByte;
use super::trie::SeqId;

/// Decode side: the runs of code points (length >= 2) referenced by `Cell::SeqRef`.
#[derive(Debug, Clone, Default)]
pub struct SequenceTable {
    runs: Vec<Vec<u32>>,
}

impl SequenceTable {
    pub fn new() -> Self {
        SequenceTable { runs: vec![] }
    }

    pub fn push(&mut self, run: Vec<u32>) -> SeqId {
        debug_assert!(run.len() >= 2);
        self.runs.push(run);
        SeqId(self.runs.len() - 1)
    }

    pub fn get(&self, id: SeqId) -> &[u32] {
        &self.runs[id.0]
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Encode side tree node: a full match or the next level of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceNode {
    Leaf(MultiByte),
    Branch(SequenceBranch),
}

/// One level of the encode sequence tree.<br/>
/// `default` holds the bytes of the prefix consumed so far, used when the
/// input does not continue the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceBranch {
    pub children: HashMap<u32, SequenceNode>,
    pub default: Option<MultiByte>,
}

impl SequenceBranch {
    pub fn new() -> Self {
        SequenceBranch::default()
    }

    pub fn with_default(default: Option<MultiByte>) -> Self {
        SequenceBranch {
            children: HashMap::new(),
            default,
        }
    }

    pub fn get(&self, codep: u32) -> Option<&SequenceNode> {
        self.children.get(&codep)
    }

    /// follow `path` from this level, None if the path leaves the tree
    pub fn walk(&self, path: &[u32]) -> Option<&SequenceBranch> {
        let mut branch = self;
        for cp in path {
            match branch.children.get(cp) {
                Some(SequenceNode::Branch(b)) => branch = b,
                _ => return None,
            }
        }
        Some(branch)
    }

    /// Registers `rest` (the run without its first code point) below this level.<br/>
    /// The first registration of a given path wins.
    pub fn insert(&mut self, rest: &[u32], value: MultiByte) {
        let (last, middle) = match rest.split_last() {
            Some(v) => v,
            None => {
                if self.default.is_none() {
                    self.default = Some(value);
                }
                return;
            }
        };

        let mut branch = self;
        for cp in middle {
            let slot = branch
                .children
                .entry(*cp)
                .or_insert_with(|| SequenceNode::Branch(SequenceBranch::new()));

            // a shorter run ending here becomes the default of the deeper level
            if let SequenceNode::Leaf(v) = slot {
                let v = *v;
                *slot = SequenceNode::Branch(SequenceBranch::with_default(Some(v)));
            }

            branch = match slot {
                SequenceNode::Branch(b) => b,
                SequenceNode::Leaf(_) => unreachable!(),
            };
        }

        match branch.children.get_mut(last) {
            None => {
                branch.children.insert(*last, SequenceNode::Leaf(value));
            }
            Some(SequenceNode::Branch(b)) => {
                if b.default.is_none() {
                    b.default = Some(value);
                }
            }
            Some(SequenceNode::Leaf(_)) => {}
        }
    }
}
