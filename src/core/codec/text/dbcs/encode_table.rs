use std::collections::{HashMap, HashSet};

use super::codec::CodecOptions;
use super::sequence::{SequenceBranch, SequenceTable};
use super::trie::{Cell, DecodeTrie, NodeId};

/// An encoded character: 1 to 4 bytes packed big endian in an integer.<br/>
/// 0x41 -> [0x41], 0x8140 -> [0x81, 0x40]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MultiByte(pub u32);

impl MultiByte {
    pub fn len(&self) -> usize {
        match self.0 {
            0..=0xff => 1,
            0x100..=0xffff => 2,
            0x1_0000..=0xff_ffff => 3,
            _ => 4,
        }
    }

    #[inline]
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let v = self.0;
        match self.len() {
            1 => out.push(v as u8),
            2 => out.extend_from_slice(&[(v >> 8) as u8, v as u8]),
            3 => out.extend_from_slice(&[(v >> 16) as u8, (v >> 8) as u8, v as u8]),
            _ => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(4);
        self.write_to(&mut v);
        v
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeEntry {
    Bytes(MultiByte),
    /// the code point starts at least one run
    Sequence(SequenceBranch),
}

/// Sparse unicode -> bytes map derived from the decode trie.
#[derive(Debug, Clone, Default)]
pub struct EncodeTable {
    map: HashMap<u32, EncodeEntry>,
    nr_sequences: usize,
}

impl EncodeTable {
    pub fn new() -> Self {
        EncodeTable::default()
    }

    pub fn get(&self, codep: u32) -> Option<&EncodeEntry> {
        self.map.get(&codep)
    }

    /// plain single character value, ignoring sequence starts
    pub fn get_bytes(&self, codep: u32) -> Option<MultiByte> {
        match self.map.get(&codep) {
            Some(EncodeEntry::Bytes(mb)) => Some(*mb),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn nr_sequences(&self) -> usize {
        self.nr_sequences
    }

    /// First registration wins.<br/>
    /// If `codep` already starts a run, the value becomes the run tree default.
    pub fn set_char(&mut self, codep: u32, value: MultiByte) {
        match self.map.get_mut(&codep) {
            None => {
                self.map.insert(codep, EncodeEntry::Bytes(value));
            }
            Some(EncodeEntry::Sequence(branch)) => {
                if branch.default.is_none() {
                    branch.default = Some(value);
                }
            }
            Some(EncodeEntry::Bytes(_)) => {}
        }
    }

    pub fn set_sequence(&mut self, run: &[u32], value: MultiByte) {
        let (first, rest) = match run.split_first() {
            Some(v) => v,
            None => return,
        };

        let entry = self
            .map
            .entry(*first)
            .or_insert_with(|| EncodeEntry::Sequence(SequenceBranch::new()));

        // a single character set before becomes the default of the run
        if let EncodeEntry::Bytes(mb) = entry {
            let mb = *mb;
            *entry = EncodeEntry::Sequence(SequenceBranch::with_default(Some(mb)));
        }

        if let EncodeEntry::Sequence(branch) = entry {
            branch.insert(rest, value);
        }

        self.nr_sequences += 1;
    }

    /// the bytes written for unmappable input
    pub fn fallback(&self, replacement: char) -> MultiByte {
        self.get_bytes(replacement as u32)
            .or_else(|| self.get_bytes('?' as u32))
            .unwrap_or(MultiByte('?' as u32))
    }
}

/// Derives the `EncodeTable` by walking every path of a `DecodeTrie`.
pub struct EncodeTableBuilder<'a> {
    trie: &'a DecodeTrie,
    sequences: &'a SequenceTable,
    exclude: &'a HashSet<u32>,
    skip: &'a [(u32, u32)],
    table: EncodeTable,
    // subtrees without any mapping (the shared gb18030 nodes)
    empty_nodes: HashSet<NodeId>,
}

impl<'a> EncodeTableBuilder<'a> {
    pub fn new(
        trie: &'a DecodeTrie,
        sequences: &'a SequenceTable,
        options: &'a CodecOptions,
    ) -> Self {
        EncodeTableBuilder {
            trie,
            sequences,
            exclude: &options.exclude_from_encode,
            skip: &options.encode_skip,
            table: EncodeTable::new(),
            empty_nodes: HashSet::new(),
        }
    }

    pub fn build(mut self) -> EncodeTable {
        self.fill(DecodeTrie::ROOT, 0);
        self.table
    }

    fn is_skipped(&self, address: u32) -> bool {
        self.skip
            .iter()
            .any(|(from, to)| address >= *from && address <= *to)
    }

    // returns true if the subtree holds at least one mapping
    fn fill(&mut self, node: NodeId, prefix: u32) -> bool {
        let mut has_values = false;

        for byte in 0..=255u8 {
            let address = prefix | byte as u32;

            match self.trie.lookup(node, byte) {
                Cell::CodePoint(cp) => {
                    has_values = true;
                    if self.is_skipped(address) || self.exclude.contains(&cp) {
                        continue;
                    }
                    self.table.set_char(cp, MultiByte(address));
                }

                Cell::SeqRef(id) => {
                    has_values = true;
                    if self.is_skipped(address) {
                        continue;
                    }
                    let run = self.sequences.get(id);
                    self.table.set_sequence(run, MultiByte(address));
                }

                Cell::NodeRef(next) => {
                    if self.empty_nodes.contains(&next) {
                        continue;
                    }
                    if self.fill(next, address << 8) {
                        has_values = true;
                    } else {
                        self.empty_nodes.insert(next);
                    }
                }

                Cell::Unassigned | Cell::Algorithmic => {}
            }
        }

        has_values
    }
}
