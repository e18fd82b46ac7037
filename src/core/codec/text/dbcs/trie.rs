use super::error::{CodecError, Result};

/// Index of a node in the trie arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

/// Index of a run in the sequence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeqId(pub usize);

/// The content of a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// no mapping for this byte path
    Unassigned,
    /// complete character, may be above U+FFFF
    CodePoint(u32),
    /// more bytes required, continue at the given node
    NodeRef(NodeId),
    /// the path yields a run of code points
    SeqRef(SeqId),
    /// 4th byte of a gb18030 linear sequence
    Algorithmic,
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Unassigned
    }
}

pub type Node = [Cell; 256];

/// Byte indexed tree: each node maps the next input byte to a `Cell`.<br/>
/// The root node always exists. Nodes are never removed.
#[derive(Debug, Clone)]
pub struct DecodeTrie {
    nodes: Vec<Box<Node>>,
}

impl DecodeTrie {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        DecodeTrie {
            nodes: vec![Box::new([Cell::Unassigned; 256])],
        }
    }

    pub fn nr_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub fn lookup(&self, node: NodeId, byte: u8) -> Cell {
        self.nodes[node.0][byte as usize]
    }

    pub fn alloc_node(&mut self) -> NodeId {
        self.nodes.push(Box::new([Cell::Unassigned; 256]));
        NodeId(self.nodes.len() - 1)
    }

    /// raw write, no overwrite check
    pub fn set(&mut self, node: NodeId, byte: u8, cell: Cell) {
        self.nodes[node.0][byte as usize] = cell;
    }

    /// write `cell` in an unassigned slot.<br/>
    /// `address` is only used to report the conflict.
    pub fn assign(&mut self, node: NodeId, byte: u8, cell: Cell, address: u32) -> Result<()> {
        match self.lookup(node, byte) {
            Cell::Unassigned => {
                self.set(node, byte, cell);
                Ok(())
            }
            _ => Err(CodecError::DuplicateMapping { address }),
        }
    }

    /// Walks `prefix` from the root, allocating the missing nodes.<br/>
    /// Returns the node that holds the cells addressed by the byte following `prefix`.
    pub fn get_or_create_node(&mut self, prefix: &[u8]) -> Result<NodeId> {
        let mut node = DecodeTrie::ROOT;
        let mut address = 0u32;

        for b in prefix {
            address = (address << 8) | *b as u32;
            node = match self.lookup(node, *b) {
                Cell::Unassigned => {
                    let next = self.alloc_node();
                    self.set(node, *b, Cell::NodeRef(next));
                    next
                }
                Cell::NodeRef(next) => next,
                _ => return Err(CodecError::DuplicateMapping { address }),
            };
        }

        Ok(node)
    }
}

impl Default for DecodeTrie {
    fn default() -> Self {
        DecodeTrie::new()
    }
}

/// Splits a chunk start address into (node prefix, first cell byte).<br/>
/// 0x8140 -> ([0x81], 0x40), 0x40 -> ([], 0x40), 0 -> ([], 0)
pub fn split_address(address: u32) -> (Vec<u8>, u8) {
    let mut bytes = vec![];
    let mut a = address;
    while a > 0 {
        bytes.push((a & 0xff) as u8);
        a >>= 8;
    }
    if bytes.is_empty() {
        bytes.push(0);
    }
    bytes.reverse();

    let low = bytes.pop().unwrap_or(0);
    (bytes, low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_address() {
        assert_eq!(split_address(0x8140), (vec![0x81], 0x40));
        assert_eq!(split_address(0x40), (vec![], 0x40));
        assert_eq!(split_address(0), (vec![], 0));
        assert_eq!(split_address(0x8130_8130), (vec![0x81, 0x30, 0x81], 0x30));
    }

    #[test]
    fn test_get_or_create_node_reuses_path() {
        let mut trie = DecodeTrie::new();

        let a = trie.get_or_create_node(&[0x81]).unwrap();
        let b = trie.get_or_create_node(&[0x81]).unwrap();
        assert_eq!(a, b);
        assert_eq!(trie.nr_nodes(), 2);
        assert_eq!(trie.lookup(DecodeTrie::ROOT, 0x81), Cell::NodeRef(a));

        let c = trie.get_or_create_node(&[0x81, 0x30]).unwrap();
        assert_ne!(a, c);
        assert_eq!(trie.nr_nodes(), 3);
        assert_eq!(trie.get_or_create_node(&[]).unwrap(), DecodeTrie::ROOT);
    }

    #[test]
    fn test_path_through_terminal_is_duplicate() {
        let mut trie = DecodeTrie::new();
        trie.assign(DecodeTrie::ROOT, 0x41, Cell::CodePoint(0x41), 0x41)
            .unwrap();

        match trie.get_or_create_node(&[0x41]) {
            Err(CodecError::DuplicateMapping { address }) => assert_eq!(address, 0x41),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_assign_twice_fails() {
        let mut trie = DecodeTrie::new();
        trie.assign(DecodeTrie::ROOT, 0x20, Cell::CodePoint(0x20), 0x20)
            .unwrap();
        assert!(trie
            .assign(DecodeTrie::ROOT, 0x20, Cell::CodePoint(0x21), 0x20)
            .is_err());
        assert_eq!(trie.lookup(DecodeTrie::ROOT, 0x20), Cell::CodePoint(0x20));
    }
}
