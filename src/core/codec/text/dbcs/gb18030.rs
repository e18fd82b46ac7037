//! GB18030 four byte linear range.
//!
//! A four byte sequence `b1 b2 b3 b4` (b1, b3 in 0x81..=0xfe, b2, b4 in 0x30..=0x39)
//! is numbered by its linear ordinal:
//! `(b1 - 0x81) * 12600 + (b2 - 0x30) * 1260 + (b3 - 0x81) * 10 + (b4 - 0x30)`.
//! The characters not listed explicitly in the mapping table are assigned in
//! increasing unicode order: between two breakpoints, ordinals and code points
//! grow together.

use super::error::{CodecError, Result};
use super::trie::{Cell, DecodeTrie, NodeId};

pub const MAX_CODE_POINT: u32 = 0x10FFFF;

const LEAD_RANGE: std::ops::RangeInclusive<u8> = 0x81..=0xFE;
const DIGIT_RANGE: std::ops::RangeInclusive<u8> = 0x30..=0x39;

/// number of valid ordinals: 126 * 10 * 126 * 10
pub const NR_ORDINALS: u32 = 126 * 12600;

/// Two parallel sorted arrays of breakpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gb18030Ranges {
    ordinals: Vec<u32>,
    code_points: Vec<u32>,
}

impl Gb18030Ranges {
    pub fn new(ordinals: Vec<u32>, code_points: Vec<u32>) -> Result<Self> {
        if ordinals.is_empty() {
            return Err(CodecError::InvalidRangeTable("no breakpoint".to_owned()));
        }

        if ordinals.len() != code_points.len() {
            return Err(CodecError::InvalidRangeTable(format!(
                "{} ordinals for {} code points",
                ordinals.len(),
                code_points.len()
            )));
        }

        let sorted = |v: &[u32]| v.windows(2).all(|w| w[0] < w[1]);
        if !sorted(&ordinals) || !sorted(&code_points) {
            return Err(CodecError::InvalidRangeTable(
                "breakpoints must be strictly increasing".to_owned(),
            ));
        }

        Ok(Gb18030Ranges {
            ordinals,
            code_points,
        })
    }

    /// (ordinal, code point) pairs
    pub fn breakpoints(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.ordinals
            .iter()
            .cloned()
            .zip(self.code_points.iter().cloned())
    }

    pub fn ordinal_to_code_point(&self, ordinal: u32) -> Result<u32> {
        let idx = find_idx(&self.ordinals, ordinal).ok_or(CodecError::OutOfRange(ordinal))?;

        let codep = self.code_points[idx] as u64 + (ordinal - self.ordinals[idx]) as u64;
        if codep > MAX_CODE_POINT as u64 || (0xD800..0xE000).contains(&codep) {
            return Err(CodecError::OutOfRange(ordinal));
        }

        Ok(codep as u32)
    }

    pub fn code_point_to_ordinal(&self, codep: u32) -> Result<u32> {
        let idx = find_idx(&self.code_points, codep).ok_or(CodecError::OutOfRange(codep))?;

        let ordinal = self.ordinals[idx] as u64 + (codep - self.code_points[idx]) as u64;
        if ordinal >= NR_ORDINALS as u64 {
            return Err(CodecError::OutOfRange(codep));
        }

        Ok(ordinal as u32)
    }
}

/// index of the largest breakpoint <= `val`
#[inline]
fn find_idx(table: &[u32], val: u32) -> Option<usize> {
    match table.partition_point(|v| *v <= val) {
        0 => None,
        n => Some(n - 1),
    }
}

pub fn ordinal_from_bytes(b: [u8; 4]) -> Option<u32> {
    if !LEAD_RANGE.contains(&b[0])
        || !DIGIT_RANGE.contains(&b[1])
        || !LEAD_RANGE.contains(&b[2])
        || !DIGIT_RANGE.contains(&b[3])
    {
        return None;
    }

    Some(
        (b[0] - 0x81) as u32 * 12600
            + (b[1] - 0x30) as u32 * 1260
            + (b[2] - 0x81) as u32 * 10
            + (b[3] - 0x30) as u32,
    )
}

pub fn ordinal_to_bytes(ordinal: u32) -> Option<[u8; 4]> {
    if ordinal >= NR_ORDINALS {
        return None;
    }

    let mut v = ordinal;
    let b1 = 0x81 + (v / 12600) as u8;
    v %= 12600;
    let b2 = 0x30 + (v / 1260) as u8;
    v %= 1260;
    let b3 = 0x81 + (v / 10) as u8;
    let b4 = 0x30 + (v % 10) as u8;

    Some([b1, b2, b3, b4])
}

/// Routes every unassigned four byte path of the linear range to `Cell::Algorithmic`.<br/>
/// Two shared nodes hold the 3rd/4th bytes of the paths the table does not
/// reach; paths partially listed by the table are completed in place.
pub fn attach_to_trie(trie: &mut DecodeTrie) -> Result<()> {
    let fourth = trie.alloc_node();
    for l in DIGIT_RANGE {
        trie.set(fourth, l, Cell::Algorithmic);
    }

    let third = trie.alloc_node();
    for k in LEAD_RANGE {
        trie.set(third, k, Cell::NodeRef(fourth));
    }

    for i in LEAD_RANGE {
        let address = i as u32;
        let first = match trie.lookup(DecodeTrie::ROOT, i) {
            Cell::Unassigned => {
                let n = trie.alloc_node();
                trie.set(DecodeTrie::ROOT, i, Cell::NodeRef(n));
                n
            }
            Cell::NodeRef(n) => n,
            _ => return Err(CodecError::Gb18030Conflict { address }),
        };

        for j in DIGIT_RANGE {
            let address = address << 8 | j as u32;
            match trie.lookup(first, j) {
                Cell::Unassigned => trie.set(first, j, Cell::NodeRef(third)),
                Cell::NodeRef(n) if n == third => {}
                Cell::NodeRef(n) => fill_third_byte_node(trie, n, fourth, address)?,
                _ => return Err(CodecError::Gb18030Conflict { address }),
            }
        }
    }

    Ok(())
}

fn fill_third_byte_node(
    trie: &mut DecodeTrie,
    node: NodeId,
    fourth: NodeId,
    prefix: u32,
) -> Result<()> {
    for k in LEAD_RANGE {
        let address = prefix << 8 | k as u32;
        match trie.lookup(node, k) {
            Cell::Unassigned => trie.set(node, k, Cell::NodeRef(fourth)),
            Cell::NodeRef(n) if n == fourth => {}
            Cell::NodeRef(n) => {
                for l in DIGIT_RANGE {
                    if trie.lookup(n, l) == Cell::Unassigned {
                        trie.set(n, l, Cell::Algorithmic);
                    }
                }
            }
            _ => return Err(CodecError::Gb18030Conflict { address }),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_breakpoint() {
        let r = Gb18030Ranges::new(vec![0], vec![0x80]).unwrap();
        assert_eq!(r.ordinal_to_code_point(100).unwrap(), 0x80 + 100);
        assert_eq!(r.code_point_to_ordinal(0x80 + 100).unwrap(), 100);
    }

    #[test]
    fn test_bijection_on_breakpoints() {
        let r = Gb18030Ranges::new(
            vec![0, 36, 38, 45, 50, 81, 89, 95, 96, 100, 103, 104, 39419, 189000],
            vec![
                0x80, 0xA5, 0xA9, 0xB2, 0xB8, 0xD8, 0xE2, 0xEB, 0xEE, 0xF4, 0xF8, 0xFB, 0xE000,
                0x10000,
            ],
        )
        .unwrap();

        for (ordinal, codep) in r.breakpoints() {
            assert_eq!(r.ordinal_to_code_point(ordinal).unwrap(), codep);
            assert_eq!(r.code_point_to_ordinal(codep).unwrap(), ordinal);
        }

        // interpolation inside a range
        assert_eq!(r.ordinal_to_code_point(37).unwrap(), 0xA6);
        assert_eq!(r.code_point_to_ordinal(0x10000 + 5).unwrap(), 189005);
    }

    #[test]
    fn test_out_of_range() {
        let r = Gb18030Ranges::new(vec![10], vec![0x100]).unwrap();
        match r.ordinal_to_code_point(9) {
            Err(CodecError::OutOfRange(9)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(r.code_point_to_ordinal(0xFF).is_err());

        let r = Gb18030Ranges::new(vec![189000], vec![0x10000]).unwrap();
        assert_eq!(
            r.ordinal_to_code_point(189000 + 0xFFFFF).unwrap(),
            MAX_CODE_POINT
        );
        assert!(r.ordinal_to_code_point(189000 + 0x100000).is_err());

        // no surrogate code point
        let r = Gb18030Ranges::new(vec![0], vec![0xD700]).unwrap();
        assert_eq!(r.ordinal_to_code_point(0xFF).unwrap(), 0xD7FF);
        assert!(r.ordinal_to_code_point(0x100).is_err());
        assert!(r.ordinal_to_code_point(0x8FF).is_err());
        assert_eq!(r.ordinal_to_code_point(0x900).unwrap(), 0xE000);
    }

    #[test]
    fn test_invalid_tables() {
        assert!(Gb18030Ranges::new(vec![], vec![]).is_err());
        assert!(Gb18030Ranges::new(vec![0, 1], vec![0x80]).is_err());
        assert!(Gb18030Ranges::new(vec![0, 5, 3], vec![0x80, 0x90, 0xA0]).is_err());
        assert!(Gb18030Ranges::new(vec![0, 5], vec![0x90, 0x80]).is_err());
    }

    #[test]
    fn test_ordinal_bytes() {
        assert_eq!(ordinal_from_bytes([0x81, 0x30, 0x81, 0x30]), Some(0));
        assert_eq!(ordinal_to_bytes(0), Some([0x81, 0x30, 0x81, 0x30]));
        assert_eq!(ordinal_from_bytes([0x81, 0x30, 0x8A, 0x30]), Some(90));
        assert_eq!(ordinal_to_bytes(189000), Some([0x90, 0x30, 0x81, 0x30]));
        assert_eq!(
            ordinal_from_bytes([0xFE, 0x39, 0xFE, 0x39]),
            Some(NR_ORDINALS - 1)
        );
        assert_eq!(ordinal_to_bytes(NR_ORDINALS), None);
        assert_eq!(ordinal_from_bytes([0x81, 0x40, 0x81, 0x30]), None);
    }

    #[test]
    fn test_attach_to_trie() {
        let mut trie = DecodeTrie::new();
        attach_to_trie(&mut trie).unwrap();

        let n1 = match trie.lookup(DecodeTrie::ROOT, 0x81) {
            Cell::NodeRef(n) => n,
            other => panic!("unexpected {:?}", other),
        };
        let n2 = match trie.lookup(n1, 0x30) {
            Cell::NodeRef(n) => n,
            other => panic!("unexpected {:?}", other),
        };
        let n3 = match trie.lookup(n2, 0x81) {
            Cell::NodeRef(n) => n,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(trie.lookup(n3, 0x30), Cell::Algorithmic);
        assert_eq!(trie.lookup(n3, 0x40), Cell::Unassigned);
        assert_eq!(trie.lookup(n1, 0x40), Cell::Unassigned);
        assert_eq!(trie.lookup(DecodeTrie::ROOT, 0x41), Cell::Unassigned);

        // root + 2 shared + 126 second byte nodes
        assert_eq!(trie.nr_nodes(), 1 + 2 + 126);
    }

    #[test]
    fn test_attach_conflict() {
        let mut trie = DecodeTrie::new();
        trie.set(DecodeTrie::ROOT, 0x81, Cell::CodePoint(0x81));
        match attach_to_trie(&mut trie) {
            Err(CodecError::Gb18030Conflict { address }) => assert_eq!(address, 0x81),
            other => panic!("unexpected {:?}", other),
        }
    }
}
