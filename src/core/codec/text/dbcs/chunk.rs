//! Mapping table chunks.
//!
//! A chunk is a start address followed by runs:
//!
//! ```text
//! ["8140", "AB", 3, "C"]
//! ```
//!
//! writes 'A' at 0x8140, 'B' at 0x8141, 'C'..'E' (repeat of the previous code
//! point + 1) at 0x8142..0x8144 and 'C' at 0x8145.<br/>
//! Inside a literal, U+0FF1..=U+0FFF announces a sequence: U+0FFF is followed
//! by 2 characters, U+0FFE by 3, ... which are decoded together from one address.

use serde_json::Value;

use crate::core::codec::text::{combine_surrogates, is_high_surrogate, is_low_surrogate};

use super::error::{CodecError, Result};
use super::sequence::SequenceTable;
use super::trie::{split_address, Cell, DecodeTrie, NodeId};

pub const SEQUENCE_MARKER_FIRST: u32 = 0x0FF1;
pub const SEQUENCE_MARKER_LAST: u32 = 0x0FFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEntry {
    /// UTF-16 code units, surrogate pairs are combined at insertion
    Literal(Vec<u16>),
    /// previous code point + 1, repeated n times
    Repeat(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub address: String,
    pub entries: Vec<ChunkEntry>,
}

impl Chunk {
    pub fn new(address: &str) -> Self {
        Chunk {
            address: address.to_owned(),
            entries: vec![],
        }
    }

    pub fn literal(mut self, text: &str) -> Self {
        self.entries
            .push(ChunkEntry::Literal(text.encode_utf16().collect()));
        self
    }

    pub fn literal_units(mut self, units: &[u16]) -> Self {
        self.entries.push(ChunkEntry::Literal(units.to_vec()));
        self
    }

    pub fn repeat(mut self, count: u32) -> Self {
        self.entries.push(ChunkEntry::Repeat(count));
        self
    }

    /// `["8140", "literal", 12, ...]`
    pub fn from_json(value: &Value) -> Result<Chunk> {
        let vec = if let Value::Array(ref vec) = value {
            vec
        } else {
            return Err(CodecError::InvalidDefinition(format!(
                "chunk must be an array: {}",
                value
            )));
        };

        let mut chunk = match vec.first() {
            Some(Value::String(addr)) => Chunk::new(addr),
            _ => {
                return Err(CodecError::InvalidDefinition(format!(
                    "chunk without address: {}",
                    value
                )))
            }
        };

        for v in &vec[1..] {
            match v {
                Value::String(s) => chunk = chunk.literal(s),
                Value::Number(n) => match n.as_u64() {
                    Some(n) if n <= 0x100 => chunk = chunk.repeat(n as u32),
                    _ => {
                        return Err(CodecError::InvalidDefinition(format!(
                            "invalid repeat count {} in chunk {}",
                            n, chunk.address
                        )))
                    }
                },
                _ => {
                    return Err(CodecError::InvalidDefinition(format!(
                        "unexpected entry {} in chunk {}",
                        v, chunk.address
                    )))
                }
            }
        }

        Ok(chunk)
    }
}

/// 1 to 8 hex digits
pub fn parse_address(s: &str) -> Result<u32> {
    if s.is_empty() || s.len() > 8 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CodecError::InvalidAddress(s.to_owned()));
    }
    u32::from_str_radix(s, 16).map_err(|_| CodecError::InvalidAddress(s.to_owned()))
}

/// Turns chunks into trie cells and sequence table runs.
pub struct ChunkParser<'a> {
    trie: &'a mut DecodeTrie,
    sequences: &'a mut SequenceTable,
    nr_chunks: usize,
    nr_cells: usize,
}

impl<'a> ChunkParser<'a> {
    pub fn new(trie: &'a mut DecodeTrie, sequences: &'a mut SequenceTable) -> Self {
        ChunkParser {
            trie,
            sequences,
            nr_chunks: 0,
            nr_cells: 0,
        }
    }

    pub fn nr_chunks(&self) -> usize {
        self.nr_chunks
    }

    pub fn nr_cells(&self) -> usize {
        self.nr_cells
    }

    pub fn add_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        let address = parse_address(&chunk.address)?;
        let (prefix, first) = split_address(address);
        let node = self.trie.get_or_create_node(&prefix)?;
        let prefix = address & !0xff;

        let mut cur = first as u32;

        for entry in &chunk.entries {
            match entry {
                ChunkEntry::Literal(units) => {
                    let mut pos = 0;
                    while pos < units.len() {
                        let codep = next_code_point(units, &mut pos, chunk)?;

                        let is_marker =
                            (SEQUENCE_MARKER_FIRST..=SEQUENCE_MARKER_LAST).contains(&codep);
                        let cell = if is_marker {
                            let len = (SEQUENCE_MARKER_LAST - codep + 2) as usize;
                            let mut run = Vec::with_capacity(len);
                            for _ in 0..len {
                                if pos >= units.len() {
                                    return Err(CodecError::TruncatedSequence {
                                        chunk: chunk.address.clone(),
                                    });
                                }
                                run.push(next_code_point(units, &mut pos, chunk)?);
                            }
                            Cell::SeqRef(self.sequences.push(run))
                        } else {
                            Cell::CodePoint(codep)
                        };

                        self.write_cell(node, prefix, &mut cur, cell, chunk)?;
                    }
                }

                ChunkEntry::Repeat(count) => {
                    let base = if cur == 0 {
                        None
                    } else {
                        match self.trie.lookup(node, (cur - 1) as u8) {
                            Cell::CodePoint(cp) => Some(cp),
                            _ => None,
                        }
                    };
                    let mut codep = base.ok_or_else(|| CodecError::RepeatWithoutBase {
                        chunk: chunk.address.clone(),
                    })?;

                    for _ in 0..*count {
                        codep += 1;
                        self.write_cell(node, prefix, &mut cur, Cell::CodePoint(codep), chunk)?;
                    }
                }
            }
        }

        self.nr_chunks += 1;
        Ok(())
    }

    fn write_cell(
        &mut self,
        node: NodeId,
        prefix: u32,
        cur: &mut u32,
        cell: Cell,
        chunk: &Chunk,
    ) -> Result<()> {
        if *cur > 0xff {
            return Err(CodecError::ChunkOverflow {
                chunk: chunk.address.clone(),
                address: prefix + *cur,
            });
        }

        self.trie.assign(node, *cur as u8, cell, prefix | *cur)?;
        *cur += 1;
        self.nr_cells += 1;
        Ok(())
    }
}

fn next_code_point(units: &[u16], pos: &mut usize, chunk: &Chunk) -> Result<u32> {
    let unit = units[*pos] as u32;
    *pos += 1;

    if is_low_surrogate(unit) {
        return Err(CodecError::MalformedSurrogate {
            chunk: chunk.address.clone(),
        });
    }

    if !is_high_surrogate(unit) {
        return Ok(unit);
    }

    match units.get(*pos) {
        Some(low) if is_low_surrogate(*low as u32) => {
            *pos += 1;
            Ok(combine_surrogates(unit, *low as u32))
        }
        _ => Err(CodecError::MalformedSurrogate {
            chunk: chunk.address.clone(),
        }),
    }
}
