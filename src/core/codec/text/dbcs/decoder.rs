use std::sync::Arc;

use super::codec::DbcsCodec;
use super::gb18030::ordinal_from_bytes;
use super::trie::{Cell, DecodeTrie, NodeId};

use crate::core::codec::text::{push_utf16, TextDecoder};

/// Streaming decoder state: a cursor in the shared trie plus the bytes of the
/// sequence being matched (carried across `write` calls).<br/>
/// On an unassigned path one replacement character is emitted and decoding
/// restarts one byte after the start of the failed sequence.
#[derive(Debug, Clone)]
pub struct DbcsDecoder {
    codec: Arc<DbcsCodec>,
    node: NodeId,
    pending: Vec<u8>,
}

impl DbcsDecoder {
    pub fn new(codec: Arc<DbcsCodec>) -> Self {
        DbcsDecoder {
            codec,
            node: DecodeTrie::ROOT,
            pending: Vec::with_capacity(4),
        }
    }

    /// true at a sequence boundary
    pub fn is_at_boundary(&self) -> bool {
        self.node == DecodeTrie::ROOT
    }

    /// bytes consumed but not yet resolved
    pub fn pending_bytes(&self) -> &[u8] {
        &self.pending
    }

    fn algorithmic(&self, bytes: [u8; 4]) -> Option<u32> {
        let ranges = self.codec.gb18030()?;
        let ordinal = ordinal_from_bytes(bytes)?;
        ranges.ordinal_to_code_point(ordinal).ok()
    }
}

impl TextDecoder for DbcsDecoder {
    fn write(&mut self, data: &[u8]) -> Vec<u16> {
        let prev = std::mem::take(&mut self.pending);
        let prev_len = prev.len();
        let total = prev_len + data.len();

        // previous bytes then new ones, as if they arrived contiguously
        let byte_at = |i: usize| {
            if i < prev_len {
                prev[i]
            } else {
                data[i - prev_len]
            }
        };

        let trie = self.codec.trie();
        let replacement = self.codec.replacement_char();

        let mut out = Vec::with_capacity(data.len());
        let mut node = self.node;
        let mut seq_start = 0;
        let mut i = prev_len;

        while i < total {
            let b = byte_at(i);

            let resolved = match trie.lookup(node, b) {
                Cell::CodePoint(cp) => {
                    push_utf16(&mut out, cp);
                    true
                }

                Cell::NodeRef(next) => {
                    node = next;
                    i += 1;
                    continue;
                }

                Cell::SeqRef(id) => {
                    for cp in self.codec.sequences().get(id) {
                        push_utf16(&mut out, *cp);
                    }
                    true
                }

                Cell::Algorithmic => {
                    let cp = if i >= seq_start + 3 {
                        self.algorithmic([byte_at(i - 3), byte_at(i - 2), byte_at(i - 1), b])
                    } else {
                        None
                    };

                    match cp {
                        Some(cp) => {
                            push_utf16(&mut out, cp);
                            true
                        }
                        None => false,
                    }
                }

                Cell::Unassigned => false,
            };

            if !resolved {
                dbg_println!(
                    "{}: invalid sequence {:x?}, resync",
                    self.codec.name(),
                    (seq_start..=i).map(|k| byte_at(k)).collect::<Vec<u8>>()
                );
                push_utf16(&mut out, replacement);
                // restart after the first byte of the failed sequence
                i = seq_start;
            }

            node = DecodeTrie::ROOT;
            i += 1;
            seq_start = i;
        }

        self.node = node;
        self.pending = (seq_start..total).map(|k| byte_at(k)).collect();

        out
    }

    fn end(&mut self) -> Vec<u16> {
        let mut out = vec![];

        if !self.pending.is_empty() || self.node != DecodeTrie::ROOT {
            dbg_println!(
                "{}: truncated sequence {:x?} at end of stream",
                self.codec.name(),
                self.pending
            );
            push_utf16(&mut out, self.codec.replacement_char());
        }

        self.pending.clear();
        self.node = DecodeTrie::ROOT;

        out
    }
}
