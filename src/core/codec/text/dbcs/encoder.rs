use std::sync::Arc;

use super::codec::DbcsCodec;
use super::encode_table::{EncodeEntry, MultiByte};
use super::gb18030::ordinal_to_bytes;
use super::sequence::{SequenceBranch, SequenceNode};

use crate::core::codec::text::{
    combine_surrogates, is_high_surrogate, is_low_surrogate, TextEncoder,
};

/// Streaming encoder state.<br/>
/// `lead_surrogate`: high surrogate waiting for its low half.<br/>
/// `seq`: code points of the run being matched, empty at a sequence boundary.
#[derive(Debug, Clone)]
pub struct DbcsEncoder {
    codec: Arc<DbcsCodec>,
    lead_surrogate: Option<u16>,
    seq: Vec<u32>,
}

impl DbcsEncoder {
    pub fn new(codec: Arc<DbcsCodec>) -> Self {
        DbcsEncoder {
            codec,
            lead_surrogate: None,
            seq: vec![],
        }
    }

    pub fn is_at_boundary(&self) -> bool {
        self.seq.is_empty() && self.lead_surrogate.is_none()
    }

    fn push_fallback(&self, out: &mut Vec<u8>) {
        self.codec.fallback().write_to(out);
    }

    /// unpaired surrogate: ends the current run then writes the fallback
    fn push_invalid(&mut self, out: &mut Vec<u8>) {
        dbg_println!("{}: unpaired surrogate", self.codec.name());
        self.flush_sequence(out);
        self.push_fallback(out);
    }

    fn feed(&mut self, codep: u32, out: &mut Vec<u8>) {
        if self.seq.is_empty() {
            self.start(codep, out);
            return;
        }

        let codec = Arc::clone(&self.codec);
        let next = current_branch(&codec, &self.seq).and_then(|b| b.get(codep));

        match next {
            Some(SequenceNode::Branch(_)) => self.seq.push(codep),
            Some(SequenceNode::Leaf(mb)) => {
                mb.write_to(out);
                self.seq.clear();
            }
            None => {
                // not part of the run: resolve what was matched, then retry
                let rest = self.resolve_prefix(out);
                for cp in rest {
                    self.feed(cp, out);
                }
                self.feed(codep, out);
            }
        }
    }

    // lookup at a sequence boundary
    fn start(&mut self, codep: u32, out: &mut Vec<u8>) {
        let codec = Arc::clone(&self.codec);

        match codec.encode_table().get(codep) {
            Some(EncodeEntry::Bytes(mb)) => mb.write_to(out),
            Some(EncodeEntry::Sequence(_)) => self.seq.push(codep),
            None => match self.algorithmic(codep) {
                Some(bytes) => out.extend_from_slice(&bytes),
                None => {
                    dbg_println!("{}: cannot encode U+{:04X}", codec.name(), codep);
                    self.push_fallback(out)
                }
            },
        }
    }

    fn algorithmic(&self, codep: u32) -> Option<[u8; 4]> {
        let ranges = self.codec.gb18030()?;
        let ordinal = ranges.code_point_to_ordinal(codep).ok()?;
        ordinal_to_bytes(ordinal)
    }

    /// Ends the current run without continuation.<br/>
    /// Writes the longest matched prefix that has a value (the fallback for the
    /// first code point if none) and returns the code points left to encode.
    fn resolve_prefix(&mut self, out: &mut Vec<u8>) -> Vec<u32> {
        let seq = std::mem::take(&mut self.seq);
        let codec = Arc::clone(&self.codec);

        let mut best: Option<(usize, MultiByte)> = None;
        let entry = seq.first().and_then(|cp| codec.encode_table().get(*cp));
        if let Some(EncodeEntry::Sequence(root)) = entry {
            let mut branch = Some(root);
            for depth in 1..=seq.len() {
                let b = match branch {
                    Some(b) => b,
                    None => break,
                };
                if let Some(mb) = b.default {
                    best = Some((depth, mb));
                }
                branch = match seq.get(depth).and_then(|cp| b.get(*cp)) {
                    Some(SequenceNode::Branch(next)) => Some(next),
                    _ => None,
                };
            }
        }

        match best {
            Some((depth, mb)) => {
                mb.write_to(out);
                seq[depth..].to_vec()
            }
            None => {
                dbg_println!("{}: no value for run {:x?}", codec.name(), seq);
                self.push_fallback(out);
                seq.get(1..).map(|s| s.to_vec()).unwrap_or_default()
            }
        }
    }

    /// resolve the pending run completely
    fn flush_sequence(&mut self, out: &mut Vec<u8>) {
        while !self.seq.is_empty() {
            let rest = self.resolve_prefix(out);
            for cp in rest {
                self.feed(cp, out);
            }
        }
    }
}

fn current_branch<'a>(codec: &'a DbcsCodec, seq: &[u32]) -> Option<&'a SequenceBranch> {
    match codec.encode_table().get(*seq.first()?)? {
        EncodeEntry::Sequence(root) => root.walk(&seq[1..]),
        EncodeEntry::Bytes(_) => None,
    }
}

impl TextEncoder for DbcsEncoder {
    fn write(&mut self, units: &[u16]) -> Vec<u8> {
        let per_unit = if self.codec.gb18030().is_some() { 4 } else { 3 };
        let mut out = Vec::with_capacity(units.len() * per_unit);

        for unit in units {
            let u = *unit as u32;

            if is_high_surrogate(u) {
                // two high surrogates in a row: the first one is unpaired
                if self.lead_surrogate.replace(*unit).is_some() {
                    self.push_invalid(&mut out);
                }
                continue;
            }

            if is_low_surrogate(u) {
                match self.lead_surrogate.take() {
                    Some(high) => self.feed(combine_surrogates(high as u32, u), &mut out),
                    None => self.push_invalid(&mut out),
                }
                continue;
            }

            if self.lead_surrogate.take().is_some() {
                self.push_invalid(&mut out);
            }

            self.feed(u, &mut out);
        }

        out
    }

    fn end(&mut self) -> Vec<u8> {
        let mut out = vec![];

        self.flush_sequence(&mut out);

        if self.lead_surrogate.take().is_some() {
            dbg_println!("{}: unpaired surrogate at end of stream", self.codec.name());
            self.push_fallback(&mut out);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::super::chunk::Chunk;
    use super::super::codec::CodecOptions;
    use super::super::gb18030::Gb18030Ranges;
    use super::*;

    fn codec(chunks: &[Chunk], options: CodecOptions) -> Arc<DbcsCodec> {
        Arc::new(DbcsCodec::build("test", chunks, options).unwrap())
    }

    fn ascii() -> Chunk {
        Chunk::new("0").literal("\u{0}").repeat(0x7f)
    }

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_encode_basic() {
        let c = codec(&[ascii(), Chunk::new("8140").literal("測試")], CodecOptions::default());
        assert_eq!(c.encode("a測試b"), vec![0x61, 0x81, 0x40, 0x81, 0x41, 0x62]);

        // unmapped: fallback '?'
        assert_eq!(c.encode("a漢"), vec![0x61, b'?']);
    }

    #[test]
    fn test_fallback_uses_encoded_replacement() {
        let c = codec(
            &[Chunk::new("8140").literal("・")],
            CodecOptions::new().encode_replacement_char('・'),
        );
        assert_eq!(c.encode("x"), vec![0x81, 0x40]);

        // neither the replacement nor '?' are mapped
        let c = codec(&[Chunk::new("8140").literal("測")], CodecOptions::default());
        assert_eq!(c.encode("x"), vec![0x3f]);
    }

    #[test]
    fn test_surrogates() {
        let c = codec(
            &[ascii(), Chunk::new("8150").literal("\u{20000}")],
            CodecOptions::default(),
        );
        assert_eq!(c.encode("\u{20000}"), vec![0x81, 0x50]);

        // pair split across writes
        let mut e = c.encoder();
        assert!(e.write(&[0xD840]).is_empty());
        assert!(!e.is_at_boundary());
        assert_eq!(e.write(&[0xDC00]), vec![0x81, 0x50]);
        assert!(e.end().is_empty());

        // lone low, lone high followed by a bmp char, two highs
        let mut e = c.encoder();
        assert_eq!(e.write(&[0xDC00, 0x41]), vec![b'?', 0x41]);
        assert_eq!(e.write(&[0xD840, 0x41]), vec![b'?', 0x41]);
        assert_eq!(e.write(&[0xD840, 0xD840, 0xDC00]), vec![b'?', 0x81, 0x50]);

        // high surrogate pending at end
        assert!(e.write(&[0xD840]).is_empty());
        assert_eq!(e.end(), vec![b'?']);
    }

    fn seq_codec() -> Arc<DbcsCodec> {
        // 0x8840 -> a b c, 0x8841 -> a, 0x8842 -> b, 0x8843 -> d, 0x8844 -> e f
        codec(
            &[
                Chunk::new("8840")
                    .literal("\u{0FFE}abc")
                    .literal("abd")
                    .literal("\u{0FFF}ef"),
            ],
            CodecOptions::default(),
        )
    }

    #[test]
    fn test_sequence_match() {
        let c = seq_codec();
        assert_eq!(c.encode("abc"), vec![0x88, 0x40]);
        assert_eq!(c.encode("abcabc"), vec![0x88, 0x40, 0x88, 0x40]);
        assert_eq!(c.encode("ef"), vec![0x88, 0x44]);
    }

    #[test]
    fn test_sequence_greediness() {
        let c = seq_codec();

        // a b d: 'a' alone, then fresh lookup at b
        assert_eq!(c.encode("abd"), vec![0x88, 0x41, 0x88, 0x42, 0x88, 0x43]);

        // a then something else
        assert_eq!(c.encode("ad"), vec![0x88, 0x41, 0x88, 0x43]);

        // run start without any shorter value: fallback, then retry
        assert_eq!(c.encode("ed"), vec![b'?', 0x88, 0x43]);
        assert_eq!(c.encode("eabc"), vec![b'?', 0x88, 0x40]);
    }

    #[test]
    fn test_sequence_split_across_writes() {
        let c = seq_codec();
        let mut e = c.encoder();
        assert!(e.write(&units("a")).is_empty());
        assert!(e.write(&units("b")).is_empty());
        assert_eq!(e.write(&units("c")), vec![0x88, 0x40]);
        assert!(e.is_at_boundary());

        // pending run flushed at end
        assert!(e.write(&units("ab")).is_empty());
        assert_eq!(e.end(), vec![0x88, 0x41, 0x88, 0x42]);

        let mut e = c.encoder();
        assert!(e.write(&units("e")).is_empty());
        assert_eq!(e.end(), vec![b'?']);
    }

    #[test]
    fn test_sequence_interrupted_by_lone_surrogate() {
        let c = seq_codec();
        let mut e = c.encoder();
        assert!(e.write(&units("a")).is_empty());
        assert_eq!(e.write(&[0xDC00]), vec![0x88, 0x41, b'?']);
        assert!(e.end().is_empty());
    }

    #[test]
    fn test_gb18030_encode() {
        let ranges = Gb18030Ranges::new(vec![0, 189000], vec![0x80, 0x10000]).unwrap();
        let c = codec(
            &[ascii(), Chunk::new("8140").literal("測")],
            CodecOptions::new().gb18030(ranges),
        );

        assert_eq!(c.encode("\u{80}"), vec![0x81, 0x30, 0x81, 0x30]);
        assert_eq!(c.encode("\u{DA}"), vec![0x81, 0x30, 0x8A, 0x30]);
        assert_eq!(c.encode("\u{10000}"), vec![0x90, 0x30, 0x81, 0x30]);
        // explicit mapping wins
        assert_eq!(c.encode("測"), vec![0x81, 0x40]);
        // ascii is below the first breakpoint and mapped explicitly
        assert_eq!(c.encode("A"), vec![0x41]);
    }

    #[test]
    fn test_encode_add_and_exclusion() {
        let c = codec(
            &[ascii(), Chunk::new("8140").literal("測試")],
            CodecOptions::new()
                .exclude_from_encode('試' as u32)
                .encode_add(0xA5, 0x5C),
        );
        assert_eq!(c.encode("試"), vec![b'?']);
        assert_eq!(c.encode("¥"), vec![0x5C]);
        assert_eq!(c.decode(&[0x81, 0x41]), "試");
    }
}
