use std::collections::HashSet;
use std::sync::Arc;

use super::chunk::{Chunk, ChunkParser};
use super::decoder::DbcsDecoder;
use super::encode_table::{EncodeTable, EncodeTableBuilder, MultiByte};
use super::encoder::DbcsEncoder;
use super::error::Result;
use super::gb18030::{self, Gb18030Ranges};
use super::sequence::SequenceTable;
use super::trie::DecodeTrie;

use crate::core::codec::text::{decode_to_string, encode_str};

/// Build options of a multi-byte codec.
#[derive(Debug, Clone)]
pub struct CodecOptions {
    /// emitted by the decoder for invalid input
    pub replacement_char: char,
    /// encoded (if mapped) for unmappable input, '?' otherwise
    pub encode_replacement_char: char,
    /// decode only code points
    pub exclude_from_encode: HashSet<u32>,
    /// decode only addresses, inclusive ranges
    pub encode_skip: Vec<(u32, u32)>,
    /// extra unicode -> bytes pairs, registered after the trie walk
    pub encode_add: Vec<(u32, u32)>,
    pub gb18030: Option<Gb18030Ranges>,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            replacement_char: '\u{FFFD}',
            encode_replacement_char: '?',
            exclude_from_encode: HashSet::new(),
            encode_skip: vec![],
            encode_add: vec![],
            gb18030: None,
        }
    }
}

impl CodecOptions {
    pub fn new() -> Self {
        CodecOptions::default()
    }

    pub fn replacement_char(mut self, c: char) -> Self {
        self.replacement_char = c;
        self
    }

    pub fn encode_replacement_char(mut self, c: char) -> Self {
        self.encode_replacement_char = c;
        self
    }

    pub fn exclude_from_encode(mut self, codep: u32) -> Self {
        self.exclude_from_encode.insert(codep);
        self
    }

    pub fn encode_skip(mut self, from: u32, to: u32) -> Self {
        self.encode_skip.push((from, to));
        self
    }

    pub fn encode_add(mut self, codep: u32, value: u32) -> Self {
        self.encode_add.push((codep, value));
        self
    }

    pub fn gb18030(mut self, ranges: Gb18030Ranges) -> Self {
        self.gb18030 = Some(ranges);
        self
    }
}

/// The immutable tables of one named multi-byte encoding.<br/>
/// Built once, then shared (`Arc`) by any number of decoders and encoders.
#[derive(Debug)]
pub struct DbcsCodec {
    name: String,
    trie: DecodeTrie,
    sequences: SequenceTable,
    encode_table: EncodeTable,
    gb18030: Option<Gb18030Ranges>,
    replacement_char: u32,
    fallback: MultiByte,
}

impl DbcsCodec {
    pub fn build(name: &str, chunks: &[Chunk], options: CodecOptions) -> Result<DbcsCodec> {
        dbg_println!("building codec '{}' from {} chunks", name, chunks.len());

        let mut trie = DecodeTrie::new();
        let mut sequences = SequenceTable::new();

        {
            let mut parser = ChunkParser::new(&mut trie, &mut sequences);
            for chunk in chunks {
                parser.add_chunk(chunk)?;
            }
            dbg_println!(
                "codec '{}': {} chunks, {} cells",
                name,
                parser.nr_chunks(),
                parser.nr_cells()
            );
        }

        if options.gb18030.is_some() {
            gb18030::attach_to_trie(&mut trie)?;
        }

        let mut encode_table = EncodeTableBuilder::new(&trie, &sequences, &options).build();
        for (codep, value) in &options.encode_add {
            encode_table.set_char(*codep, MultiByte(*value));
        }

        let fallback = encode_table.fallback(options.encode_replacement_char);

        dbg_println!(
            "codec '{}': {} trie nodes, {} sequences, {} encode entries ({} runs), fallback {:x?}",
            name,
            trie.nr_nodes(),
            sequences.len(),
            encode_table.len(),
            encode_table.nr_sequences(),
            fallback.to_vec()
        );

        Ok(DbcsCodec {
            name: name.to_owned(),
            trie,
            sequences,
            encode_table,
            gb18030: options.gb18030,
            replacement_char: options.replacement_char as u32,
            fallback,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trie(&self) -> &DecodeTrie {
        &self.trie
    }

    pub fn sequences(&self) -> &SequenceTable {
        &self.sequences
    }

    pub fn encode_table(&self) -> &EncodeTable {
        &self.encode_table
    }

    pub fn gb18030(&self) -> Option<&Gb18030Ranges> {
        self.gb18030.as_ref()
    }

    pub fn replacement_char(&self) -> u32 {
        self.replacement_char
    }

    /// bytes written for unmappable input
    pub fn fallback(&self) -> MultiByte {
        self.fallback
    }

    pub fn decoder(self: &Arc<Self>) -> DbcsDecoder {
        DbcsDecoder::new(Arc::clone(self))
    }

    pub fn encoder(self: &Arc<Self>) -> DbcsEncoder {
        DbcsEncoder::new(Arc::clone(self))
    }

    /// one shot decode with a fresh decoder
    pub fn decode(self: &Arc<Self>, data: &[u8]) -> String {
        decode_to_string(&mut self.decoder(), data)
    }

    /// one shot encode with a fresh encoder
    pub fn encode(self: &Arc<Self>, text: &str) -> Vec<u8> {
        encode_str(&mut self.encoder(), text)
    }
}
