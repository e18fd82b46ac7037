//! Multi-byte (double/variable byte) table driven codec.
//!
//! The mapping chunks are parsed into a byte indexed trie (decode side); the
//! encode table is derived from a full walk of that trie. Both are immutable
//! once built and shared by the per stream `DbcsDecoder` / `DbcsEncoder`.

// mode declaration
pub mod chunk;
pub mod codec;
pub mod decoder;
pub mod encode_table;
pub mod encoder;
pub mod error;
pub mod gb18030;
pub mod sequence;
pub mod trie;

pub use self::chunk::{Chunk, ChunkEntry, ChunkParser};
pub use self::codec::{CodecOptions, DbcsCodec};
pub use self::decoder::DbcsDecoder;
pub use self::encode_table::{EncodeEntry, EncodeTable, EncodeTableBuilder, MultiByte};
pub use self::encoder::DbcsEncoder;
pub use self::error::{CodecError, Result};
pub use self::gb18030::Gb18030Ranges;
pub use self::sequence::{SequenceBranch, SequenceNode, SequenceTable};
pub use self::trie::{Cell, DecodeTrie, NodeId, SeqId};
