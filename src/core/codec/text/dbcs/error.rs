use std::fmt;
use std::io;

/// Errors raised while building a codec.<br/>
/// Run-time decoding and encoding never fail: invalid input is replaced.
#[derive(Debug)]
pub enum CodecError {
    /// a chunk writes a cell that is already assigned
    DuplicateMapping { address: u32 },
    /// high surrogate without low surrogate (or lone low surrogate) in a literal run
    MalformedSurrogate { chunk: String },
    /// the run goes past byte 0xff
    ChunkOverflow { chunk: String, address: u32 },
    /// a sequence marker announces more characters than available
    TruncatedSequence { chunk: String },
    /// repeat count without a preceding code point
    RepeatWithoutBase { chunk: String },
    InvalidAddress(String),
    Gb18030Conflict { address: u32 },
    InvalidRangeTable(String),
    /// algorithmic conversion outside the range table
    OutOfRange(u32),
    UnknownEncoding(String),
    InvalidDefinition(String),
    Json(serde_json::Error),
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::DuplicateMapping { address } => {
                write!(f, "duplicate mapping at address 0x{:x}", address)
            }
            CodecError::MalformedSurrogate { chunk } => {
                write!(f, "incorrect surrogate pair in chunk {}", chunk)
            }
            CodecError::ChunkOverflow { chunk, address } => write!(
                f,
                "chunk {} too long: would write past 0xff (0x{:x})",
                chunk, address
            ),
            CodecError::TruncatedSequence { chunk } => {
                write!(f, "truncated character sequence in chunk {}", chunk)
            }
            CodecError::RepeatWithoutBase { chunk } => {
                write!(f, "repeat count without base code point in chunk {}", chunk)
            }
            CodecError::InvalidAddress(s) => write!(f, "invalid chunk address '{}'", s),
            CodecError::Gb18030Conflict { address } => {
                write!(f, "gb18030 range conflicts with table at 0x{:x}", address)
            }
            CodecError::InvalidRangeTable(s) => write!(f, "invalid gb18030 range table: {}", s),
            CodecError::OutOfRange(v) => write!(f, "value 0x{:x} out of gb18030 range", v),
            CodecError::UnknownEncoding(s) => write!(f, "unknown encoding: {}", s),
            CodecError::InvalidDefinition(s) => write!(f, "invalid codec definition: {}", s),
            CodecError::Json(e) => write!(f, "json: {}", e),
            CodecError::Io(e) => write!(f, "io: {}", e),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Json(e) => Some(e),
            CodecError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Json(e)
    }
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        CodecError::Io(e)
    }
}
