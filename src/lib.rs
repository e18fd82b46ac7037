/// This module contains the codec engine, its registry and the ambient services
/// (debug logs, configuration)
pub mod core;

pub use crate::core::codec::registry;
pub use crate::core::codec::text::dbcs::{
    CodecError, CodecOptions, DbcsCodec, DbcsDecoder, DbcsEncoder, Gb18030Ranges, Result,
};
pub use crate::core::codec::text::{TextDecoder, TextEncoder};
