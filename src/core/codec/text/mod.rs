// mode declaration
pub mod dbcs;
pub mod utf8;

/// A streaming bytes -> text transform.<br/>
/// The produced text is a run of UTF-16 code units: code points above U+FFFF
/// are emitted as surrogate pairs.
pub trait TextDecoder {
    /// decode `data`, carrying any incomplete sequence into the next call
    fn write(&mut self, data: &[u8]) -> Vec<u16>;

    /// flush the carried state. must be called once, even without a prior write
    fn end(&mut self) -> Vec<u16>;
}

/// A streaming text -> bytes transform fed with UTF-16 code units.
pub trait TextEncoder {
    fn write(&mut self, units: &[u16]) -> Vec<u8>;

    fn end(&mut self) -> Vec<u8>;
}

pub const HIGH_SURROGATE_START: u32 = 0xD800;
pub const LOW_SURROGATE_START: u32 = 0xDC00;
pub const SURROGATE_END: u32 = 0xE000;

#[inline]
pub fn is_high_surrogate(unit: u32) -> bool {
    unit >= HIGH_SURROGATE_START && unit < LOW_SURROGATE_START
}

#[inline]
pub fn is_low_surrogate(unit: u32) -> bool {
    unit >= LOW_SURROGATE_START && unit < SURROGATE_END
}

#[inline]
pub fn combine_surrogates(high: u32, low: u32) -> u32 {
    0x10000 + ((high - HIGH_SURROGATE_START) << 10) + (low - LOW_SURROGATE_START)
}

/// push `codep` as one or two UTF-16 code units
#[inline]
pub fn push_utf16(out: &mut Vec<u16>, codep: u32) {
    if codep >= 0x10000 {
        let v = codep - 0x10000;
        out.push((HIGH_SURROGATE_START | (v >> 10)) as u16);
        out.push((LOW_SURROGATE_START | (v & 0x3FF)) as u16);
    } else {
        out.push(codep as u16);
    }
}

/// one shot: write + end, lossy conversion of unpaired surrogates
pub fn decode_to_string<D: TextDecoder + ?Sized>(decoder: &mut D, data: &[u8]) -> String {
    let mut units = decoder.write(data);
    units.extend(decoder.end());
    utf8::utf16_to_string(&units)
}

/// one shot: write + end
pub fn encode_str<E: TextEncoder + ?Sized>(encoder: &mut E, text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut out = encoder.write(&units);
    out.extend(encoder.end());
    out
}
