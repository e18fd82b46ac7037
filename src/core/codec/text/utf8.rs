use std::char;

use utf8parse::Receiver;

// collects the parsed code points as UTF-16 units
struct Utf16Sink {
    out: Vec<u16>,
    nr_events: usize,
    nr_invalid: usize,
}

impl Receiver for Utf16Sink {
    fn codepoint(&mut self, c: char) {
        let mut buf = [0u16; 2];
        self.out.extend_from_slice(c.encode_utf16(&mut buf));
        self.nr_events += 1;
    }

    fn invalid_sequence(&mut self) {
        self.out.push(char::REPLACEMENT_CHARACTER as u16);
        self.nr_events += 1;
        self.nr_invalid += 1;
    }
}

/// Streaming UTF-8 reader producing UTF-16 code units (the encoders input).<br/>
/// Invalid sequences become U+FFFD.
pub struct Utf8Reader {
    parser: utf8parse::Parser,
    sink: Utf16Sink,
    in_sequence: bool,
}

impl Default for Utf8Reader {
    fn default() -> Self {
        Utf8Reader::new()
    }
}

impl Utf8Reader {
    pub fn new() -> Self {
        Utf8Reader {
            parser: utf8parse::Parser::new(),
            sink: Utf16Sink {
                out: vec![],
                nr_events: 0,
                nr_invalid: 0,
            },
            in_sequence: false,
        }
    }

    pub fn write(&mut self, data: &[u8]) -> Vec<u16> {
        self.sink.out.reserve(data.len());
        for &b in data {
            let nr_invalid = self.sink.nr_invalid;
            let mut nr_events = self.sink.nr_events;
            self.parser.advance(&mut self.sink, b);

            // the parser drops the byte that broke a sequence: it may start a new one
            if self.in_sequence && nr_invalid != self.sink.nr_invalid {
                nr_events = self.sink.nr_events;
                self.parser.advance(&mut self.sink, b);
            }

            self.in_sequence = nr_events == self.sink.nr_events;
        }
        std::mem::take(&mut self.sink.out)
    }

    /// a truncated trailing sequence is reported as one U+FFFD
    pub fn end(&mut self) -> Vec<u16> {
        let mut out = std::mem::take(&mut self.sink.out);
        if self.in_sequence {
            out.push(char::REPLACEMENT_CHARACTER as u16);
            self.parser = utf8parse::Parser::new();
            self.in_sequence = false;
        }
        out
    }
}

/// UTF-16 units to UTF-8, unpaired surrogates become U+FFFD
pub fn utf16_to_string(units: &[u16]) -> String {
    char::decode_utf16(units.iter().cloned())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_reader() {
        let text = "aé測𝄞";
        let expected: Vec<u16> = text.encode_utf16().collect();

        let mut r = Utf8Reader::new();
        assert_eq!(r.write(text.as_bytes()), expected);
        assert!(r.end().is_empty());

        // one byte at a time
        let mut r = Utf8Reader::new();
        let mut out = vec![];
        for b in text.as_bytes() {
            out.extend(r.write(&[*b]));
        }
        out.extend(r.end());
        assert_eq!(out, expected);
    }

    #[test]
    fn test_utf8_reader_truncated() {
        let mut r = Utf8Reader::new();
        assert_eq!(r.write(&[b'a', 0xE6, 0xB8]), vec![0x61]);
        assert_eq!(r.end(), vec![0xFFFD]);
    }

    #[test]
    fn test_utf8_reader_broken_sequence() {
        let mut r = Utf8Reader::new();
        let mut out = r.write(&[0xE6, b'a', b'b']);
        out.extend(r.end());
        assert_eq!(out, vec![0xFFFD, 0x61, 0x62]);

        // the breaking byte is split from the lead byte
        let mut r = Utf8Reader::new();
        let mut out = r.write(&[0xE6, 0xB8]);
        out.extend(r.write(b"a"));
        out.extend(r.end());
        assert_eq!(out, vec![0xFFFD, 0x61]);

        // a new lead byte breaks the sequence and starts the next one
        let mut r = Utf8Reader::new();
        let mut out = r.write(&[0xE6, 0xC3]);
        out.extend(r.write(&[0xA9]));
        out.extend(r.end());
        assert_eq!(out, vec![0xFFFD, 0xE9]);

        // invalid bytes outside a sequence are not fed twice
        let mut r = Utf8Reader::new();
        let mut out = r.write(&[0xFF, b'a', 0x80]);
        out.extend(r.end());
        assert_eq!(out, vec![0xFFFD, 0x61, 0xFFFD]);
    }

    #[test]
    fn test_utf16_to_string() {
        assert_eq!(utf16_to_string(&[0x41, 0xD834, 0xDD1E]), "A𝄞");
        assert_eq!(utf16_to_string(&[0xDC00, 0x41]), "\u{FFFD}A");
    }
}
