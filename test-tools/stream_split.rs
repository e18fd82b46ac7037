// The output of a streaming decoder/encoder must not depend on how the
// input is cut into write() calls.

extern crate dbcs;
extern crate rand;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dbcs::core::config::{CodecDefinition, SAMPLE_DEFINITION};
use dbcs::{DbcsCodec, TextDecoder, TextEncoder};

fn sample_codec() -> Arc<DbcsCodec> {
    let def = CodecDefinition::from_json(SAMPLE_DEFINITION).unwrap();
    Arc::new(def.build().unwrap())
}

fn sample_bytes() -> Vec<u8> {
    let mut v = b"Hi ".to_vec();
    v.extend_from_slice(&[0x81, 0x40, 0x81, 0x41]); // 測試
    v.push(0x80); // €
    v.extend_from_slice(&[0x81, 0x50]); // U+20000
    v.extend_from_slice(&[0x81, 0x60, 0x81, 0x62]); // sequences
    v.extend_from_slice(&[0x81, 0x30, 0x8A, 0x30]); // gb18030 U+00DA
    v.extend_from_slice(&[0x90, 0x30, 0x81, 0x31]); // gb18030 U+10001
    v.extend_from_slice(&[0xFF, 0x81, 0x21]); // invalid, then resync on '!'
    v.extend_from_slice(&[0xA1, 0xA1, 0xA1, 0xA5]);
    v.extend_from_slice(&[0x81, 0x30, 0x81]); // truncated at end of stream
    v
}

fn decode_split(codec: &Arc<DbcsCodec>, data: &[u8], cuts: &[usize]) -> Vec<u16> {
    let mut d = codec.decoder();
    let mut out = vec![];
    let mut prev = 0;
    for cut in cuts {
        out.extend(d.write(&data[prev..*cut]));
        prev = *cut;
    }
    out.extend(d.write(&data[prev..]));
    out.extend(d.end());
    out
}

fn encode_split(codec: &Arc<DbcsCodec>, units: &[u16], cuts: &[usize]) -> Vec<u8> {
    let mut e = codec.encoder();
    let mut out = vec![];
    let mut prev = 0;
    for cut in cuts {
        out.extend(e.write(&units[prev..*cut]));
        prev = *cut;
    }
    out.extend(e.write(&units[prev..]));
    out.extend(e.end());
    out
}

fn random_cuts(rng: &mut StdRng, len: usize) -> Vec<usize> {
    let mut cuts: Vec<usize> = (0..rng.gen_range(0..8)).map(|_| rng.gen_range(0..=len)).collect();
    cuts.sort_unstable();
    cuts
}

#[test]
fn decode_reference_output() {
    let codec = sample_codec();
    let units = decode_split(&codec, &sample_bytes(), &[]);
    let text = String::from_utf16(&units).unwrap();

    assert_eq!(
        text,
        concat!(
            "Hi 測試€\u{20000}\u{CA}\u{304}\u{EA}\u{304}\u{DA}\u{10001}",
            "\u{FFFD}\u{FFFD}!\u{3000}\u{3004}\u{FFFD}"
        )
    );
}

#[test]
fn decode_every_split_point() {
    let codec = sample_codec();
    let data = sample_bytes();
    let reference = decode_split(&codec, &data, &[]);

    for i in 0..=data.len() {
        assert_eq!(decode_split(&codec, &data, &[i]), reference, "split at {}", i);
    }

    for i in 0..=data.len() {
        for j in i..=data.len() {
            assert_eq!(
                decode_split(&codec, &data, &[i, j]),
                reference,
                "split at {} and {}",
                i,
                j
            );
        }
    }
}

#[test]
fn decode_byte_per_byte() {
    let codec = sample_codec();
    let data = sample_bytes();
    let cuts: Vec<usize> = (1..data.len()).collect();
    assert_eq!(decode_split(&codec, &data, &cuts), decode_split(&codec, &data, &[]));
}

#[test]
fn decode_gb18030_splits() {
    let codec = sample_codec();
    let data = [0x90, 0x30, 0x81, 0x31];

    // after byte 1 and after byte 3
    assert_eq!(decode_split(&codec, &data, &[1]), vec![0xD800, 0xDC01]);
    assert_eq!(decode_split(&codec, &data, &[3]), vec![0xD800, 0xDC01]);
    assert_eq!(decode_split(&codec, &data, &[1, 2, 3]), vec![0xD800, 0xDC01]);
}

#[test]
fn decode_random_splits() {
    let codec = sample_codec();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let len = rng.gen_range(0..64);
        let data: Vec<u8> = (0..len)
            .map(|_| match rng.gen_range(0..4) {
                0 => rng.gen_range(0x20..0x7f),
                1 => 0x81,
                2 => rng.gen_range(0x30..0x3a),
                _ => rng.gen(),
            })
            .collect();

        let reference = decode_split(&codec, &data, &[]);
        let cuts = random_cuts(&mut rng, data.len());
        assert_eq!(
            decode_split(&codec, &data, &cuts),
            reference,
            "data {:x?} cuts {:?}",
            data,
            cuts
        );
    }
}

fn sample_units() -> Vec<u16> {
    let mut units: Vec<u16> = "Hi 測試€abc abx ab ê\u{304}ê Ê\u{304} \u{20000}\u{1F600}Ú¥"
        .encode_utf16()
        .collect();
    units.push(0xD800); // lone lead surrogate
    units.push(0x41);
    units.push(0xDC00); // lone trail surrogate
    units.extend("ab".encode_utf16()); // pending run at end of stream
    units
}

#[test]
fn encode_reference_output() {
    let codec = sample_codec();
    let out = encode_split(&codec, &sample_units(), &[]);

    let mut expected = b"Hi ".to_vec();
    expected.extend_from_slice(&[0x81, 0x40, 0x81, 0x41, 0x80]);
    expected.extend_from_slice(&[0x81, 0x70, b' ', b'a', b'b', b'x', b' ', b'a', b'b', b' ']);
    expected.extend_from_slice(&[0x81, 0x62, 0x81, 0x61, b' ', 0x81, 0x60, b' ']);
    expected.extend_from_slice(&[0x81, 0x50]);
    expected.extend_from_slice(&[0x94, 0x39, 0xFC, 0x36]); // U+1F600
    expected.extend_from_slice(&[0x81, 0x30, 0x8A, 0x30]); // U+00DA
    expected.push(0x5C); // ¥
    expected.extend_from_slice(&[b'?', b'A', b'?', b'a', b'b']);

    assert_eq!(out, expected);
}

#[test]
fn encode_every_split_point() {
    let codec = sample_codec();
    let units = sample_units();
    let reference = encode_split(&codec, &units, &[]);

    for i in 0..=units.len() {
        assert_eq!(encode_split(&codec, &units, &[i]), reference, "split at {}", i);
    }

    let cuts: Vec<usize> = (1..units.len()).collect();
    assert_eq!(encode_split(&codec, &units, &cuts), reference);
}

#[test]
fn encode_random_splits() {
    let codec = sample_codec();
    let mut rng = StdRng::seed_from_u64(42);
    let alphabet: Vec<u16> = "abcdxÊê\u{304}測€ "
        .encode_utf16()
        .chain(vec![0xD83D, 0xDE00, 0xD800, 0xDC00])
        .collect();

    for _ in 0..200 {
        let len = rng.gen_range(0..48);
        let units: Vec<u16> = (0..len)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect();

        let reference = encode_split(&codec, &units, &[]);
        let cuts = random_cuts(&mut rng, units.len());
        assert_eq!(
            encode_split(&codec, &units, &cuts),
            reference,
            "units {:x?} cuts {:?}",
            units,
            cuts
        );
    }
}
