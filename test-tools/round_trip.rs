extern crate dbcs;
extern crate rand;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dbcs::core::codec::registry;
use dbcs::core::codec::text::dbcs::gb18030::ordinal_to_bytes;
use dbcs::core::config::{CodecDefinition, SAMPLE_DEFINITION};
use dbcs::{DbcsCodec, TextDecoder};

fn sample_codec() -> Arc<DbcsCodec> {
    let def = CodecDefinition::from_json(SAMPLE_DEFINITION).unwrap();
    Arc::new(def.build().unwrap())
}

#[test]
fn round_trip_one_and_two_bytes() {
    let codec = sample_codec();
    let mut nr_checked = 0;

    let mut inputs: Vec<Vec<u8>> = (0..=0xFFu8).map(|b| vec![b]).collect();
    for lead in 0x80..=0xFFu8 {
        for trail in 0..=0xFFu8 {
            inputs.push(vec![lead, trail]);
        }
    }

    for bytes in inputs {
        let text = codec.decode(&bytes);
        if text.contains('\u{FFFD}') {
            continue;
        }

        // 0xa2a4 is decode only
        if bytes == [0xA2, 0xA4] {
            assert_eq!(text, "\u{2173}");
            assert_ne!(codec.encode(&text), bytes);
            continue;
        }

        assert_eq!(codec.encode(&text), bytes, "{:x?} -> {:?}", bytes, text);
        nr_checked += 1;
    }

    assert!(nr_checked > 0x80);
}

#[test]
fn round_trip_known_strings() {
    let codec = sample_codec();

    assert_eq!(codec.decode(&[0x81, 0x40, 0x81, 0x41]), "測試");
    assert_eq!(codec.encode("測試"), vec![0x81, 0x40, 0x81, 0x41]);

    let text = "中文 abc abd €\u{20001} ⅰⅱⅲ 、。";
    assert_eq!(codec.decode(&codec.encode(text)), text);
}

#[test]
fn round_trip_gb18030_ordinals() {
    let codec = sample_codec();

    let mut ordinal = 0;
    while ordinal < 65408 {
        let bytes = ordinal_to_bytes(ordinal).unwrap();
        let text = codec.decode(&bytes);
        let c = text.chars().next().unwrap();

        if c == '\u{FFFD}' {
            // surrogate block, the trailing bytes are resynced
            assert!((0xD800 - 0x80..0xE000 - 0x80).contains(&ordinal));
        } else {
            assert_eq!(text.chars().count(), 1);
            assert_eq!(c as u32, 0x80 + ordinal);
            if codec.encode_table().get(c as u32).is_none() {
                assert_eq!(codec.encode(&text), bytes.to_vec(), "ordinal {}", ordinal);
            }
        }

        ordinal += 7;
    }

    for codep in &[0x10000u32, 0x1F600, 0x10FFFF] {
        let c = std::char::from_u32(*codep).unwrap();
        let s = c.to_string();
        let bytes = codec.encode(&s);
        assert_eq!(bytes.len(), 4);
        assert_eq!(codec.decode(&bytes), s);
    }
}

#[test]
fn forward_progress_on_invalid_input() {
    let codec = sample_codec();

    // 0xff is never a valid byte
    let data = vec![0xFFu8; 1000];
    let text = codec.decode(&data);
    assert_eq!(text.chars().count(), 1000);
    assert!(text.chars().all(|c| c == '\u{FFFD}'));

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let data: Vec<u8> = (0..256).map(|_| rng.gen_range(0x80..=0xFF)).collect();
        let mut d = codec.decoder();
        let mut units = d.write(&data);
        units.extend(d.end());

        // at least one output unit per 4 bytes, at most one replacement per byte
        assert!(units.len() >= data.len() / 4);
        assert!(units.iter().filter(|u| **u == 0xFFFD).count() <= data.len());
    }
}

#[test]
fn registry_lookup_by_alias() {
    registry::register(CodecDefinition::from_json(SAMPLE_DEFINITION).unwrap()).unwrap();

    let a = registry::get_codec("Sample-DBCS").unwrap();
    let b = registry::get_codec("x_sample_dbcs").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.encode("測"), vec![0x81, 0x40]);

    let mut d = registry::get_decoder("sample").unwrap();
    assert_eq!(d.write(&[0x81, 0x41]), "試".encode_utf16().collect::<Vec<u16>>());
}
