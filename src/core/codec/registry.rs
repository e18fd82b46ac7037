use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use regex::Regex;

use crate::core::codec::text::dbcs::{CodecError, DbcsCodec, DbcsDecoder, DbcsEncoder, Result};
use crate::core::config::CodecDefinition;

// alias chains longer than this are considered cyclic
const MAX_ALIAS_DEPTH: usize = 16;

enum Entry {
    Codec {
        definition: Arc<CodecDefinition>,
        // tables are built on first use
        codec: Arc<OnceCell<Arc<DbcsCodec>>>,
    },
    Alias(String),
}

lazy_static! {
    static ref REGISTRY: RwLock<HashMap<String, Entry>> = RwLock::new(HashMap::new());
    static ref YEAR_SUFFIX: Regex = Regex::new(r":\d{4}$").unwrap();
    static ref NON_ALNUM: Regex = Regex::new(r"[^0-9a-z]").unwrap();
}

/// "Shift_JIS" -> "shiftjis", "GB18030:2005" -> "gb18030"
pub fn canonical_name(name: &str) -> String {
    let name = name.to_lowercase();
    let name = YEAR_SUFFIX.replace(&name, "");
    NON_ALNUM.replace_all(&name, "").into_owned()
}

/// Registers a definition under its name and aliases, replacing any previous one.<br/>
/// An alias naming another registered codec is refused.
pub fn register(definition: CodecDefinition) -> Result<()> {
    let name = canonical_name(&definition.name);
    if name.is_empty() {
        return Err(CodecError::InvalidDefinition(format!(
            "invalid encoding name '{}'",
            definition.name
        )));
    }

    let aliases: Vec<String> = definition.aliases.iter().map(|a| canonical_name(a)).collect();

    let mut reg = REGISTRY.write();
    dbg_println!("registry: register '{}' aliases {:?}", name, aliases);

    // checked before any insert: a refused definition leaves the registry as is
    for alias in &aliases {
        if alias == &name {
            continue;
        }
        if let Some(Entry::Codec { .. }) = reg.get(alias) {
            return Err(CodecError::InvalidDefinition(format!(
                "alias '{}' of '{}' is already a codec name",
                alias, name
            )));
        }
    }

    for alias in aliases {
        if !alias.is_empty() && alias != name {
            reg.insert(alias, Entry::Alias(name.clone()));
        }
    }

    reg.insert(
        name,
        Entry::Codec {
            definition: Arc::new(definition),
            codec: Arc::new(OnceCell::new()),
        },
    );

    Ok(())
}

pub fn register_alias(alias: &str, target: &str) -> Result<()> {
    let alias = canonical_name(alias);
    let target = canonical_name(target);

    let mut reg = REGISTRY.write();

    if let Some(Entry::Codec { .. }) = reg.get(&alias) {
        return Err(CodecError::InvalidDefinition(format!(
            "'{}' is already a codec name",
            alias
        )));
    }

    // the target must resolve, and not through the alias itself
    let mut name = target.clone();
    for _ in 0..MAX_ALIAS_DEPTH {
        if name == alias {
            return Err(CodecError::InvalidDefinition(format!(
                "alias cycle: '{}' -> '{}'",
                alias, target
            )));
        }
        let next = match reg.get(&name) {
            Some(Entry::Alias(next)) => next.clone(),
            Some(Entry::Codec { .. }) => {
                dbg_println!("registry: alias '{}' -> '{}'", alias, target);
                reg.insert(alias, Entry::Alias(target));
                return Ok(());
            }
            None => return Err(CodecError::UnknownEncoding(target)),
        };
        name = next;
    }

    Err(CodecError::InvalidDefinition(format!(
        "alias chain too long: '{}'",
        target
    )))
}

fn resolve(name: &str) -> Result<(Arc<CodecDefinition>, Arc<OnceCell<Arc<DbcsCodec>>>)> {
    let reg = REGISTRY.read();

    let mut cur = canonical_name(name);
    for _ in 0..MAX_ALIAS_DEPTH {
        match reg.get(&cur) {
            Some(Entry::Alias(next)) => cur = next.clone(),
            Some(Entry::Codec { definition, codec }) => {
                return Ok((Arc::clone(definition), Arc::clone(codec)));
            }
            None => break,
        }
    }

    Err(CodecError::UnknownEncoding(name.to_owned()))
}

/// Returns the shared tables of `name`, building them on first request.
pub fn get_codec(name: &str) -> Result<Arc<DbcsCodec>> {
    // the lock is released before building: a build takes a while
    let (definition, cell) = resolve(name)?;

    let codec = cell.get_or_try_init(|| {
        let t0 = std::time::Instant::now();
        let codec = definition.build()?;
        dbg_println!(
            "registry: built '{}' in {} ms",
            definition.name,
            t0.elapsed().as_millis()
        );
        Ok::<_, CodecError>(Arc::new(codec))
    })?;

    Ok(Arc::clone(codec))
}

pub fn get_decoder(name: &str) -> Result<DbcsDecoder> {
    Ok(get_codec(name)?.decoder())
}

pub fn get_encoder(name: &str) -> Result<DbcsEncoder> {
    Ok(get_codec(name)?.encoder())
}

/// registered (canonical) names, aliases included
pub fn encodings() -> Vec<String> {
    let mut v: Vec<String> = REGISTRY.read().keys().cloned().collect();
    v.sort();
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::codec::text::dbcs::{Chunk, CodecOptions};
    use crate::core::codec::text::TextDecoder;

    // the registry is global: each test uses its own names
    fn definition(name: &str) -> CodecDefinition {
        CodecDefinition::new(
            name,
            vec![
                Chunk::new("0").literal("\u{0}").repeat(0x7f),
                Chunk::new("8140").literal("測試"),
            ],
            CodecOptions::default(),
        )
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("Shift_JIS"), "shiftjis");
        assert_eq!(canonical_name("GB18030:2005"), "gb18030");
        assert_eq!(canonical_name("EUC-KR"), "euckr");
        assert_eq!(canonical_name("cp936"), "cp936");
    }

    #[test]
    fn test_register_and_get() -> Result<()> {
        register(definition("Test-Reg-A").alias("reg_a_alias"))?;

        let c1 = get_codec("testrega")?;
        let c2 = get_codec("REG-A-ALIAS")?;
        assert!(Arc::ptr_eq(&c1, &c2));
        assert_eq!(c1.name(), "Test-Reg-A");

        assert_eq!(c1.decode(&[0x81, 0x40]), "測");
        assert_eq!(c2.encode("試"), vec![0x81, 0x41]);

        let names = encodings();
        assert!(names.contains(&"testrega".to_owned()));
        assert!(names.contains(&"regaalias".to_owned()));
        Ok(())
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            get_codec("no-such-encoding"),
            Err(CodecError::UnknownEncoding(_))
        ));
        assert!(register_alias("x-nope", "no-such-encoding").is_err());
    }

    #[test]
    fn test_alias_chain_and_cycle() -> Result<()> {
        register(definition("test-reg-b"))?;
        register_alias("reg-b-1", "test-reg-b")?;
        register_alias("reg-b-2", "reg-b-1")?;

        let mut d = get_decoder("reg_b_2")?;
        assert_eq!(d.write(b"A"), vec![0x41]);

        assert!(register_alias("reg-b-1", "reg-b-2").is_err());
        assert!(register_alias("test-reg-b", "reg-b-1").is_err());
        Ok(())
    }

    #[test]
    fn test_alias_cannot_replace_codec() -> Result<()> {
        register(definition("test-reg-c"))?;

        let res = register(definition("test-reg-d").alias("test-reg-c"));
        assert!(matches!(res, Err(CodecError::InvalidDefinition(_))));

        assert_eq!(get_codec("test-reg-c")?.name(), "test-reg-c");
        assert!(matches!(
            get_codec("test-reg-d"),
            Err(CodecError::UnknownEncoding(_))
        ));

        // its own name as an alias is not a conflict, nor is re-registering
        register(definition("test-reg-c").alias("TEST_REG_C").alias("reg-c-alias"))?;
        register(definition("test-reg-c").alias("reg-c-alias"))?;
        assert_eq!(get_codec("reg-c-alias")?.name(), "test-reg-c");
        Ok(())
    }

    #[test]
    fn test_build_error_is_reported() -> Result<()> {
        register(CodecDefinition::new(
            "test-reg-broken",
            vec![
                Chunk::new("8140").literal("a"),
                Chunk::new("8140").literal("b"),
            ],
            CodecOptions::default(),
        ))?;

        assert!(matches!(
            get_encoder("test-reg-broken"),
            Err(CodecError::DuplicateMapping { .. })
        ));
        Ok(())
    }
}
