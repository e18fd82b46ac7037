use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::core::codec::text::dbcs::{
    Chunk, CodecError, CodecOptions, DbcsCodec, Gb18030Ranges, Result,
};

/// The command line configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub files_list: Vec<String>,
    pub mode: Mode,
    /// codec definition files to register
    pub definitions: Vec<String>,
    pub encoding: Option<String>,
    pub chunk_size: usize,
    pub list_encodings: bool,
    pub vars: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Decode,
    Encode,
}

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// builtin demo encoding, always registered by the command line tool
pub static SAMPLE_DEFINITION: &str = std::include_str!("../../res/sample-dbcs.json");

impl Default for Config {
    fn default() -> Self {
        Config {
            files_list: vec![],
            mode: Mode::Decode,
            definitions: vec![],
            encoding: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            list_encodings: false,
            vars: HashMap::new(),
        }
    }
}

/// A named encoding: the mapping chunks plus the build options.
#[derive(Debug, Clone)]
pub struct CodecDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub chunks: Vec<Chunk>,
    pub options: CodecOptions,
}

impl CodecDefinition {
    pub fn new(name: &str, chunks: Vec<Chunk>, options: CodecOptions) -> Self {
        CodecDefinition {
            name: name.to_owned(),
            aliases: vec![],
            chunks,
            options,
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_owned());
        self
    }

    pub fn build(&self) -> Result<DbcsCodec> {
        DbcsCodec::build(&self.name, &self.chunks, self.options.clone())
    }

    /// `-c key=value` overrides of the build options
    pub fn apply_vars(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        for (k, v) in vars {
            match k.as_str() {
                "replacement_char" => self.options.replacement_char = parse_char(k, v)?,
                "encode_replacement_char" => {
                    self.options.encode_replacement_char = parse_char(k, v)?
                }
                _ => {
                    dbg_println!("{}: ignoring configuration variable '{}'", self.name, k);
                }
            }
        }
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CodecDefinition> {
        let json = fs::read_to_string(path.as_ref())?;
        dbg_println!("loading codec definition {:?}", path.as_ref());
        CodecDefinition::from_json(&json)
    }

    // {
    //   "name": "...", "aliases": [...], "table": [["8140", "..", 3], ...],
    //   "gb18030": { "ordinals": [...], "code_points": [...] },
    //   "exclude_from_encode": [...], "encode_skip": [n, {"from": n, "to": n}],
    //   "encode_add": { "c": n }, "replacement_char": "c", "encode_replacement_char": "c"
    // }
    pub fn from_json(json: &str) -> Result<CodecDefinition> {
        let json: Value = serde_json::from_str(json)?;

        let map = if let Value::Object(ref map) = json {
            map
        } else {
            return Err(invalid("top level value must be an object"));
        };

        let mut name = None;
        let mut aliases = vec![];
        let mut chunks = None;
        let mut options = CodecOptions::default();

        for (k, v) in map {
            match k.as_str() {
                "name" => name = Some(parse_string(k, v)?),
                "aliases" => {
                    for a in parse_array(k, v)? {
                        aliases.push(parse_string(k, a)?);
                    }
                }
                "table" => {
                    let mut vec = vec![];
                    for c in parse_array(k, v)? {
                        vec.push(Chunk::from_json(c)?);
                    }
                    chunks = Some(vec);
                }
                "gb18030" => options.gb18030 = Some(parse_gb18030(v)?),
                "exclude_from_encode" => {
                    for cp in parse_array(k, v)? {
                        options.exclude_from_encode.insert(parse_u32(k, cp)?);
                    }
                }
                "encode_skip" => {
                    for e in parse_array(k, v)? {
                        options.encode_skip.push(parse_skip_range(e)?);
                    }
                }
                "encode_add" => {
                    let add = if let Value::Object(ref add) = v {
                        add
                    } else {
                        return Err(invalid("encode_add must be an object"));
                    };
                    for (c, value) in add {
                        options
                            .encode_add
                            .push((parse_char(k, c)? as u32, parse_u32(k, value)?));
                    }
                }
                "replacement_char" => {
                    options.replacement_char = parse_char(k, &parse_string(k, v)?)?;
                }
                "encode_replacement_char" => {
                    options.encode_replacement_char = parse_char(k, &parse_string(k, v)?)?;
                }
                _ => {
                    dbg_println!("codec definition: ignoring key '{}'", k);
                }
            }
        }

        let name = name.ok_or_else(|| invalid("missing 'name'"))?;
        let chunks = chunks.ok_or_else(|| invalid("missing 'table'"))?;

        Ok(CodecDefinition {
            name,
            aliases,
            chunks,
            options,
        })
    }
}

fn invalid(msg: &str) -> CodecError {
    CodecError::InvalidDefinition(msg.to_owned())
}

fn parse_string(key: &str, v: &Value) -> Result<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        _ => Err(invalid(&format!("'{}': expected a string, found {}", key, v))),
    }
}

fn parse_array<'a>(key: &str, v: &'a Value) -> Result<&'a Vec<Value>> {
    match v {
        Value::Array(vec) => Ok(vec),
        _ => Err(invalid(&format!("'{}': expected an array, found {}", key, v))),
    }
}

fn parse_u32(key: &str, v: &Value) -> Result<u32> {
    match v.as_u64() {
        Some(n) if n <= u32::MAX as u64 => Ok(n as u32),
        _ => Err(invalid(&format!("'{}': expected a u32, found {}", key, v))),
    }
}

fn parse_char(key: &str, s: &str) -> Result<char> {
    let mut it = s.chars();
    match (it.next(), it.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(invalid(&format!(
            "'{}': expected a single character, found '{}'",
            key, s
        ))),
    }
}

fn parse_skip_range(v: &Value) -> Result<(u32, u32)> {
    if let Value::Object(ref map) = v {
        let from = map.get("from").ok_or_else(|| invalid("encode_skip: missing 'from'"))?;
        let to = map.get("to").ok_or_else(|| invalid("encode_skip: missing 'to'"))?;
        return Ok((parse_u32("from", from)?, parse_u32("to", to)?));
    }

    let n = parse_u32("encode_skip", v)?;
    Ok((n, n))
}

fn parse_gb18030(v: &Value) -> Result<Gb18030Ranges> {
    let map = if let Value::Object(ref map) = v {
        map
    } else {
        return Err(invalid("gb18030 must be an object"));
    };

    let read = |key: &str| -> Result<Vec<u32>> {
        let vec = map
            .get(key)
            .ok_or_else(|| invalid(&format!("gb18030: missing '{}'", key)))?;
        parse_array(key, vec)?
            .iter()
            .map(|n| parse_u32(key, n))
            .collect()
    };

    let ordinals = read("ordinals")?;
    let code_points = read("code_points")?;

    Gb18030Ranges::new(ordinals, code_points)
}

/// `key=value` command line variables
pub fn parse_vars<'a, I: Iterator<Item = &'a String>>(
    it: I,
) -> std::result::Result<HashMap<String, String>, String> {
    let mut vars = HashMap::new();
    for x in it {
        let split: Vec<_> = x.splitn(2, '=').collect();
        if split.len() != 2 || split[0].is_empty() {
            return Err(format!("invalid configuration variable: {}", x));
        }
        vars.insert(split[0].to_owned(), split[1].to_owned());
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_sample_definition() -> Result<()> {
        let def = CodecDefinition::from_json(SAMPLE_DEFINITION)?;
        assert_eq!(def.name, "sample-dbcs");
        assert!(def.aliases.contains(&"sample".to_owned()));
        assert!(def.options.gb18030.is_some());
        assert!(!def.chunks.is_empty());

        let codec = def.build()?;
        assert_eq!(codec.name(), "sample-dbcs");
        Ok(())
    }

    #[test]
    fn test_definition_options() -> Result<()> {
        let def = CodecDefinition::from_json(
            r#"{
                "name": "x",
                "table": [["0", "\u0000", 127], ["8140", "AB"]],
                "exclude_from_encode": [66],
                "encode_skip": [33088, {"from": 1, "to": 2}],
                "encode_add": { "¥": 92 },
                "replacement_char": "?",
                "encode_replacement_char": "~",
                "comment": "ignored"
            }"#,
        )?;

        assert!(def.options.exclude_from_encode.contains(&66));
        assert_eq!(def.options.encode_skip, vec![(33088, 33088), (1, 2)]);
        assert_eq!(def.options.encode_add, vec![(0xA5, 92)]);
        assert_eq!(def.options.replacement_char, '?');
        assert_eq!(def.options.encode_replacement_char, '~');
        Ok(())
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(CodecDefinition::from_json("[]").is_err());
        assert!(CodecDefinition::from_json(r#"{"table": []}"#).is_err());
        assert!(CodecDefinition::from_json(r#"{"name": "x"}"#).is_err());
        assert!(CodecDefinition::from_json(
            r#"{"name": "x", "table": [], "replacement_char": "ab"}"#
        )
        .is_err());
        assert!(CodecDefinition::from_json(
            r#"{"name": "x", "table": [], "gb18030": {"ordinals": [0]}}"#
        )
        .is_err());
        assert!(matches!(
            CodecDefinition::from_json("{"),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn test_apply_vars() -> Result<()> {
        let mut def = CodecDefinition::from_json(SAMPLE_DEFINITION)?;
        let mut vars = HashMap::new();
        vars.insert("encode_replacement_char".to_owned(), "!".to_owned());
        vars.insert("unknown".to_owned(), "1".to_owned());
        def.apply_vars(&vars)?;
        assert_eq!(def.options.encode_replacement_char, '!');

        vars.insert("replacement_char".to_owned(), "".to_owned());
        assert!(def.apply_vars(&vars).is_err());
        Ok(())
    }

    #[test]
    fn test_parse_vars() {
        let v = vec!["a=b".to_owned(), "c=d=e".to_owned()];
        let vars = parse_vars(v.iter()).unwrap();
        assert_eq!(vars.get("a").map(|s| s.as_str()), Some("b"));
        assert_eq!(vars.get("c").map(|s| s.as_str()), Some("d=e"));

        let v = vec!["nope".to_owned()];
        assert!(parse_vars(v.iter()).is_err());
    }
}
