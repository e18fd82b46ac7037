// std
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};

// ext
#[macro_use]
extern crate clap;
extern crate dbcs;

use clap::{arg, Arg, ArgAction, Command};

// crate
use dbcs::core;
use dbcs::core::codec::registry;
use dbcs::core::codec::text::utf8::{utf16_to_string, Utf8Reader};
use dbcs::core::config::{self, CodecDefinition, Config, Mode, SAMPLE_DEFINITION};
use dbcs::core::VERSION;
use dbcs::{CodecError, Result, TextDecoder, TextEncoder};

use dbcs::dbg_println;
use dbcs::trace_block;

/// Program entry point
/// It parses the command line to build the configuration,
/// registers the codec definitions then converts the input files (or stdin)
/// to stdout.
fn main() {
    let config = parse_command_line();

    if let Err(e) = run(&config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    let mut definitions = vec![CodecDefinition::from_json(SAMPLE_DEFINITION)?];
    for path in &config.definitions {
        definitions.push(CodecDefinition::from_file(path)?);
    }

    // the last registered definition is the default encoding
    let mut default_encoding = String::new();
    for mut def in definitions {
        def.apply_vars(&config.vars)?;
        default_encoding = def.name.clone();
        registry::register(def)?;
    }

    if config.list_encodings {
        for name in registry::encodings() {
            println!("{}", name);
        }
        return Ok(());
    }

    let encoding = config.encoding.as_ref().unwrap_or(&default_encoding);
    dbg_println!("encoding = {}, mode = {:?}", encoding, config.mode);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if config.files_list.is_empty() {
        let stdin = io::stdin();
        convert(config, encoding, &mut stdin.lock(), &mut out)?;
    } else {
        for path in &config.files_list {
            let mut f = File::open(path).map_err(|e| {
                CodecError::Io(io::Error::new(e.kind(), format!("{}: {}", path, e)))
            })?;
            convert(config, encoding, &mut f, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn convert(
    config: &Config,
    encoding: &str,
    input: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<()> {
    let mut buf = vec![0u8; config.chunk_size];

    trace_block!(format!("{:?} {}", config.mode, encoding), {
        match config.mode {
            Mode::Decode => {
                let mut decoder = registry::get_decoder(encoding)?;
                loop {
                    let n = input.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    let units = decoder.write(&buf[..n]);
                    out.write_all(utf16_to_string(&units).as_bytes())?;
                }
                let units = decoder.end();
                out.write_all(utf16_to_string(&units).as_bytes())?;
            }

            Mode::Encode => {
                let mut encoder = registry::get_encoder(encoding)?;
                let mut reader = Utf8Reader::new();
                loop {
                    let n = input.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    let units = reader.write(&buf[..n]);
                    out.write_all(&encoder.write(&units))?;
                }
                let units = reader.end();
                out.write_all(&encoder.write(&units))?;
                out.write_all(&encoder.end())?;
            }
        }
    });

    Ok(())
}

/// Parse command and an return a Config
fn parse_command_line() -> Config {
    let matches = Command::new("dbcs")
        .version(VERSION)
        .author("Carl-Erwin Griffith <carl.erwin@gmail.com>")
        .about("table driven multi-byte text converter")
        .arg(
            Arg::new("DECODE")
                .short('d')
                .long("decode")
                .action(ArgAction::SetTrue)
                .conflicts_with("ENCODE")
                .help("bytes in the selected encoding -> UTF-8 (default)"),
        )
        .arg(
            Arg::new("ENCODE")
                .short('e')
                .long("encode")
                .action(ArgAction::SetTrue)
                .help("UTF-8 -> bytes in the selected encoding"),
        )
        .arg(
            Arg::new("DEFINITION")
                .value_name("FILE")
                .long("definition")
                .action(ArgAction::Append)
                .help("json codec definition to register"),
        )
        .arg(
            Arg::new("ENCODING")
                .value_name("NAME")
                .long("encoding")
                .action(ArgAction::Set)
                .help("encoding name or alias (default: last registered definition)"),
        )
        .arg(
            Arg::new("CHUNK_SIZE")
                .value_name("BYTES")
                .long("chunk-size")
                .action(ArgAction::Set)
                .value_parser(value_parser!(usize))
                .help("read size"),
        )
        .arg(
            Arg::new("LIST")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("list the registered encodings and quit"),
        )
        .arg(
            Arg::new("DEBUG")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("enable debug logs (see --log-file)"),
        )
        .arg(
            Arg::new("LOG_FILENAME")
                .value_name("LOG_FILENAME")
                .long("log-file")
                .action(ArgAction::Set)
                .help("debug log file name (default stderr)"),
        )
        .arg(
            Arg::new("CONFIG_VAR")
                .value_name("CONFIG_VAR")
                .short('c')
                .long("cfg-var")
                .action(ArgAction::Append)
                .help("configuration variables: replacement_char=C, encode_replacement_char=C"),
        )
        .arg(arg!(<FILES> ... "files to convert (default stdin)").required(false))
        .get_matches();

    // must be set before the first log record
    if let Some(log_filename) = matches.get_one::<String>("LOG_FILENAME") {
        core::LOG_FILENAME.get_or_init(|| log_filename.clone());
    }

    if *matches.get_one::<bool>("DEBUG").unwrap_or(&false) {
        core::enable_dbg_println();
    }

    let mode = if *matches.get_one::<bool>("ENCODE").unwrap_or(&false) {
        Mode::Encode
    } else {
        Mode::Decode
    };

    let files_list = matches
        .get_many::<String>("FILES")
        .map_or(vec![], |v| v.map(|e| e.clone()).collect());

    let definitions = matches
        .get_many::<String>("DEFINITION")
        .map_or(vec![], |v| v.map(|e| e.clone()).collect());

    let encoding = matches.get_one::<String>("ENCODING").cloned();

    let chunk_size = matches
        .get_one::<usize>("CHUNK_SIZE")
        .map_or(config::DEFAULT_CHUNK_SIZE, |v| (*v).max(1));

    let list_encodings = *matches.get_one::<bool>("LIST").unwrap_or(&false);

    // configuration variables
    let vars = match matches.get_many::<String>("CONFIG_VAR") {
        Some(s) => match config::parse_vars(s) {
            Ok(vars) => vars,
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        },
        None => Default::default(),
    };

    // debug
    dbg_println!("config vars  = \n{:?}", vars);
    dbg_println!("files_list   = \n{:?}", files_list);
    dbg_println!("definitions  = \n{:?}", definitions);

    Config {
        files_list,
        mode,
        definitions,
        encoding,
        chunk_size,
        list_encodings,
        vars,
    }
}
