// Command-line front end for bitwire.
//
// `encode` turns typed literals into wire bytes, `decode` reads typed values
// back out of a byte sequence, and `config` reports the build's wire
// constants and defaults.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use log::{LevelFilter, info};

use crate::buffer::{BitReader, BitWriter, WriterOptions};
use crate::error::Error;
use crate::io::{StreamReader, StreamWriter};
use crate::primitive::{PrimitiveRead, PrimitiveWrite};
use crate::wire::{BULK_COPY_THRESHOLD, EndianLayout, varint};

const DEFAULT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024usize),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1usize),
    };
    let num: usize = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    let size = num
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))?;
    if size == 0 {
        return Err("size must be at least 1 byte".into());
    }
    Ok(size)
}

// ---------------------------------------------------------------------------
// Hex helpers
// ---------------------------------------------------------------------------

fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let digits = digits
        .strip_prefix(b"0x".as_slice())
        .unwrap_or(digits.as_slice());
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in '{s}'"));
    }
    digits
        .chunks_exact(2)
        .map(|pair| {
            let hi = hex_digit(pair[0]);
            let lo = hex_digit(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
                _ => Err(format!("invalid hex digit in '{s}'")),
            }
        })
        .collect()
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn to_hex(bytes: &[u8]) -> String {
    use fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

// ---------------------------------------------------------------------------
// Typed values
// ---------------------------------------------------------------------------

/// Wire type selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    U8,
    I8,
    Bool,
    I16,
    U16,
    Char,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Str,
    Bytes,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::U8 => "u8",
            Kind::I8 => "i8",
            Kind::Bool => "bool",
            Kind::I16 => "i16",
            Kind::U16 => "u16",
            Kind::Char => "char",
            Kind::I32 => "i32",
            Kind::U32 => "u32",
            Kind::I64 => "i64",
            Kind::U64 => "u64",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Str => "str",
            Kind::Bytes => "bytes",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    U8(u8),
    I8(i8),
    Bool(bool),
    I16(i16),
    U16(u16),
    Char(char),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Bytes(v) => f.write_str(&to_hex(v)),
        }
    }
}

impl Value {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Value::U8(v) => (*v).into(),
            Value::I8(v) => (*v).into(),
            Value::Bool(v) => (*v).into(),
            Value::I16(v) => (*v).into(),
            Value::U16(v) => (*v).into(),
            Value::Char(v) => v.to_string().into(),
            Value::I32(v) => (*v).into(),
            Value::U32(v) => (*v).into(),
            Value::I64(v) => (*v).into(),
            Value::U64(v) => (*v).into(),
            Value::F32(v) => f64::from(*v).into(),
            Value::F64(v) => (*v).into(),
            Value::Str(v) => v.clone().into(),
            Value::Bytes(v) => to_hex(v).into(),
        }
    }
}

/// Parse a `type:literal` argument. Everything after the first `:` is the
/// literal, so strings may contain colons.
fn parse_value(arg: &str) -> Result<Value, String> {
    let (name, literal) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected TYPE:VALUE, got '{arg}'"))?;
    let kind = <Kind as ValueEnum>::from_str(name, true)
        .map_err(|_| format!("unknown type '{name}'"))?;
    let bad = |e: &dyn fmt::Display| format!("invalid {} literal '{literal}': {e}", kind.name());
    let value = match kind {
        Kind::U8 => Value::U8(literal.parse().map_err(|e| bad(&e))?),
        Kind::I8 => Value::I8(literal.parse().map_err(|e| bad(&e))?),
        Kind::Bool => Value::Bool(match literal {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => return Err(bad(&"expected true/false/1/0")),
        }),
        Kind::I16 => Value::I16(literal.parse().map_err(|e| bad(&e))?),
        Kind::U16 => Value::U16(literal.parse().map_err(|e| bad(&e))?),
        Kind::Char => {
            let mut chars = literal.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return Err(bad(&"expected exactly one character")),
            }
        }
        Kind::I32 => Value::I32(literal.parse().map_err(|e| bad(&e))?),
        Kind::U32 => Value::U32(literal.parse().map_err(|e| bad(&e))?),
        Kind::I64 => Value::I64(literal.parse().map_err(|e| bad(&e))?),
        Kind::U64 => Value::U64(literal.parse().map_err(|e| bad(&e))?),
        Kind::F32 => Value::F32(literal.parse().map_err(|e| bad(&e))?),
        Kind::F64 => Value::F64(literal.parse().map_err(|e| bad(&e))?),
        Kind::Str => Value::Str(literal.to_string()),
        Kind::Bytes => Value::Bytes(parse_hex(literal).map_err(|e| bad(&e))?),
    };
    Ok(value)
}

fn write_value<W: PrimitiveWrite>(w: &mut W, value: &Value) -> crate::Result<()> {
    match value {
        Value::U8(v) => w.write_u8(*v),
        Value::I8(v) => w.write_i8(*v),
        Value::Bool(v) => w.write_bool(*v),
        Value::I16(v) => w.write_i16(*v),
        Value::U16(v) => w.write_u16(*v),
        Value::Char(v) => w.write_char(*v),
        Value::I32(v) => w.write_i32(*v),
        Value::U32(v) => w.write_u32(*v),
        Value::I64(v) => w.write_i64(*v),
        Value::U64(v) => w.write_u64(*v),
        Value::F32(v) => w.write_f32(*v),
        Value::F64(v) => w.write_f64(*v),
        Value::Str(v) => w.write_str(v),
        Value::Bytes(v) => w.write_bytes(v),
    }
}

fn read_value<R: PrimitiveRead>(r: &mut R, kind: Kind) -> crate::Result<Value> {
    Ok(match kind {
        Kind::U8 => Value::U8(r.read_u8()?),
        Kind::I8 => Value::I8(r.read_i8()?),
        Kind::Bool => Value::Bool(r.read_bool()?),
        Kind::I16 => Value::I16(r.read_i16()?),
        Kind::U16 => Value::U16(r.read_u16()?),
        Kind::Char => Value::Char(r.read_char()?),
        Kind::I32 => Value::I32(r.read_i32()?),
        Kind::U32 => Value::U32(r.read_u32()?),
        Kind::I64 => Value::I64(r.read_i64()?),
        Kind::U64 => Value::U64(r.read_u64()?),
        Kind::F32 => Value::F32(r.read_f32()?),
        Kind::F64 => Value::F64(r.read_f64()?),
        Kind::Str => Value::Str(r.read_string()?),
        Kind::Bytes => Value::Bytes(r.read_bytes()?),
    })
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Bit-addressable binary encoder/decoder.
#[derive(Parser, Debug)]
#[command(
    name = "bitwire",
    version,
    about = "Bit-addressable binary encoder/decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (only errors are logged).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Machine-readable JSON output.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Encode typed values (TYPE:VALUE) into wire bytes.
    Encode(EncodeArgs),
    /// Decode values of the given types from wire bytes.
    Decode(DecodeArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Values to encode, in order (e.g. `u32:300`, `str:hi`, `bytes:beef`).
    #[arg(required = true, value_parser = parse_value)]
    values: Vec<Value>,

    /// Write raw bytes to this file instead of hex to stdout.
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Initial buffer capacity (supports K/M/G suffix).
    #[arg(long, value_parser = parse_byte_size, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Maximum buffer capacity (supports K/M/G suffix).
    #[arg(long = "max-capacity", value_parser = parse_byte_size)]
    max_capacity: Option<usize>,

    /// Encode through the streaming writer instead of a buffer.
    #[arg(long, conflicts_with_all = ["capacity", "max_capacity"])]
    stream: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Types to decode, in order.
    #[arg(required = true, value_enum)]
    types: Vec<Kind>,

    /// Input file (default: stdin).
    #[arg(long, short = 'i', value_hint = ValueHint::FilePath, conflicts_with = "hex")]
    input: Option<PathBuf>,

    /// Input bytes as hex.
    #[arg(long)]
    hex: Option<String>,

    /// Decode through the streaming reader instead of a buffer.
    #[arg(long)]
    stream: bool,
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("bitwire".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv)
        && let Cmd::Encode(args) = cli.command
    {
        let _ = encode_values(&args);
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config(json_output: bool) -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    let layout = EndianLayout::host();
    let endian = if layout.is_little_endian() {
        "little"
    } else {
        "big"
    };
    let defaults = WriterOptions::default();

    if json_output {
        let report = serde_json::json!({
            "version": version,
            "host_endian": endian,
            "varint32_literal_limit": varint::VARINT32_LITERAL_LIMIT,
            "varint64_literal_limit": varint::VARINT64_LITERAL_LIMIT,
            "max_varint32_len": varint::MAX_VARINT32_LEN,
            "max_varint64_len": varint::MAX_VARINT64_LEN,
            "bulk_copy_threshold": BULK_COPY_THRESHOLD,
            "default_initial_capacity": defaults.initial_capacity,
        });
        println!("{report}");
        return 0;
    }

    println!("bitwire version {version} (Rust)");
    println!("HOST_ENDIAN={endian}");
    println!("VARINT32_LITERAL_LIMIT={}", varint::VARINT32_LITERAL_LIMIT);
    println!("VARINT64_LITERAL_LIMIT={}", varint::VARINT64_LITERAL_LIMIT);
    println!("MAX_VARINT32_LEN={}", varint::MAX_VARINT32_LEN);
    println!("MAX_VARINT64_LEN={}", varint::MAX_VARINT64_LEN);
    println!("BULK_COPY_THRESHOLD={BULK_COPY_THRESHOLD}");
    println!("DEFAULT_INITIAL_CAPACITY={}", defaults.initial_capacity);
    println!(
        "DEFAULT_MAX_CAPACITY={}",
        defaults
            .max_capacity
            .map_or_else(|| "none".to_string(), |m| m.to_string())
    );
    0
}

// ---------------------------------------------------------------------------
// Encode command
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Encoded {
    bytes: Vec<u8>,
    bit_position: u8,
    grow_events: u64,
    capacity: Option<usize>,
}

fn encode_values(args: &EncodeArgs) -> Result<Encoded, (usize, Error)> {
    if args.stream {
        let mut w = StreamWriter::new(Vec::new());
        for (i, value) in args.values.iter().enumerate() {
            write_value(&mut w, value).map_err(|e| (i, e))?;
        }
        let bit_position = w.bit_position();
        let bytes = w.finish().map_err(|e| (args.values.len(), e))?;
        return Ok(Encoded {
            bytes,
            bit_position,
            grow_events: 0,
            capacity: None,
        });
    }

    let opts = WriterOptions {
        initial_capacity: args.capacity,
        max_capacity: args.max_capacity,
        ..WriterOptions::default()
    };
    let mut w = BitWriter::with_options(opts).map_err(|e| (0, e))?;
    w.set_on_grow(|e| {
        info!(
            "buffer grew {} -> {} bytes at position {}",
            e.old_capacity, e.new_capacity, e.position
        );
    });
    for (i, value) in args.values.iter().enumerate() {
        write_value(&mut w, value).map_err(|e| (i, e))?;
    }
    let bit_position = w.bit_position();
    let grow_events = w.grow_events();
    let capacity = Some(w.capacity());
    Ok(Encoded {
        bytes: w.into_vec(),
        bit_position,
        grow_events,
        capacity,
    })
}

fn cmd_encode(args: &EncodeArgs, force: bool, json_output: bool) -> i32 {
    let encoded = match encode_values(args) {
        Ok(e) => e,
        Err((index, e)) => {
            eprintln!("bitwire: encode value {}: {e}", index + 1);
            return 1;
        }
    };

    match &args.output {
        Some(path) => {
            if path.exists() && !force {
                eprintln!(
                    "bitwire: output file exists, use -f to overwrite: {}",
                    path.display()
                );
                return 1;
            }
            if let Err(e) = std::fs::write(path, &encoded.bytes) {
                eprintln!("bitwire: output file: {}: {e}", path.display());
                return 1;
            }
        }
        None => println!("{}", to_hex(&encoded.bytes)),
    }

    info!(
        "encoded {} value(s) into {} byte(s), trailing bit position {}",
        args.values.len(),
        encoded.bytes.len(),
        encoded.bit_position
    );

    if json_output {
        let stats = serde_json::json!({
            "values": args.values.len(),
            "bytes": encoded.bytes.len(),
            "bit_position": encoded.bit_position,
            "grow_events": encoded.grow_events,
            "capacity": encoded.capacity,
            "stream": args.stream,
        });
        eprintln!("{stats}");
    }

    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

fn decode_all<R: PrimitiveRead>(r: &mut R, kinds: &[Kind]) -> Result<Vec<Value>, (usize, Error)> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, &kind)| read_value(r, kind).map_err(|e| (i, e)))
        .collect()
}

fn decode_values(bytes: &[u8], kinds: &[Kind]) -> Result<Vec<Value>, (usize, Error)> {
    let mut r = BitReader::new(bytes).map_err(|e| (0, e))?;
    let values = decode_all(&mut r, kinds)?;
    info!(
        "decoded {} value(s), stopped at byte {} bit {}; {} byte(s) unread",
        values.len(),
        r.position(),
        r.bit_position(),
        r.remaining()
    );
    Ok(values)
}

fn load_input(args: &DecodeArgs) -> Result<Vec<u8>, String> {
    if let Some(hex) = &args.hex {
        return parse_hex(hex).map_err(|e| format!("hex input: {e}"));
    }
    match &args.input {
        Some(path) => {
            std::fs::read(path).map_err(|e| format!("input file: {}: {e}", path.display()))
        }
        None => {
            let mut data = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut data)
                .map_err(|e| format!("stdin: {e}"))?;
            Ok(data)
        }
    }
}

fn cmd_decode(args: &DecodeArgs, json_output: bool) -> i32 {
    let result = if args.stream
        && args.hex.is_none()
        && let Some(path) = &args.input
    {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("bitwire: input file: {}: {e}", path.display());
                return 1;
            }
        };
        let mut r = StreamReader::new(BufReader::new(file));
        decode_all(&mut r, &args.types)
    } else {
        let data = match load_input(args) {
            Ok(d) => d,
            Err(msg) => {
                eprintln!("bitwire: {msg}");
                return 1;
            }
        };
        if args.stream {
            let mut r = StreamReader::new(data.as_slice());
            decode_all(&mut r, &args.types)
        } else {
            decode_values(&data, &args.types)
        }
    };

    let values = match result {
        Ok(v) => v,
        Err((index, e)) => {
            eprintln!(
                "bitwire: decode value {} ({}): {e}",
                index + 1,
                args.types[index].name()
            );
            return 1;
        }
    };

    if json_output {
        let array: Vec<serde_json::Value> = values.iter().map(Value::to_json).collect();
        println!("{}", serde_json::Value::Array(array));
    } else {
        for value in &values {
            println!("{value}");
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_logging(quiet: bool, verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if quiet {
        builder.filter_level(LevelFilter::Error);
    } else if verbose == 1 {
        builder.filter_level(LevelFilter::Info);
    } else if verbose > 1 {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).format_target(false).init();
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let exit_code = match &cli.command {
        Cmd::Encode(args) => cmd_encode(args, cli.force, cli.json_output),
        Cmd::Decode(args) => cmd_decode(args, cli.json_output),
        Cmd::Config => cmd_config(cli.json_output),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
