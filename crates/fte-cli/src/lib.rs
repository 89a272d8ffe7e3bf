// fte-cli: shared utilities for CLI tools.

use std::process;
use std::sync::Arc;

use fte_codec::{CipherKey, Format, FormatCipher, FormatLibrary, FormatSpec};

/// Environment variable holding the hex-encoded key when `--key` is absent.
pub const KEY_ENV: &str = "FTE_KEY";

/// Format used when no format option is given.
pub const DEFAULT_FORMAT: &str = "alphanumeric";

/// Format-related options shared by every tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatArgs {
    /// `--format NAME`
    pub name: Option<String>,
    /// `--formats FILE`: a JSON library to look `name` up in.
    pub library: Option<String>,
    /// `--regex PATTERN`, overriding any named format.
    pub regex: Option<String>,
    /// `--min-len N`
    pub min_len: Option<String>,
    /// `--max-len N`
    pub max_len: Option<String>,
}

/// Split `--format`, `--formats`, `--regex`, `--min-len` and `--max-len`
/// (and their `=VALUE` forms) out of `args`.
///
/// Returns `(format_args, remaining_args)`.
pub fn parse_format_args(args: &[String]) -> Result<(FormatArgs, Vec<String>), String> {
    let (name, args) = take_option(args, "--format", Some("-f"))?;
    let (library, args) = take_option(&args, "--formats", None)?;
    let (regex, args) = take_option(&args, "--regex", Some("-r"))?;
    let (min_len, args) = take_option(&args, "--min-len", None)?;
    let (max_len, args) = take_option(&args, "--max-len", None)?;
    let parsed = FormatArgs {
        name,
        library,
        regex,
        min_len,
        max_len,
    };
    Ok((parsed, args))
}

/// Parse a `--key=HEX` or `-k HEX` argument from command line args.
///
/// Returns `(key, remaining_args)`.
pub fn parse_key_arg(args: &[String]) -> Result<(Option<String>, Vec<String>), String> {
    take_option(args, "--key", Some("-k"))
}

/// Remove one valued option from `args`, accepting `--long=VALUE`,
/// `--long VALUE` and `-s VALUE`. The last occurrence wins.
pub fn take_option(
    args: &[String],
    long: &str,
    short: Option<&str>,
) -> Result<(Option<String>, Vec<String>), String> {
    let mut value = None;
    let mut remaining = Vec::new();
    let mut iter = args.iter();
    let prefix = format!("{long}=");

    while let Some(arg) = iter.next() {
        if let Some(val) = arg.strip_prefix(&prefix) {
            value = Some(val.to_string());
        } else if arg == long || Some(arg.as_str()) == short {
            match iter.next() {
                Some(val) => value = Some(val.clone()),
                None => return Err(format!("{arg} requires a value")),
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    Ok((value, remaining))
}

/// Resolve format options to a validated [`FormatSpec`].
///
/// `--regex` builds an ad hoc format; otherwise `--format` (default
/// `alphanumeric`) is looked up in `--formats FILE` or the built-in library.
/// `--min-len`/`--max-len` override the bounds of either.
pub fn resolve_format(args: &FormatArgs) -> Result<FormatSpec, String> {
    let mut spec = match &args.regex {
        Some(regex) => FormatSpec {
            regex: regex.clone(),
            min_length: 1,
            max_length: 0,
        },
        None => {
            let library = match &args.library {
                Some(path) => {
                    let json = std::fs::read_to_string(path)
                        .map_err(|e| format!("failed to read {path}: {e}"))?;
                    FormatLibrary::from_json(&json).map_err(|e| format!("{path}: {e}"))?
                }
                None => FormatLibrary::builtin().map_err(|e| e.to_string())?,
            };
            let name = args.name.as_deref().unwrap_or(DEFAULT_FORMAT);
            library.get(name).map_err(|e| e.to_string())?.clone()
        }
    };

    if let Some(min) = &args.min_len {
        spec.min_length = parse_length("--min-len", min)?;
    }
    if let Some(max) = &args.max_len {
        spec.max_length = parse_length("--max-len", max)?;
    }
    if args.regex.is_some() && args.max_len.is_none() {
        return Err("--regex requires --max-len".to_string());
    }
    spec.validate().map_err(|e| e.to_string())?;
    Ok(spec)
}

fn parse_length(option: &str, value: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("{option} expects a non-negative integer, got {value:?}"))
}

/// Compile a format spec, reporting errors as strings.
pub fn compile_format(spec: FormatSpec) -> Result<Arc<Format>, String> {
    Format::compile(spec)
        .map(Arc::new)
        .map_err(|e| format!("failed to compile format: {e}"))
}

/// Decode a hex key from `key_arg` or, failing that, the `FTE_KEY`
/// environment variable.
pub fn resolve_key(key_arg: Option<&str>) -> Result<CipherKey, String> {
    let hex_key = match key_arg {
        Some(k) => k.to_string(),
        None => std::env::var(KEY_ENV)
            .map_err(|_| format!("no key given: pass --key HEX or set {KEY_ENV}"))?,
    };
    parse_key(&hex_key)
}

/// Parse a 64-digit hex key.
pub fn parse_key(hex_key: &str) -> Result<CipherKey, String> {
    let bytes = hex::decode(hex_key.trim()).map_err(|e| format!("invalid hex key: {e}"))?;
    CipherKey::from_slice(&bytes).map_err(|e| e.to_string())
}

/// Everything `fte-encode` and `fte-decode` need: format and key options
/// resolved into a ready cipher.
///
/// Returns `(cipher, remaining_args)`.
pub fn cipher_from_args(args: &[String]) -> Result<(FormatCipher, Vec<String>), String> {
    let (format_args, args) = parse_format_args(args)?;
    let (key_arg, args) = parse_key_arg(&args)?;
    let spec = resolve_format(&format_args)?;
    tracing::debug!(
        regex = %spec.regex,
        min = spec.min_length,
        max = spec.max_length,
        "resolved format"
    );
    let key = resolve_key(key_arg.as_deref())?;
    let format = compile_format(spec)?;
    Ok((FormatCipher::new(format, &key), args))
}

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

/// Help text for the options every tool accepts.
pub const FORMAT_OPTIONS_HELP: &str = "\
Format options:
  -f, --format NAME      Named format (default: alphanumeric)
      --formats FILE     JSON format library to look NAME up in
  -r, --regex PATTERN    Ad hoc format pattern (requires --max-len)
      --min-len N        Shortest output length
      --max-len N        Longest output length";

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn take_option_forms() {
        let (v, rest) =
            take_option(&args(&["a", "--key", "ff", "b"]), "--key", Some("-k")).unwrap();
        assert_eq!(v.as_deref(), Some("ff"));
        assert_eq!(rest, args(&["a", "b"]));

        let (v, _) = take_option(&args(&["--key=00"]), "--key", Some("-k")).unwrap();
        assert_eq!(v.as_deref(), Some("00"));

        let (v, _) = take_option(&args(&["-k", "11", "-k", "22"]), "--key", Some("-k")).unwrap();
        assert_eq!(v.as_deref(), Some("22"));

        assert!(take_option(&args(&["--key"]), "--key", None).is_err());
    }

    #[test]
    fn format_by_name() {
        let (fa, rest) = parse_format_args(&args(&["--format", "http-request", "x"])).unwrap();
        assert_eq!(rest, args(&["x"]));
        let spec = resolve_format(&fa).unwrap();
        assert_eq!(spec.min_length, 32);
    }

    #[test]
    fn default_format() {
        let spec = resolve_format(&FormatArgs::default()).unwrap();
        assert_eq!(spec.regex, "^[a-zA-Z0-9]+$");
    }

    #[test]
    fn ad_hoc_regex() {
        let (fa, _) =
            parse_format_args(&args(&["--regex", "[a-z]+", "--min-len=4", "--max-len", "64"]))
                .unwrap();
        let spec = resolve_format(&fa).unwrap();
        assert_eq!(spec, FormatSpec::new("[a-z]+", 4, 64).unwrap());

        let (fa, _) = parse_format_args(&args(&["--regex", "[a-z]+"])).unwrap();
        assert!(resolve_format(&fa).is_err());
    }

    #[test]
    fn bound_overrides_are_validated() {
        let (fa, _) = parse_format_args(&args(&["--min-len", "600"])).unwrap();
        assert!(resolve_format(&fa).is_err());
        let (fa, _) = parse_format_args(&args(&["--max-len", "lots"])).unwrap();
        assert!(resolve_format(&fa).is_err());
    }

    #[test]
    fn unknown_format_name() {
        let (fa, _) = parse_format_args(&args(&["-f", "smtp"])).unwrap();
        assert!(resolve_format(&fa).unwrap_err().contains("smtp"));
    }

    #[test]
    fn key_parsing() {
        let hex_key = "00".repeat(32);
        assert!(parse_key(&hex_key).is_ok());
        assert!(parse_key(&format!(" {hex_key}\n")).is_ok());
        assert!(parse_key("abcd").is_err());
        assert!(parse_key(&"zz".repeat(32)).is_err());
        assert!(resolve_key(Some(&hex_key)).is_ok());
    }
}
