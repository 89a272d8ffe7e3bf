// fte-decode: Recover a message from a formatted string.
//
// Reads the formatted string from stdin and writes the decrypted message to
// stdout. A single trailing newline is stripped unless the format's length
// bounds say it belongs to the string.
//
// Usage:
//   fte-decode [FORMAT OPTIONS] [-k HEX]
//
// Options:
//   -k, --key HEX          256-bit key as 64 hex digits (default: $FTE_KEY)
//   -h, --help             Print help

use std::io::{self, Read, Write};

fn main() {
    fte_cli::init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if fte_cli::wants_help(&args) {
        println!("fte-decode: Recover a message from a formatted string.");
        println!();
        println!("Usage: fte-decode [FORMAT OPTIONS] [-k HEX]");
        println!();
        println!("Options:");
        println!(
            "  -k, --key HEX          256-bit key as 64 hex digits (default: ${})",
            fte_cli::KEY_ENV
        );
        println!("  -h, --help             Print this help");
        println!();
        println!("{}", fte_cli::FORMAT_OPTIONS_HELP);
        return;
    }

    let (cipher, rest) = fte_cli::cipher_from_args(&args).unwrap_or_else(|e| fte_cli::fatal(&e));
    if let Some(extra) = rest.first() {
        fte_cli::fatal(&format!("unexpected argument {extra:?}"));
    }

    let mut input = Vec::new();
    if let Err(e) = io::stdin().lock().read_to_end(&mut input) {
        fte_cli::fatal(&format!("error reading stdin: {e}"));
    }

    // Shells and editors like to append a newline; drop it when the string
    // is not accepted with it.
    let mut formatted: &[u8] = &input;
    if formatted.ends_with(b"\n") && !cipher.format().dfa().accepts(formatted) {
        formatted = &formatted[..formatted.len() - 1];
    }

    let message = cipher
        .decode(formatted)
        .unwrap_or_else(|e| fte_cli::fatal(&e.to_string()));

    let mut out = io::stdout().lock();
    if let Err(e) = out.write_all(&message).and_then(|()| out.flush()) {
        fte_cli::fatal(&format!("error writing stdout: {e}"));
    }
}
