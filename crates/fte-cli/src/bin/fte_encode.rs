// fte-encode: Encrypt stdin into a string of a format.
//
// Reads the whole message from stdin, encrypts it and writes the formatted
// string to stdout with no trailing newline.
//
// Usage:
//   fte-encode [FORMAT OPTIONS] [-k HEX]
//   fte-encode --generate-key
//
// Options:
//   -k, --key HEX          256-bit key as 64 hex digits (default: $FTE_KEY)
//       --generate-key     Print a fresh random key and exit
//   -h, --help             Print help

use std::io::{self, Read, Write};

use fte_codec::CipherKey;

fn main() {
    fte_cli::init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if fte_cli::wants_help(&args) {
        println!("fte-encode: Encrypt stdin into a string of a format.");
        println!();
        println!("Usage: fte-encode [FORMAT OPTIONS] [-k HEX]");
        println!("       fte-encode --generate-key");
        println!();
        println!("Options:");
        println!(
            "  -k, --key HEX          256-bit key as 64 hex digits (default: ${})",
            fte_cli::KEY_ENV
        );
        println!("      --generate-key     Print a fresh random key and exit");
        println!("  -h, --help             Print this help");
        println!();
        println!("{}", fte_cli::FORMAT_OPTIONS_HELP);
        return;
    }

    if args.iter().any(|a| a == "--generate-key") {
        println!("{}", hex::encode(CipherKey::generate().as_bytes()));
        return;
    }

    let (cipher, rest) = fte_cli::cipher_from_args(&args).unwrap_or_else(|e| fte_cli::fatal(&e));
    if let Some(extra) = rest.first() {
        fte_cli::fatal(&format!("unexpected argument {extra:?}"));
    }

    let mut message = Vec::new();
    if let Err(e) = io::stdin().lock().read_to_end(&mut message) {
        fte_cli::fatal(&format!("error reading stdin: {e}"));
    }

    let formatted = cipher
        .encode(&message)
        .unwrap_or_else(|e| fte_cli::fatal(&e.to_string()));

    let mut out = io::stdout().lock();
    if let Err(e) = out.write_all(&formatted).and_then(|()| out.flush()) {
        fte_cli::fatal(&format!("error writing stdout: {e}"));
    }
}
