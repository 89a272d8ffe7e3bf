// fte-capacity: Inspect a format's automaton and capacity.
//
// Prints the canonical DFA's size, then for each admissible output length
// the number of accepted strings (in bits) and the ciphertext bytes a string
// of that length carries.
//
// Usage:
//   fte-capacity [FORMAT OPTIONS] [--every N] [--list]
//
// Options:
//   --every N     Print every Nth length only (default: 1)
//   --list        List the available named formats and exit
//   -h, --help    Print help

use std::io::{self, Write};

use fte_codec::cipher::{NONCE_SIZE, TAG_SIZE};

fn main() {
    fte_cli::init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if fte_cli::wants_help(&args) {
        println!("fte-capacity: Inspect a format's automaton and capacity.");
        println!();
        println!("Usage: fte-capacity [FORMAT OPTIONS] [--every N] [--list]");
        println!();
        println!("Options:");
        println!("      --every N          Print every Nth length only (default: 1)");
        println!("      --list             List the available named formats and exit");
        println!("  -h, --help             Print this help");
        println!();
        println!("{}", fte_cli::FORMAT_OPTIONS_HELP);
        return;
    }

    let (format_args, args) =
        fte_cli::parse_format_args(&args).unwrap_or_else(|e| fte_cli::fatal(&e));
    let (every, args) =
        fte_cli::take_option(&args, "--every", None).unwrap_or_else(|e| fte_cli::fatal(&e));
    let every: usize = match every.as_deref().map(str::parse::<usize>) {
        None => 1,
        Some(Ok(n)) if n > 0 => n,
        Some(_) => fte_cli::fatal("--every expects a positive integer"),
    };

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if args.iter().any(|a| a == "--list") {
        let library = match &format_args.library {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {path}: {e}"))
                .and_then(|json| {
                    fte_codec::FormatLibrary::from_json(&json).map_err(|e| e.to_string())
                }),
            None => fte_codec::FormatLibrary::builtin().map_err(|e| e.to_string()),
        }
        .unwrap_or_else(|e| fte_cli::fatal(&e));
        for name in library.names() {
            if let Ok(spec) = library.get(name) {
                let _ = writeln!(
                    out,
                    "{name}\t{}..={}\t{}",
                    spec.min_length, spec.max_length, spec.regex
                );
            }
        }
        let _ = out.flush();
        return;
    }
    if let Some(extra) = args.first() {
        fte_cli::fatal(&format!("unexpected argument {extra:?}"));
    }

    let spec = fte_cli::resolve_format(&format_args).unwrap_or_else(|e| fte_cli::fatal(&e));
    let format = fte_cli::compile_format(spec).unwrap_or_else(|e| fte_cli::fatal(&e));
    let dfa = format.dfa();

    let _ = writeln!(out, "regex:     {}", format.spec().regex);
    let _ = writeln!(out, "states:    {}", dfa.state_count());
    let _ = writeln!(out, "alphabet:  {} symbols", dfa.alphabet().len());
    let _ = writeln!(
        out,
        "lengths:   {}..={}",
        format.spec().min_length,
        format.spec().max_length
    );
    match format.max_payload(NONCE_SIZE + TAG_SIZE) {
        Ok(max) => {
            let _ = writeln!(out, "max message: {max} bytes");
        }
        Err(e) => fte_cli::fatal(&e.to_string()),
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{:>8}  {:>10}  {:>8}", "length", "log2(cap)", "bytes");

    let spec = format.spec();
    for length in (spec.min_length..=spec.max_length).step_by(every) {
        let capacity = format
            .table()
            .capacity_for(length)
            .unwrap_or_else(|e| fte_cli::fatal(&e.to_string()));
        let width = format
            .bucket_width(length)
            .unwrap_or_else(|e| fte_cli::fatal(&e.to_string()));
        if capacity.bits() == 0 {
            let _ = writeln!(out, "{length:>8}  {:>10}  {width:>8}", "-");
        } else {
            let bits = capacity.bits() - 1;
            let _ = writeln!(out, "{length:>8}  {bits:>10}  {width:>8}");
        }
    }
    let _ = out.flush();
}
