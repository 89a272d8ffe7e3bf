// Criterion benchmarks for fte-codec.
//
// Run:
//   cargo bench -p fte-codec

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use fte_codec::{CipherKey, Dfa, Format, FormatCipher, FormatLibrary, RankCodec};
use num_bigint::BigUint;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn builtin_cipher(name: &str) -> FormatCipher {
    let library = FormatLibrary::builtin().expect("built-in formats");
    let spec = library.get(name).expect("format").clone();
    let format = Arc::new(Format::compile(spec).expect("compile"));
    FormatCipher::new(format, &CipherKey::from_bytes([3; 32]))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Regex to canonical DFA, including pruning and minimization.
fn bench_compile(c: &mut Criterion) {
    let library = FormatLibrary::builtin().expect("built-in formats");
    let spec = library.get("http-response").expect("format").clone();
    c.bench_function("compile_http_response", |b| {
        b.iter(|| Dfa::from_regex(black_box(&spec.regex), spec.max_length))
    });
}

/// Filling a capacity table from scratch up to 512.
fn bench_capacity(c: &mut Criterion) {
    let dfa = Arc::new(Dfa::from_regex("[a-zA-Z0-9]+", 512).expect("dfa"));
    c.bench_function("capacity_table_512", |b| {
        b.iter(|| {
            let codec = RankCodec::for_dfa(Arc::clone(&dfa));
            codec.table().capacity_for(black_box(512))
        })
    });
}

/// Rank and unrank at a fixed length on a warm table.
fn bench_rank(c: &mut Criterion) {
    let dfa = Arc::new(Dfa::from_regex("[a-zA-Z0-9]+", 256).expect("dfa"));
    let codec = RankCodec::for_dfa(dfa);
    let r = codec.table().capacity_for(256).expect("capacity") / BigUint::from(3u32);
    let word = codec.unrank(&r, 256).expect("unrank");

    c.bench_function("unrank_256", |b| b.iter(|| codec.unrank(black_box(&r), 256)));
    c.bench_function("rank_256", |b| b.iter(|| codec.rank(black_box(&word))));
}

/// Full pipeline on the built-in HTTP request format.
fn bench_pipeline(c: &mut Criterion) {
    let fc = builtin_cipher("http-request");
    let message = b"GET me a coffee, please";
    let formatted = fc.encode(message).expect("encode");

    c.bench_function("encode_http_request", |b| b.iter(|| fc.encode(black_box(message))));
    c.bench_function("decode_http_request", |b| b.iter(|| fc.decode(black_box(&formatted))));
}

criterion_group!(benches, bench_compile, bench_capacity, bench_rank, bench_pipeline);
criterion_main!(benches);
