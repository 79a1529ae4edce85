//! Benchmarks for modulus feature extraction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use keytable::config::FeatureConfig;
use keytable::features::FeatureExtractor;

/// A fixed 2048-bit modulus hex string (top bit set).
fn modulus_2048() -> String {
    let mut hex = String::with_capacity(512);
    hex.push('F');
    for i in 0u32..511 {
        hex.push(char::from_digit((i * 7 + 3) % 16, 16).unwrap());
    }
    hex.to_uppercase()
}

fn bench_extract(c: &mut Criterion) {
    let modulus = modulus_2048();

    let default = FeatureExtractor::new(FeatureConfig::default());
    c.bench_function("extract_2048_default", |b| {
        b.iter(|| default.extract(black_box(&modulus)).unwrap())
    });

    let wide = FeatureExtractor::new(FeatureConfig {
        msb: 16,
        lsb: 8,
        divisors: vec![3, 5, 7, 11, 13, 17, 19],
        passthrough: false,
    });
    c.bench_function("extract_2048_wide", |b| {
        b.iter(|| wide.extract(black_box(&modulus)).unwrap())
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
