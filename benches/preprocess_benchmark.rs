//! Benchmarks for newsprep preprocessing performance.
//!
//! Run with: cargo bench
//!
//! Rows are synthesized from a fixed seed so runs are comparable.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use newsprep::observer::NullObserver;
use newsprep::{Capabilities, CsvLoader, PreprocessOptions, RawCell, Tokenizer};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const KOREAN_WORDS: &[&str] = &[
    "정부가", "내년도", "예산안을", "발표했다", "국회는", "심사를", "시작했다", "경제",
    "성장률이", "둔화됐다", "수출이", "증가했다", "기업들은", "투자를", "늘렸다",
];

const ENGLISH_WORDS: &[&str] = &[
    "the", "central", "bank", "raised", "interest", "rates", "markets", "reacted",
    "investors", "expected", "growth", "inflation", "policies", "officials", "said",
];

/// Creates `count` synthetic news rows, roughly a third of them English.
fn create_rows(count: usize) -> Vec<RawCell> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|i| {
            if i % 17 == 0 {
                return RawCell::Missing;
            }
            let words = if rng.gen_bool(0.33) {
                ENGLISH_WORDS
            } else {
                KOREAN_WORDS
            };
            let len = rng.gen_range(4..24);
            let mut text: Vec<&str> = (0..len)
                .filter_map(|_| words.choose(&mut rng).copied())
                .collect();
            if i % 5 == 0 {
                text.push("https://news.example.com/article");
            }
            RawCell::Text(text.join(" "))
        })
        .collect()
}

/// Benchmark text cleaning.
fn bench_clean_text(c: &mut Criterion) {
    let rows = create_rows(200);
    let texts: Vec<String> = rows
        .iter()
        .filter_map(|row| row.coerce().and_then(|text| text.ok()))
        .collect();

    c.bench_function("clean_text_200_rows", |b| {
        b.iter(|| {
            for text in &texts {
                black_box(newsprep::clean_text(black_box(text)));
            }
        });
    });
}

/// Benchmark tokenization with and without statistical language detection.
fn bench_tokenize(c: &mut Criterion) {
    let rows = create_rows(200);
    let mut group = c.benchmark_group("tokenize");

    let builtin = Tokenizer::new(Capabilities::builtin());
    let heuristic = Tokenizer::new(Capabilities::builtin().without_language_identifier());

    group.bench_function("builtin", |b| {
        b.iter(|| {
            for row in &rows {
                black_box(builtin.tokenize_and_normalize(black_box(row)));
            }
        });
    });
    group.bench_function("hangul_ratio_only", |b| {
        b.iter(|| {
            for row in &rows {
                black_box(heuristic.tokenize_and_normalize(black_box(row)));
            }
        });
    });

    group.finish();
}

/// Benchmark the row pipeline at various sizes.
fn bench_process_cells(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_cells");

    for row_count in [100, 1000, 5000].iter() {
        let rows = create_rows(*row_count);
        group.throughput(Throughput::Elements(*row_count as u64));

        let sequential = CsvLoader::with_options(PreprocessOptions::default());
        let parallel = CsvLoader::with_options(PreprocessOptions::default().parallel());

        group.bench_with_input(BenchmarkId::new("sequential", row_count), &rows, |b, rows| {
            b.iter(|| sequential.process_cells(black_box(rows), &mut NullObserver));
        });
        group.bench_with_input(BenchmarkId::new("parallel", row_count), &rows, |b, rows| {
            b.iter(|| parallel.process_cells(black_box(rows), &mut NullObserver));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_clean_text, bench_tokenize, bench_process_cells);
criterion_main!(benches);
