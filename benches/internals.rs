use std::fs;
use std::hint::black_box;
use std::path::PathBuf;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use cbench::discover;
use cbench::display;
use cbench::stats;
use cbench::types::BenchmarkResult;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Deterministic pseudo-random timings around 10 ms, so runs are comparable.
fn synthetic_times(n: usize) -> Vec<f64> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            0.010 + (state % 1_000) as f64 * 1e-6
        })
        .collect()
}

/// Create a tree of `size` benchmark directories, each with two C sources.
/// Reuses the tree if it already exists.
fn setup_bench_tree(size: usize) -> PathBuf {
    let root = std::env::temp_dir().join(format!("cbench_criterion_{}", size));
    let marker = root.join(".bench_ready");
    if marker.exists() {
        return root;
    }

    let _ = fs::remove_dir_all(&root);
    for i in 0..size {
        let dir = root.join(format!("group-{}", i % 8)).join(format!("bench-{:04}", i));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.c"), "int main(void) { return 0; }\n").unwrap();
        fs::write(dir.join("util.c"), "int util(void) { return 1; }\n").unwrap();
        fs::write(dir.join("README"), "notes\n").unwrap();
    }
    fs::write(&marker, "").unwrap();
    root
}

// ---------------------------------------------------------------------------
// Benchmarks: stats
// ---------------------------------------------------------------------------

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    for &n in &[100, 1_000, 10_000] {
        let times = synthetic_times(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &times, |b, t| {
            b.iter(|| stats::summarize(black_box(t)).unwrap());
        });
    }
    group.finish();
}

fn bench_ecdf_dkw(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecdf_dkw");
    for &n in &[100, 1_000, 10_000] {
        let times = synthetic_times(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &times, |b, t| {
            b.iter(|| stats::ecdf_dkw(black_box(t), 0.05).unwrap());
        });
    }
    group.finish();
}

fn bench_histogram(c: &mut Criterion) {
    let times = synthetic_times(1_000);
    c.bench_function("histogram_1000_40", |b| {
        b.iter(|| stats::histogram(black_box(&times), 40).unwrap());
    });
}

// ---------------------------------------------------------------------------
// Benchmarks: discover
// ---------------------------------------------------------------------------

fn bench_discover(c: &mut Criterion) {
    let mut group = c.benchmark_group("discover");
    for &size in &[10, 100, 500] {
        let root = setup_bench_tree(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &root, |b, r| {
            b.iter(|| discover::discover_benchmarks(r).unwrap());
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmarks: display
// ---------------------------------------------------------------------------

fn bench_display(c: &mut Criterion) {
    let results: Vec<BenchmarkResult> = synthetic_times(50)
        .into_iter()
        .enumerate()
        .map(|(i, t)| BenchmarkResult {
            name: format!("bench-{:02}", i),
            execution_time: t,
        })
        .collect();
    let times = synthetic_times(1_000);
    let summary = stats::summarize(&times).unwrap();
    let band = stats::ecdf_dkw(&times, 0.05).unwrap();

    let mut group = c.benchmark_group("display");
    group.bench_function("format_results_50", |b| {
        b.iter(|| display::format_results(black_box(&results)));
    });
    group.bench_function("format_summary", |b| {
        b.iter(|| display::format_summary("Random Input", &summary, &band));
    });
    group.bench_function("format_summary_json", |b| {
        b.iter(|| display::format_summary_json("Random Input", &summary, &band).unwrap());
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion groups
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_summarize,
    bench_ecdf_dkw,
    bench_histogram,
    bench_discover,
    bench_display,
);
criterion_main!(benches);
