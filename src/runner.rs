use std::path::Path;

use crate::compile::Compiler;
use crate::discover;
use crate::display::{self, Tag};
use crate::errors::BenchError;
use crate::types::{BenchmarkDir, BenchmarkResult, SuiteTally};

/// Name of the executable built inside each benchmark directory.
pub const SUITE_EXE_NAME: &str = "test";

/// Outcome of timing a single benchmark directory.
#[derive(Debug)]
pub enum Outcome {
    Done(BenchmarkResult),
    Skipped(BenchError),
    Failed(BenchError),
}

/// Compile and time one benchmark directory. The executable is removed before
/// this returns, whatever the outcome.
pub fn run_benchmark(compiler: &Compiler, bench: &BenchmarkDir) -> Outcome {
    let guard = match compiler.compile(&bench.name, &bench.dir, &bench.sources, SUITE_EXE_NAME) {
        Ok(g) => g,
        Err(e @ BenchError::CompileFailed { .. }) => return Outcome::Skipped(e),
        Err(e) => return Outcome::Failed(e),
    };

    match guard.run_timed(&bench.name) {
        Ok(elapsed) => Outcome::Done(BenchmarkResult {
            name: bench.name.clone(),
            execution_time: elapsed.as_secs_f64(),
        }),
        Err(e) => Outcome::Failed(e),
    }
}

/// Discover, compile and time every benchmark under `root`, sequentially.
///
/// Compile failures and runtime failures are reported on stdout and excluded;
/// only a missing root aborts. Results come back in discovery order.
pub fn run_all_benchmarks(
    compiler: &Compiler,
    root: &Path,
) -> Result<(Vec<BenchmarkResult>, SuiteTally), BenchError> {
    let benchmarks = discover::discover_benchmarks(root)?;

    println!("-- Scanning {} --", root.display());
    println!();

    let mut results = Vec::new();
    let mut tally = SuiteTally::default();

    for bench in &benchmarks {
        match run_benchmark(compiler, bench) {
            Outcome::Done(result) => {
                println!("{}", display::format_done(&result.name, result.execution_time));
                tally.completed += 1;
                results.push(result);
            }
            Outcome::Skipped(err) => {
                tracing::debug!(benchmark = %bench.name, %err, "compile failed");
                let msg = format!("compilation failed for {}", bench.name);
                println!("{}", display::format_status(Tag::Skip, &msg));
                tally.skipped += 1;
            }
            Outcome::Failed(err @ BenchError::RunFailed { .. }) => {
                tracing::debug!(benchmark = %bench.name, %err, "run failed");
                println!("{}", display::format_status(Tag::RuntimeError, &bench.name));
                tally.failed += 1;
            }
            Outcome::Failed(err) => {
                let msg = format!("{}: {}", bench.name, err);
                println!("{}", display::format_status(Tag::Error, &msg));
                tally.failed += 1;
            }
        }
    }

    Ok((results, tally))
}

/// Sort results fastest first.
pub fn sort_by_time(results: &mut [BenchmarkResult]) {
    results.sort_by(|a, b| a.execution_time.total_cmp(&b.execution_time));
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::compile::fake;
    use std::fs;

    fn write_bench(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, body) in files {
            fs::write(dir.join(file), body).unwrap();
        }
    }

    #[test]
    fn compile_failure_does_not_stop_later_benchmarks() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let root = tmp.path().join("bench");
        write_bench(&root, "a_broken", &[("main.c", "BROKEN")]);
        write_bench(&root, "b_ok", &[("main.c", "int main(){}"), ("util.c", "")]);
        write_bench(&root, "c_ok", &[("main.c", "int main(){}")]);

        let cc = fake::compiler(tmp.path());
        let (results, tally) = run_all_benchmarks(&cc, &root).unwrap();

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b_ok", "c_ok"]);
        assert_eq!(tally, SuiteTally { completed: 2, skipped: 1, failed: 0 });
        assert!(results.iter().all(|r| r.execution_time > 0.0));
    }

    #[test]
    fn runtime_failure_excluded_and_executable_cleaned_up() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let root = tmp.path().join("bench");
        write_bench(&root, "crashes", &[("main.c", "CRASH")]);
        write_bench(&root, "works", &[("main.c", "")]);

        let cc = fake::compiler(tmp.path());
        let (results, tally) = run_all_benchmarks(&cc, &root).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "works");
        assert_eq!(tally.failed, 1);
        assert!(!root.join("crashes").join(SUITE_EXE_NAME).exists());
        assert!(!root.join("works").join(SUITE_EXE_NAME).exists());
    }

    #[test]
    fn directories_without_sources_produce_no_results() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let root = tmp.path().join("bench");
        write_bench(&root, "docs", &[("README", "nothing to build")]);

        let cc = fake::compiler(tmp.path());
        let (results, tally) = run_all_benchmarks(&cc, &root).unwrap();
        assert!(results.is_empty());
        assert_eq!(tally, SuiteTally::default());
    }

    #[test]
    fn missing_root_aborts() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let cc = fake::compiler(tmp.path());
        let err = run_all_benchmarks(&cc, &tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, BenchError::RootNotFound { .. }));
    }

    #[test]
    fn missing_compiler_counts_as_failure_not_skip() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let root = tmp.path().join("bench");
        write_bench(&root, "a", &[("main.c", "")]);

        let cc = Compiler::new("no-such-cc-7c1e");
        match run_benchmark(&cc, &discover::discover_benchmarks(&root).unwrap()[0]) {
            Outcome::Failed(BenchError::CompilerUnavailable { .. }) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn sort_by_time_is_ascending() {
        let mut results = vec![
            BenchmarkResult { name: "b".into(), execution_time: 2.0 },
            BenchmarkResult { name: "a".into(), execution_time: 0.5 },
            BenchmarkResult { name: "c".into(), execution_time: 1.0 },
        ];
        sort_by_time(&mut results);
        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);
    }
}
