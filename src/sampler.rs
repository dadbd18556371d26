use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::compile::{Compiler, ExecutableGuard};
use crate::config::{ProgramSpec, REPORT_FILE, SamplerConfig};
use crate::display;
use crate::errors::BenchError;
use crate::plot::{self, PreparedSeries};
use crate::store::{self, ProgramReport, SamplerReport};
use crate::types::SampleSeries;

/// Runs between progress lines.
pub const PROGRESS_EVERY: usize = 100;

/// Compile one program in `source_dir`. The guard removes the binary on drop.
pub fn compile_program(
    compiler: &Compiler,
    source_dir: &Path,
    program: &ProgramSpec,
) -> Result<ExecutableGuard, BenchError> {
    let source = program.source.to_string_lossy().into_owned();
    println!("Compiling {} -> {} ...", source, program.executable);
    let guard = compiler.compile(&program.label, source_dir, &[source], &program.executable)?;
    println!("  Compilation successful");
    Ok(guard)
}

/// Run `exe` `runs` times back to back and collect one wall-clock time per run.
///
/// The first failed run aborts the series.
pub fn sample(exe: &ExecutableGuard, label: &str, runs: usize) -> Result<SampleSeries, BenchError> {
    println!("Running '{}' for {} iterations...", label, runs);
    let mut series = SampleSeries::with_capacity(label, runs);
    for i in 1..=runs {
        let elapsed = exe
            .run_timed(label)
            .map_err(|e| {
                let detail = match e {
                    BenchError::RunFailed { detail, .. } => detail,
                    other => other.to_string(),
                };
                BenchError::RunFailed {
                    name: label.to_string(),
                    detail: format!("run {}: {}", i, detail),
                }
            })?;
        series.push(elapsed.as_secs_f64());
        tracing::trace!(run = i, seconds = elapsed.as_secs_f64(), "sample");
        if i % PROGRESS_EVERY == 0 {
            println!("  Completed {} runs", i);
        }
    }
    println!();
    Ok(series)
}

/// Where the sampler writes its files.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
}

impl OutputPaths {
    pub fn resolve(&self, file: &Path) -> PathBuf {
        self.out_dir.join(file)
    }
}

/// The series collected for one program.
#[derive(Debug)]
pub struct Sampled {
    pub program: ProgramSpec,
    pub series: SampleSeries,
}

/// Compile every program, then sample each one in turn.
///
/// All programs are compiled before any is run; any compile failure aborts
/// with no series collected. Each binary is removed once its run-set ends.
pub fn collect(compiler: &Compiler, config: &SamplerConfig) -> Result<Vec<Sampled>, BenchError> {
    let mut built = Vec::with_capacity(config.programs.len());
    for program in &config.programs {
        let guard = compile_program(compiler, &config.source_dir, program)?;
        built.push((program, guard));
    }
    println!();

    let mut sampled = Vec::with_capacity(built.len());
    for (program, guard) in built {
        let series = sample(&guard, &program.label, config.runs)?;
        drop(guard);
        sampled.push(Sampled {
            program: program.clone(),
            series,
        });
    }
    Ok(sampled)
}

/// Full sampler workflow: collect, persist CSVs, print statistics, render
/// charts and write the JSON summary.
pub fn run(
    compiler: &Compiler,
    config: &SamplerConfig,
    paths: &OutputPaths,
) -> Result<SamplerReport, BenchError> {
    let sampled = collect(compiler, config)?;

    let mut prepared = Vec::with_capacity(sampled.len());
    for s in &sampled {
        store::write_series(&paths.resolve(&s.program.csv), &s.series)?;
        let p = PreparedSeries::new(&s.series, s.program.color, config.alpha)?;
        print!("{}", display::format_summary(s.series.label(), &p.summary, &p.band));
        prepared.push(p);
    }

    println!();
    println!("Saving plots...");
    let mut programs = Vec::with_capacity(prepared.len());
    for (s, p) in sampled.iter().zip(&prepared) {
        let plot_path = paths.resolve(&s.program.plot);
        plot::render_series(p, &plot_path)?;
        println!("  Saved -> {}", plot_path.display());
        programs.push(ProgramReport {
            label: s.program.label.clone(),
            csv: s.program.csv.display().to_string(),
            plot: s.program.plot.display().to_string(),
            summary: p.summary.clone(),
            epsilon: p.band.epsilon,
        });
    }

    let combined = paths.resolve(&config.combined_plot);
    plot::render_combined(&prepared, &combined)?;
    println!("  Saved -> {}", combined.display());

    let report = SamplerReport {
        generated_at: Utc::now(),
        runs: config.runs,
        alpha: config.alpha,
        programs,
    };
    store::write_report(&paths.resolve(Path::new(REPORT_FILE)), &report)?;
    Ok(report)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::compile::{SAMPLER_FLAGS, fake};
    use crate::types::Rgb;
    use std::fs;

    fn program(label: &str, stem: &str, color: Rgb) -> ProgramSpec {
        ProgramSpec {
            label: label.to_string(),
            source: PathBuf::from(format!("{stem}.c")),
            executable: format!("{stem}_exec"),
            color,
            csv: PathBuf::from(format!("{stem}.csv")),
            plot: PathBuf::from(format!("{stem}.svg")),
        }
    }

    fn setup(sources: &[(&str, &str)], runs: usize) -> (assert_fs::TempDir, Compiler, SamplerConfig) {
        let tmp = assert_fs::TempDir::new().unwrap();
        let src = tmp.path().join("programs");
        fs::create_dir_all(&src).unwrap();
        for (stem, body) in sources {
            fs::write(src.join(format!("{stem}.c")), body).unwrap();
        }
        let cc = fake::compiler(tmp.path()).flags(SAMPLER_FLAGS.iter().copied());
        let config = SamplerConfig {
            runs,
            source_dir: src,
            combined_plot: PathBuf::from("combined.svg"),
            programs: vec![
                program("Random Input", "random", Rgb::STEELBLUE),
                program("Partially Ordered Input", "partial", Rgb::DARKORANGE),
            ],
            ..SamplerConfig::default()
        };
        (tmp, cc, config)
    }

    #[test]
    fn collects_fixed_number_of_runs_per_program() {
        let (tmp, cc, config) = setup(&[("random", ""), ("partial", "")], 7);
        let sampled = collect(&cc, &config).unwrap();

        assert_eq!(sampled.len(), 2);
        assert_eq!(sampled[0].series.label(), "Random Input");
        assert_eq!(sampled[1].series.label(), "Partially Ordered Input");
        assert!(sampled.iter().all(|s| s.series.len() == 7));
        assert!(sampled.iter().all(|s| s.series.times().iter().all(|&t| t > 0.0)));

        let src = tmp.path().join("programs");
        assert!(!src.join("random_exec").exists());
        assert!(!src.join("partial_exec").exists());
    }

    #[test]
    fn compile_failure_aborts_and_cleans_earlier_binaries() {
        let (tmp, cc, config) = setup(&[("random", ""), ("partial", "BROKEN")], 3);
        let err = collect(&cc, &config).unwrap_err();

        assert!(matches!(err, BenchError::CompileFailed { .. }));
        assert!(!tmp.path().join("programs/random_exec").exists());
    }

    #[test]
    fn run_failure_aborts_with_run_number() {
        let (tmp, cc, config) = setup(&[("random", "CRASH"), ("partial", "")], 3);
        let err = collect(&cc, &config).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Random Input"), "{msg}");
        assert!(msg.contains("run 1"), "{msg}");
        assert_eq!(msg.matches("Random Input").count(), 1, "{msg}");
        assert!(!tmp.path().join("programs/random_exec").exists());
        assert!(!tmp.path().join("programs/partial_exec").exists());
    }

    #[test]
    fn full_run_writes_csvs_charts_and_summary() {
        let (tmp, cc, config) = setup(&[("random", ""), ("partial", "")], 5);
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let paths = OutputPaths { out_dir: out.clone() };

        let report = run(&cc, &config, &paths).unwrap();

        assert_eq!(report.runs, 5);
        assert_eq!(report.programs.len(), 2);
        let expected_eps = crate::stats::dkw_epsilon(5, 0.05).unwrap();
        assert!((report.programs[0].epsilon - expected_eps).abs() < 1e-12);

        let series = store::read_series(&out.join("random.csv"), "Random Input").unwrap();
        assert_eq!(series.len(), 5);
        for file in ["random.svg", "partial.svg", "combined.svg", "summary.json", "partial.csv"] {
            assert!(out.join(file).exists(), "missing {file}");
        }
    }
}
