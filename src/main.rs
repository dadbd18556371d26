use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Result, ensure};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cbench::compile::{Compiler, SAMPLER_FLAGS, SUITE_FLAGS};
use cbench::config::{DEFAULT_COMPILER, SamplerConfig};
use cbench::display::{self, Tag};
use cbench::errors::BenchError;
use cbench::plot::{self, PreparedSeries};
use cbench::runner;
use cbench::sampler::{self, OutputPaths};
use cbench::stats::{self, DEFAULT_ALPHA};
use cbench::store;
use cbench::types::Rgb;

const SUITE_CSV: &str = "tempi_di_esecuzione_benchmarks.csv";
const SUITE_CHART: &str = "diagramma_a_barre_dei_tempi_di_esecuzione.png";

#[derive(Parser)]
#[command(name = "cbench", version, about = "Compile, time and chart small C benchmark programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TrueType font used for chart text (also read from $CBENCH_FONT)
    #[arg(long, global = true)]
    font: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Build and time every benchmark directory under ROOT once
    Suite {
        #[arg(default_value = "bench")]
        root: PathBuf,

        #[arg(long, default_value = SUITE_CSV)]
        csv: PathBuf,

        #[arg(long, default_value = SUITE_CHART)]
        chart: PathBuf,

        #[arg(long, default_value = DEFAULT_COMPILER)]
        cc: String,
    },

    /// Build a fixed set of programs and time each one many times
    Sample {
        /// Sampler config (TOML). Defaults to the per-user file, then built-ins
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        runs: Option<usize>,

        #[arg(long)]
        alpha: Option<f64>,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        #[arg(long)]
        cc: Option<String>,
    },

    /// Re-render charts from saved CSV files
    Plot {
        #[command(subcommand)]
        kind: PlotKind,
    },

    /// Print statistics and the DKW band width for a run CSV
    Stats {
        csv: PathBuf,

        #[arg(long, default_value_t = DEFAULT_ALPHA)]
        alpha: f64,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlotKind {
    /// Bar chart from a benchmark_name,execution_time CSV
    Bars {
        csv: PathBuf,

        #[arg(long, default_value = SUITE_CHART)]
        out: PathBuf,
    },

    /// Time-per-run, histogram and ECDF panels from a run,execution_time CSV
    Series {
        csv: PathBuf,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long, default_value_t = DEFAULT_ALPHA)]
        alpha: f64,

        #[arg(long, default_value = "#4682b4")]
        color: Rgb,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn label_for(csv: &Path, label: Option<String>) -> String {
    label.unwrap_or_else(|| {
        csv.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "series".to_string())
    })
}

fn run_suite(root: &Path, csv: &Path, chart: &Path, cc: String) -> Result<()> {
    let compiler = Compiler::new(cc).flags(SUITE_FLAGS.iter().copied());
    let (mut results, tally) = runner::run_all_benchmarks(&compiler, root)?;

    println!();
    if results.is_empty() {
        println!("No benchmark completed ({})", display::format_tally(&tally));
        return Ok(());
    }

    runner::sort_by_time(&mut results);
    print!("{}", display::format_results(&results));
    println!();
    println!("{}", display::format_tally(&tally));

    store::write_results(csv, &results)?;

    // A plotting failure does not undo the measurements already saved.
    match plot::plot_bar_chart_from_csv(csv, chart) {
        Ok(()) => println!("Saved -> {}", chart.display()),
        Err(e) => println!("{}", display::format_status(Tag::Error, &e.to_string())),
    }
    Ok(())
}

fn run_sample(
    config: Option<&Path>,
    runs: Option<usize>,
    alpha: Option<f64>,
    out_dir: PathBuf,
    cc: Option<String>,
) -> Result<()> {
    let mut config = SamplerConfig::load(config)?;
    if let Some(runs) = runs {
        ensure!(runs > 0, "--runs must be at least 1");
        config.runs = runs;
    }
    if let Some(alpha) = alpha {
        ensure!(alpha > 0.0 && alpha < 1.0, "--alpha must lie strictly between 0 and 1");
        config.alpha = alpha;
    }
    if let Some(cc) = cc {
        config.compiler = cc;
    }

    std::fs::create_dir_all(&out_dir)?;
    let compiler = Compiler::new(config.compiler.clone()).flags(SAMPLER_FLAGS.iter().copied());
    sampler::run(&compiler, &config, &OutputPaths { out_dir })?;
    Ok(())
}

fn run_plot(kind: PlotKind) -> Result<()> {
    match kind {
        PlotKind::Bars { csv, out } => match plot::plot_bar_chart_from_csv(&csv, &out) {
            Ok(()) => println!("Saved -> {}", out.display()),
            Err(e @ BenchError::CsvNotFound { .. }) => {
                println!("{}", display::format_status(Tag::Error, &e.to_string()));
                process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },
        PlotKind::Series {
            csv,
            label,
            out,
            alpha,
            color,
        } => {
            let series = match store::read_series(&csv, &label_for(&csv, label)) {
                Ok(s) => s,
                Err(e @ BenchError::CsvNotFound { .. }) => {
                    println!("{}", display::format_status(Tag::Error, &e.to_string()));
                    process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };
            let out = out.unwrap_or_else(|| csv.with_extension("png"));
            let prepared = PreparedSeries::new(&series, color, alpha)?;
            plot::render_series(&prepared, &out)?;
            println!("Saved -> {}", out.display());
        }
    }
    Ok(())
}

fn run_stats(csv: &Path, alpha: f64, label: Option<String>, json: bool) -> Result<()> {
    let series = store::read_series(csv, &label_for(csv, label))?;
    let summary = stats::summarize(series.times())?;
    let band = stats::ecdf_dkw(series.times(), alpha)?;

    if json {
        println!("{}", display::format_summary_json(series.label(), &summary, &band)?);
    } else {
        print!("{}", display::format_summary(series.label(), &summary, &band));
    }
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    plot::init_fonts(cli.font.as_deref());

    match cli.command {
        Command::Suite {
            root,
            csv,
            chart,
            cc,
        } => run_suite(&root, &csv, &chart, cc),
        Command::Sample {
            config,
            runs,
            alpha,
            out_dir,
            cc,
        } => run_sample(config.as_deref(), runs, alpha, out_dir, cc),
        Command::Plot { kind } => run_plot(kind),
        Command::Stats {
            csv,
            alpha,
            label,
            json,
        } => run_stats(&csv, alpha, label, json),
    }
}

fn main() {
    if let Err(err) = run() {
        println!("{}", display::format_status(Tag::Error, &err.to_string()));
        process::exit(1);
    }
}
