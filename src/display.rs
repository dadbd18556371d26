use owo_colors::{OwoColorize, Stream, Style};
use serde::Serialize;

use crate::stats::{EcdfBand, Summary};
use crate::types::{BenchmarkResult, SuiteTally};

/// Prefix tag of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Done,
    Skip,
    RuntimeError,
    Error,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Done => "DONE:",
            Tag::Skip => "SKIP:",
            Tag::RuntimeError => "RUNTIME ERROR:",
            Tag::Error => "ERROR:",
        }
    }

    fn style(self) -> Style {
        match self {
            Tag::Done => Style::new().green().bold(),
            Tag::Skip => Style::new().yellow().bold(),
            Tag::RuntimeError | Tag::Error => Style::new().red().bold(),
        }
    }
}

/// A tagged status line, e.g. `SKIP: compilation failed for fft`.
pub fn format_status(tag: Tag, message: &str) -> String {
    let style = tag.style();
    let prefix = tag
        .as_str()
        .if_supports_color(Stream::Stdout, |s| s.style(style))
        .to_string();
    format!("{} {}", prefix, message)
}

pub fn format_done(name: &str, seconds: f64) -> String {
    format_status(Tag::Done, &format!("{:<20} {:.6} s", name, seconds))
}

/// Results sorted fastest first, one `name: time s` line each.
pub fn format_results(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    out.push_str(
        &"Results - benchmark name execution time"
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
            .to_string(),
    );
    out.push_str("\n\n");

    for r in results {
        let name = r
            .name
            .if_supports_color(Stream::Stdout, |s| s.cyan())
            .to_string();
        out.push_str(&format!("{}: {:.6} s\n", name, r.execution_time));
    }
    out
}

pub fn format_tally(tally: &SuiteTally) -> String {
    format!(
        "{} completed, {} skipped, {} failed",
        tally.completed, tally.skipped, tally.failed
    )
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{:.6}", v))
}

/// Aligned statistics block for one series.
pub fn format_summary(label: &str, summary: &Summary, band: &EcdfBand) -> String {
    let heading = label
        .if_supports_color(Stream::Stdout, |s| s.bold())
        .to_string();
    let rows = [
        ("runs", summary.count.to_string()),
        ("mean", format!("{:.6} s", summary.mean)),
        ("median", format!("{:.6} s", summary.median)),
        ("stdev", format!("{} s", fmt_opt(summary.stdev))),
        ("pstdev", format!("{:.6} s", summary.pstdev)),
        ("min", format!("{:.6} s", summary.min)),
        ("max", format!("{:.6} s", summary.max)),
        (
            "dkw eps",
            format!("{:.4} ({}% band)", band.epsilon, band.confidence_percent()),
        ),
    ];

    let mut out = format!("{}\n", heading);
    for (key, value) in rows {
        let key = format!("{:<8}", key)
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
            .to_string();
        out.push_str(&format!("  {} {}\n", key, value));
    }
    out
}

#[derive(Serialize)]
struct JsonStats<'a> {
    label: &'a str,
    #[serde(flatten)]
    summary: &'a Summary,
    alpha: f64,
    epsilon: f64,
}

pub fn format_summary_json(
    label: &str,
    summary: &Summary,
    band: &EcdfBand,
) -> Result<String, serde_json::Error> {
    let stats = JsonStats {
        label,
        summary,
        alpha: band.alpha,
        epsilon: band.epsilon,
    };
    serde_json::to_string_pretty(&stats)
}
