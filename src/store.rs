use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::BenchError;
use crate::stats::Summary;
use crate::types::{BenchmarkResult, SampleSeries};

#[derive(Debug, Serialize, Deserialize)]
struct RunRow {
    run: usize,
    execution_time: f64,
}

fn write_err(path: &Path) -> impl Fn(csv::Error) -> BenchError + '_ {
    move |e| BenchError::CsvWrite {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, BenchError> {
    if !path.is_file() {
        return Err(BenchError::CsvNotFound {
            path: path.to_path_buf(),
        });
    }
    csv::Reader::from_path(path).map_err(|e| BenchError::CsvRead {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Write a `benchmark_name,execution_time` table.
pub fn write_results(path: &Path, results: &[BenchmarkResult]) -> Result<(), BenchError> {
    let mut writer = csv::Writer::from_path(path).map_err(write_err(path))?;
    for result in results {
        writer.serialize(result).map_err(write_err(path))?;
    }
    // An empty table still gets its header.
    if results.is_empty() {
        writer
            .write_record(["benchmark_name", "execution_time"])
            .map_err(write_err(path))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a `benchmark_name,execution_time` table in file order.
pub fn read_results(path: &Path) -> Result<Vec<BenchmarkResult>, BenchError> {
    let mut reader = open_reader(path)?;
    reader
        .deserialize()
        .collect::<Result<Vec<BenchmarkResult>, _>>()
        .map_err(|e| BenchError::CsvRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}

/// Write a `run,execution_time` table with 1-based run numbers.
pub fn write_series(path: &Path, series: &SampleSeries) -> Result<(), BenchError> {
    let mut writer = csv::Writer::from_path(path).map_err(write_err(path))?;
    for (i, &execution_time) in series.times().iter().enumerate() {
        writer
            .serialize(RunRow {
                run: i + 1,
                execution_time,
            })
            .map_err(write_err(path))?;
    }
    if series.is_empty() {
        writer
            .write_record(["run", "execution_time"])
            .map_err(write_err(path))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a `run,execution_time` table. Rows are ordered by their run number.
pub fn read_series(path: &Path, label: &str) -> Result<SampleSeries, BenchError> {
    let mut reader = open_reader(path)?;
    let mut rows = reader
        .deserialize()
        .collect::<Result<Vec<RunRow>, _>>()
        .map_err(|e| BenchError::CsvRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    rows.sort_by_key(|r| r.run);
    Ok(SampleSeries::from_times(
        label,
        rows.into_iter().map(|r| r.execution_time).collect(),
    ))
}

/// One program's entry in `summary.json`.
#[derive(Debug, Serialize)]
pub struct ProgramReport {
    pub label: String,
    pub csv: String,
    pub plot: String,
    pub summary: Summary,
    pub epsilon: f64,
}

#[derive(Debug, Serialize)]
pub struct SamplerReport {
    pub generated_at: DateTime<Utc>,
    pub runs: usize,
    pub alpha: f64,
    pub programs: Vec<ProgramReport>,
}

pub fn write_report(path: &Path, report: &SamplerReport) -> Result<(), BenchError> {
    let json = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
    std::fs::write(path, json + "\n")?;
    Ok(())
}
