use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("Benchmark directory '{path}' does not exist (current directory: {cwd})")]
    RootNotFound { path: PathBuf, cwd: String },

    #[error("Failed to start compiler '{compiler}': {source}")]
    CompilerUnavailable {
        compiler: String,
        source: std::io::Error,
    },

    #[error("Compilation of {name} failed ({status})")]
    CompileFailed { name: String, status: String },

    #[error("Execution of {name} failed: {detail}")]
    RunFailed { name: String, detail: String },

    #[error("Could not find CSV file '{path}'")]
    CsvNotFound { path: PathBuf },

    #[error("Failed to read CSV file {path}: {detail}")]
    CsvRead { path: PathBuf, detail: String },

    #[error("Failed to write CSV file {path}: {detail}")]
    CsvWrite { path: PathBuf, detail: String },

    #[error("Failed to render chart {path}: {detail}")]
    Plot { path: PathBuf, detail: String },

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    #[error("Invalid colour '{value}'. Expected #rrggbb")]
    InvalidColor { value: String },

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StatsError {
    #[error("Sample is empty")]
    EmptySample,

    #[error("Sample contains a non-finite value at position {index}")]
    NonFinite { index: usize },

    #[error("Significance level {alpha} must lie strictly between 0 and 1")]
    InvalidAlpha { alpha: f64 },

    #[error("Histogram needs at least one bin")]
    NoBins,
}
