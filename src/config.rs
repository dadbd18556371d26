use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::BenchError;
use crate::stats::DEFAULT_ALPHA;
use crate::types::Rgb;

pub const DEFAULT_RUNS: usize = 1000;
pub const DEFAULT_COMPILER: &str = "gcc";
pub const COMBINED_PLOT: &str = "bsort_plot_combined.png";
pub const REPORT_FILE: &str = "summary.json";

/// One program compiled and sampled by the repeated sampler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramSpec {
    pub label: String,
    /// C source, relative to the config's source directory.
    pub source: PathBuf,
    pub executable: String,
    pub color: Rgb,
    pub csv: PathBuf,
    pub plot: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    pub runs: usize,
    pub alpha: f64,
    pub compiler: String,
    /// Directory the sources are resolved against and binaries are built in.
    pub source_dir: PathBuf,
    pub combined_plot: PathBuf,
    #[serde(rename = "program")]
    pub programs: Vec<ProgramSpec>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            alpha: DEFAULT_ALPHA,
            compiler: DEFAULT_COMPILER.to_string(),
            source_dir: PathBuf::from("."),
            combined_plot: PathBuf::from(COMBINED_PLOT),
            programs: default_programs(),
        }
    }
}

fn default_programs() -> Vec<ProgramSpec> {
    vec![
        ProgramSpec {
            label: "Random Input".to_string(),
            source: PathBuf::from("bubble_sort_completely_random.c"),
            executable: "bsort_random_exec".to_string(),
            color: Rgb::STEELBLUE,
            csv: PathBuf::from("bsort_random_times.csv"),
            plot: PathBuf::from("bsort_plot_random.png"),
        },
        ProgramSpec {
            label: "Partially Ordered Input".to_string(),
            source: PathBuf::from("bubble_sort_partially_ordered.c"),
            executable: "bsort_partial_exec".to_string(),
            color: Rgb::DARKORANGE,
            csv: PathBuf::from("bsort_partial_times.csv"),
            plot: PathBuf::from("bsort_plot_partial.png"),
        },
    ]
}

impl SamplerConfig {
    pub fn from_file(path: &Path) -> Result<Self, BenchError> {
        let content = std::fs::read_to_string(path).map_err(|source| BenchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content).map_err(|detail| BenchError::ConfigParse {
            path: path.to_path_buf(),
            detail,
        })?;

        // Relative source directories are relative to the config file.
        if config.source_dir.is_relative()
            && let Some(parent) = path.parent()
        {
            config.source_dir = parent.join(&config.source_dir);
        }
        Ok(config)
    }

    fn from_toml(content: &str) -> Result<Self, String> {
        let config: SamplerConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.programs.is_empty() {
            return Err("at least one [[program]] entry is required".to_string());
        }
        if self.runs == 0 {
            return Err("runs must be at least 1".to_string());
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(format!("alpha {} must lie strictly between 0 and 1", self.alpha));
        }
        Ok(())
    }

    /// Resolve the config to use: an explicit path, then the per-user file,
    /// then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, BenchError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match user_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "using user sampler config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// `<config dir>/cbench/sampler.toml`, when the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cbench").join("sampler.toml"))
}
