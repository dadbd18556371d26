use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::BenchError;

/// One directory holding the C sources of a single benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkDir {
    pub name: String,
    pub dir: PathBuf,
    /// File names relative to `dir`, sorted.
    pub sources: Vec<String>,
}

/// Wall-clock time of a single benchmark run, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    #[serde(rename = "benchmark_name")]
    pub name: String,
    pub execution_time: f64,
}

/// Execution times of one program across repeated runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    label: String,
    times: Vec<f64>,
}

impl SampleSeries {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            times: Vec::new(),
        }
    }

    pub fn with_capacity(label: impl Into<String>, capacity: usize) -> Self {
        Self {
            label: label.into(),
            times: Vec::with_capacity(capacity),
        }
    }

    pub fn from_times(label: impl Into<String>, times: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            times,
        }
    }

    pub fn push(&mut self, seconds: f64) {
        self.times.push(seconds);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// An opaque sRGB colour, written as `#rrggbb` in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const STEELBLUE: Rgb = Rgb(70, 130, 180);
    pub const DARKORANGE: Rgb = Rgb(255, 140, 0);
    pub const PINK: Rgb = Rgb(255, 192, 203);
}

impl FromStr for Rgb {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BenchError::InvalidColor {
            value: s.to_string(),
        };
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Counts reported at the end of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteTally {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_parses_lowercase_and_uppercase_hex() {
        assert_eq!("#4682b4".parse::<Rgb>().unwrap(), Rgb::STEELBLUE);
        assert_eq!("#FF8C00".parse::<Rgb>().unwrap(), Rgb::DARKORANGE);
    }

    #[test]
    fn rgb_rejects_malformed_values() {
        for bad in ["4682b4", "#4682b", "#4682b4ff", "#gg82b4", "", "#"] {
            assert!(bad.parse::<Rgb>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rgb_display_round_trips() {
        let c = Rgb(1, 171, 255);
        assert_eq!(c.to_string(), "#01abff");
        assert_eq!(c.to_string().parse::<Rgb>().unwrap(), c);
    }

    #[test]
    fn sample_series_appends_in_order() {
        let mut series = SampleSeries::with_capacity("Random Input", 3);
        assert!(series.is_empty());
        series.push(0.3);
        series.push(0.1);
        series.push(0.2);
        assert_eq!(series.len(), 3);
        assert_eq!(series.times(), &[0.3, 0.1, 0.2]);
        assert_eq!(series.label(), "Random Input");
    }
}
