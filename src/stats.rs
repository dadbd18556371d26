use serde::Serialize;

use crate::errors::StatsError;

/// Default significance level for the DKW band (95% confidence).
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Descriptive statistics of a sample of execution times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1). `None` for a single observation.
    pub stdev: Option<f64>,
    /// Population standard deviation (n).
    pub pstdev: f64,
    pub min: f64,
    pub max: f64,
}

/// Empirical CDF of a sample with its DKW simultaneous confidence band.
#[derive(Debug, Clone, PartialEq)]
pub struct EcdfBand {
    pub x: Vec<f64>,
    pub ecdf_y: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub epsilon: f64,
    pub alpha: f64,
}

impl EcdfBand {
    /// Confidence level of the band as a whole percentage, e.g. 95.
    pub fn confidence_percent(&self) -> u32 {
        ((1.0 - self.alpha) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

fn check_sample(sample: &[f64]) -> Result<(), StatsError> {
    if sample.is_empty() {
        return Err(StatsError::EmptySample);
    }
    if let Some(index) = sample.iter().position(|v| !v.is_finite()) {
        return Err(StatsError::NonFinite { index });
    }
    Ok(())
}

fn sorted(sample: &[f64]) -> Vec<f64> {
    let mut values = sample.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

pub fn mean(sample: &[f64]) -> Result<f64, StatsError> {
    check_sample(sample)?;
    Ok(sample.iter().sum::<f64>() / sample.len() as f64)
}

pub fn median(sample: &[f64]) -> Result<f64, StatsError> {
    check_sample(sample)?;
    let values = sorted(sample);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Ok((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Ok(values[mid])
    }
}

/// Compute the descriptive statistics of a non-empty, finite sample.
pub fn summarize(sample: &[f64]) -> Result<Summary, StatsError> {
    let mean = mean(sample)?;
    let median = median(sample)?;
    let n = sample.len();

    let sum_sq: f64 = sample.iter().map(|v| (v - mean).powi(2)).sum();
    let pstdev = (sum_sq / n as f64).sqrt();
    let stdev = (n >= 2).then(|| (sum_sq / (n - 1) as f64).sqrt());

    let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(Summary {
        count: n,
        mean,
        median,
        stdev,
        pstdev,
        min,
        max,
    })
}

/// Half-width of the DKW band: `sqrt(ln(2 / alpha) / (2n))`.
pub fn dkw_epsilon(n: usize, alpha: f64) -> Result<f64, StatsError> {
    if n == 0 {
        return Err(StatsError::EmptySample);
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(StatsError::InvalidAlpha { alpha });
    }
    Ok(((2.0 / alpha).ln() / (2.0 * n as f64)).sqrt())
}

/// Evaluate the ECDF at every sorted sample point and attach the DKW band,
/// clamped to `[0, 1]`.
pub fn ecdf_dkw(sample: &[f64], alpha: f64) -> Result<EcdfBand, StatsError> {
    check_sample(sample)?;
    let epsilon = dkw_epsilon(sample.len(), alpha)?;

    let x = sorted(sample);
    let n = x.len() as f64;

    // F(x) = #{v <= x} / n, so ties all take the highest rank.
    let ecdf_y: Vec<f64> = x
        .iter()
        .map(|&point| x.partition_point(|&v| v <= point) as f64 / n)
        .collect();

    let upper = ecdf_y.iter().map(|y| (y + epsilon).clamp(0.0, 1.0)).collect();
    let lower = ecdf_y.iter().map(|y| (y - epsilon).clamp(0.0, 1.0)).collect();

    Ok(EcdfBand {
        x,
        ecdf_y,
        upper,
        lower,
        epsilon,
        alpha,
    })
}

/// Equal-width histogram over `[min, max]`; the last bin includes `max`.
pub fn histogram(sample: &[f64], bins: usize) -> Result<Vec<HistogramBin>, StatsError> {
    check_sample(sample)?;
    if bins == 0 {
        return Err(StatsError::NoBins);
    }

    let mut lo = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in sample {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect())
}

/// Expand points into a right-continuous step path (`where="post"`).
pub fn step_path(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    let mut path = Vec::with_capacity(x.len() * 2);
    for (i, (&xi, &yi)) in x.iter().zip(y).enumerate() {
        if i > 0 {
            path.push((xi, y[i - 1]));
        }
        path.push((xi, yi));
    }
    path
}
