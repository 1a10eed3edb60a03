use itertools::{Itertools, MinMaxResult};
use std::f64::consts::PI;

fn range(samples: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    match samples.minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(x) => Some((x, x)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}

/// Count, mean, population standard deviation and range of a sample set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStatistics {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let (min, max) = range(samples.iter().copied())?;
        let count = samples.len();
        let mean = samples.iter().sum::<f64>() / count as f64;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;
        Some(Self {
            count,
            mean,
            std: variance.sqrt(),
            min,
            max,
        })
    }
}

/// Scott's rule bandwidth, `sigma * n^(-1/5)` with the sample (n - 1) deviation.
///
/// Degenerate sets (one sample, or all samples equal) fall back to a small bandwidth scaled
/// to the magnitude of the data.
pub fn scott_bandwidth(samples: &[f64]) -> Option<f64> {
    let n = samples.len();
    if n == 0 {
        return None;
    }
    let mean = samples.iter().sum::<f64>() / n as f64;
    let sigma = if n > 1 {
        (samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    let bandwidth = sigma * (n as f64).powf(-0.2);
    if bandwidth > 0.0 && bandwidth.is_finite() {
        Some(bandwidth)
    } else {
        Some(1e-3 * (mean.abs() + 1.0))
    }
}

/// Evenly spaced evaluation grid covering every sample set, padded by three bandwidths of the
/// widest set on both sides.
pub fn kde_grid(sample_sets: &[&[f64]], points: usize) -> Vec<f64> {
    let Some((min, max)) = range(sample_sets.iter().flat_map(|s| s.iter().copied())) else {
        return Vec::new();
    };
    if points == 0 {
        return Vec::new();
    }
    let pad = 3.0
        * sample_sets
            .iter()
            .filter_map(|s| scott_bandwidth(s))
            .fold(0.0, f64::max);
    let (lo, hi) = (min - pad, max + pad);
    if points == 1 {
        return vec![(lo + hi) / 2.0];
    }
    let step = (hi - lo) / (points - 1) as f64;
    (0..points).map(|i| lo + step * i as f64).collect()
}

/// Gaussian kernel density estimate of `samples` evaluated at `grid`.
pub fn gaussian_kde(samples: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let bandwidth = scott_bandwidth(samples)?;
    let norm = 1.0 / (samples.len() as f64 * bandwidth * (2.0 * PI).sqrt());
    Some(
        grid.iter()
            .map(|x| {
                norm * samples
                    .iter()
                    .map(|s| (-0.5 * ((x - s) / bandwidth).powi(2)).exp())
                    .sum::<f64>()
            })
            .collect(),
    )
}

/// Frame-wise mean over runs, truncated to the shortest run.
pub fn aligned_mean(series: &[Vec<f64>]) -> Vec<f64> {
    let Some(length) = series.iter().map(Vec::len).min() else {
        return Vec::new();
    };
    (0..length)
        .map(|i| series.iter().map(|run| run[i]).sum::<f64>() / series.len() as f64)
        .collect()
}

/// Frame-wise mean over the runs that have a value at each frame, truncated to the shortest
/// run. Frames where no run has a value stay `None`.
pub fn aligned_mean_with_gaps(series: &[Vec<Option<f64>>]) -> Vec<Option<f64>> {
    let Some(length) = series.iter().map(Vec::len).min() else {
        return Vec::new();
    };
    (0..length)
        .map(|i| {
            let defined: Vec<f64> = series.iter().filter_map(|run| run[i]).collect();
            (!defined.is_empty()).then(|| defined.iter().sum::<f64>() / defined.len() as f64)
        })
        .collect()
}

/// Normalized autocorrelation for non-negative lags. `None` for constant or empty series.
pub fn autocorrelation(series: &[f64]) -> Option<Vec<f64>> {
    if series.is_empty() {
        return None;
    }
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    let centered: Vec<f64> = series.iter().map(|x| x - mean).collect();
    let zero_lag: f64 = centered.iter().map(|x| x * x).sum();
    if zero_lag == 0.0 {
        return None;
    }
    Some(
        (0..centered.len())
            .map(|lag| {
                centered
                    .iter()
                    .zip(&centered[lag..])
                    .map(|(a, b)| a * b)
                    .sum::<f64>()
                    / zero_lag
            })
            .collect(),
    )
}
