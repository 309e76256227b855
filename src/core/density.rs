use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::{Event, ViewRange};
use crate::error::{EngineError, EngineResult};

/// Tuning for the background density waveform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramConfig {
    pub overview_bins: usize,
    pub track_bins: usize,
    pub kernel_radius: usize,
    pub kernel_sigma: f64,
    pub lerp_factor: f64,
    /// Animation counts as settled once every bin is within this distance of its target.
    pub settle_epsilon: f64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            overview_bins: 300,
            track_bins: 400,
            kernel_radius: 12,
            kernel_sigma: 4.5,
            lerp_factor: 0.15,
            settle_epsilon: 1e-3,
        }
    }
}

impl HistogramConfig {
    pub fn validate(self) -> EngineResult<Self> {
        if self.overview_bins == 0 || self.track_bins == 0 {
            return Err(EngineError::InvalidData(
                "histogram bin counts must be > 0".to_owned(),
            ));
        }
        if self.kernel_radius > self.overview_bins.max(self.track_bins) {
            return Err(EngineError::InvalidData(format!(
                "histogram kernel radius {} exceeds the bin count",
                self.kernel_radius
            )));
        }
        if !self.kernel_sigma.is_finite() || self.kernel_sigma <= 0.0 {
            return Err(EngineError::InvalidData(
                "histogram kernel sigma must be finite and > 0".to_owned(),
            ));
        }
        if !self.lerp_factor.is_finite() || self.lerp_factor <= 0.0 || self.lerp_factor > 1.0 {
            return Err(EngineError::InvalidData(
                "histogram lerp factor must be within (0, 1]".to_owned(),
            ));
        }
        if !self.settle_epsilon.is_finite() || self.settle_epsilon <= 0.0 {
            return Err(EngineError::InvalidData(
                "histogram settle epsilon must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_track_bins(mut self, track_bins: usize) -> Self {
        self.track_bins = track_bins;
        self
    }
}

/// Event start positions and weights sorted by slider value.
///
/// Sorting once lets repeated scans over different ranges skip straight to
/// the first sample in range and stop after the last one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensitySamples {
    samples: Vec<(f64, f64)>,
}

impl DensitySamples {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut samples: Vec<(f64, f64)> = events
            .into_iter()
            .map(|event| (event.start_value(), event.importance.max(0.0)))
            .filter(|(value, weight)| value.is_finite() && weight.is_finite())
            .collect();
        samples.sort_by_key(|(value, _)| OrderedFloat(*value));
        Self { samples }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Importance-weighted counts over `bins` equal-width bins spanning `range`.
    ///
    /// Samples on `range.max` land in the last bin. A degenerate range or zero
    /// bins yields all zeros.
    #[must_use]
    pub fn bin(&self, range: ViewRange, bins: usize) -> Vec<f64> {
        let mut raw = vec![0.0; bins];
        if bins == 0 || range.is_degenerate() || self.samples.is_empty() {
            return raw;
        }

        let first = self.samples.partition_point(|(value, _)| *value < range.min);
        let last = self.samples.partition_point(|(value, _)| *value <= range.max);
        let in_range = &self.samples[first..last];
        let scale = bins as f64 / range.span();
        let index_of = |value: f64| (((value - range.min) * scale) as usize).min(bins - 1);

        #[cfg(feature = "parallel-density")]
        {
            use rayon::prelude::*;
            if in_range.len() >= PARALLEL_MIN_SAMPLES {
                return in_range
                    .par_iter()
                    .fold(
                        || vec![0.0; bins],
                        |mut acc, (value, weight)| {
                            acc[index_of(*value)] += weight;
                            acc
                        },
                    )
                    .reduce(
                        || vec![0.0; bins],
                        |mut a, b| {
                            a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                            a
                        },
                    );
            }
        }

        for (value, weight) in in_range {
            raw[index_of(*value)] += weight;
        }
        raw
    }
}

#[cfg(feature = "parallel-density")]
const PARALLEL_MIN_SAMPLES: usize = 50_000;

/// Discrete Gaussian kernel of `2 * radius + 1` taps normalized to sum 1.
#[must_use]
pub fn gaussian_kernel(radius: usize, sigma: f64) -> Vec<f64> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return vec![1.0];
    }
    let r = radius as f64;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - r;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Convolves `raw` with a symmetric kernel, treating out-of-range bins as zero.
#[must_use]
pub fn smooth(raw: &[f64], kernel: &[f64]) -> Vec<f64> {
    let radius = kernel.len() / 2;
    let n = raw.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(n.saturating_sub(1));
            (lo..=hi)
                .map(|j| raw[j] * kernel[j + radius - i])
                .sum::<f64>()
        })
        .collect()
}

/// Maps every bin to `ln(v + 1) / ln(max + 1)` so sparse regions stay visible.
#[must_use]
pub fn log_normalize(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return vec![0.0; values.len()];
    }
    let denom = max.ln_1p();
    values
        .iter()
        .map(|v| (v.max(0.0).ln_1p() / denom).clamp(0.0, 1.0))
        .collect()
}

/// Animated density waveform for one strip.
///
/// `target` is recomputed from data; `current` is what gets drawn and eases
/// toward `target` on every `tick`, so data or range changes never pop.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityHistogram {
    bins: usize,
    kernel: Vec<f64>,
    lerp_factor: f64,
    settle_epsilon: f64,
    target: Vec<f64>,
    current: Vec<f64>,
}

impl DensityHistogram {
    #[must_use]
    pub fn new(bins: usize, config: HistogramConfig) -> Self {
        Self {
            bins,
            kernel: gaussian_kernel(config.kernel_radius, config.kernel_sigma),
            lerp_factor: config.lerp_factor,
            settle_epsilon: config.settle_epsilon,
            target: vec![0.0; bins],
            current: vec![0.0; bins],
        }
    }

    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Changes the bin count; both arrays restart from zero.
    pub fn resize(&mut self, bins: usize) {
        if bins != self.bins {
            self.bins = bins;
            self.target = vec![0.0; bins];
            self.current = vec![0.0; bins];
        }
    }

    /// Recomputes the target waveform: bin, smooth, log-normalize.
    pub fn update_target(&mut self, samples: &DensitySamples, range: ViewRange) {
        let raw = samples.bin(range, self.bins);
        let smoothed = smooth(&raw, &self.kernel);
        self.target = log_normalize(&smoothed);
    }

    /// Eases `current` toward `target`. Returns `true` while still animating.
    pub fn tick(&mut self) -> bool {
        let mut animating = false;
        for (current, target) in self.current.iter_mut().zip(&self.target) {
            let delta = target - *current;
            if delta.abs() <= self.settle_epsilon {
                *current = *target;
            } else {
                *current += delta * self.lerp_factor;
                animating = true;
            }
        }
        animating
    }

    #[must_use]
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    #[must_use]
    pub fn current(&self) -> &[f64] {
        &self.current
    }
}
