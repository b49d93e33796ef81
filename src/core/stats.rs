//! Aggregate observables derived from the particle state.
//!
//! Nothing here feeds back into the dynamics.

use crate::config::Dimension;
use crate::core::particle::Particle;
use crate::error::{Error, Result};
use std::f64::consts::PI;

/// Spacing of the sampled Maxwell-Boltzmann reference curve.
const CURVE_STEP: f64 = 0.1;

/// Largest number of bins a [`SpeedHistogram`] may have.
pub const MAX_HISTOGRAM_BINS: usize = 100_000;

/// Histogram of speed magnitudes over `[0, max_speed]`.
///
/// Speeds above `max_speed` are not counted; `max_speed` itself lands in the last bin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedHistogram {
    /// Bin edges, `bins + 1` entries.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// `counts[k] / sample_size`, the per-bin fraction of all particles.
    pub fractions: Vec<f64>,
}

impl SpeedHistogram {
    /// Bucket the speeds of `particles`.
    ///
    /// The bin count is `floor(max_speed / bin_width)`, so the last edge is
    /// always `max_speed`. At most [`MAX_HISTOGRAM_BINS`] bins are allowed.
    pub fn from_particles<'a, I>(particles: I, bin_width: f64, max_speed: f64) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Particle>,
    {
        if !bin_width.is_finite() || bin_width <= 0.0 || !max_speed.is_finite() || max_speed < bin_width {
            return Err(Error::InvalidParam(
                "histogram needs 0 < bin_width <= max_speed".into(),
            ));
        }
        let ratio = (max_speed / bin_width).floor();
        if ratio > MAX_HISTOGRAM_BINS as f64 {
            return Err(Error::InvalidParam(format!(
                "histogram would need {ratio} bins; at most {MAX_HISTOGRAM_BINS} are allowed"
            )));
        }
        let bins = ratio as usize;
        let width = max_speed / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|k| k as f64 * width).collect();
        let mut counts = vec![0usize; bins];

        let mut total = 0usize;
        for p in particles {
            total += 1;
            let s = p.speed();
            if s > max_speed {
                continue;
            }
            let k = ((s / width) as usize).min(bins - 1);
            counts[k] += 1;
        }
        let fractions = counts
            .iter()
            .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
            .collect();
        Ok(Self {
            edges,
            counts,
            fractions,
        })
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }
}

/// Kinetic temperature `sum(m |v|^2) / (3 k_B N)`.
///
/// Uses three degrees of freedom in both 2D and 3D runs. Empty sets read 0.
pub fn temperature<'a, I>(particles: I, boltzmann: f64) -> f64
where
    I: IntoIterator<Item = &'a Particle>,
{
    let (sum, n) = particles
        .into_iter()
        .fold((0.0, 0usize), |(s, n), p| (s + p.mass * p.velocity.norm_squared(), n + 1));
    if n == 0 {
        return 0.0;
    }
    sum / (3.0 * boltzmann * n as f64)
}

/// Arithmetic mean mass; 0 for an empty set.
pub fn mean_mass<'a, I>(particles: I) -> f64
where
    I: IntoIterator<Item = &'a Particle>,
{
    let (sum, n) = particles
        .into_iter()
        .fold((0.0, 0usize), |(s, n), p| (s + p.mass, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Maxwell-Boltzmann speed density at `v`.
///
/// 3D: `4π (m / 2πkT)^{3/2} v² exp(-m v² / 2kT)`; 2D: `(m / kT) v exp(-m v² / 2kT)`.
/// Returns 0 when the temperature is not positive.
pub fn maxwell_boltzmann(v: f64, mass: f64, temperature: f64, boltzmann: f64, dim: Dimension) -> f64 {
    if temperature <= 0.0 || mass <= 0.0 {
        return 0.0;
    }
    let kt = boltzmann * temperature;
    let boltz = (-0.5 * mass * v * v / kt).exp();
    match dim {
        Dimension::Three => 4.0 * PI * (mass / (2.0 * PI * kt)).powf(1.5) * v * v * boltz,
        Dimension::Two => (mass / kt) * v * boltz,
    }
}

/// Reference curve for overlaying on a [`SpeedHistogram`].
///
/// Samples `v` in `[0, max_speed)` every 0.1 and scales the density by the bin
/// width so it is comparable to the histogram's per-bin fractions.
pub fn maxwell_boltzmann_curve(
    mass: f64,
    temperature: f64,
    boltzmann: f64,
    dim: Dimension,
    bin_width: f64,
    max_speed: f64,
) -> Vec<(f64, f64)> {
    let n = (max_speed / CURVE_STEP - 1e-9).ceil().max(0.0) as usize;
    (0..n)
        .map(|k| {
            let v = k as f64 * CURVE_STEP;
            (v, bin_width * maxwell_boltzmann(v, mass, temperature, boltzmann, dim))
        })
        .collect()
}

/// One recorded row of the run's time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSample {
    pub step: u64,
    pub reagents: usize,
    pub products: usize,
    pub temperature: f64,
}

/// Accumulates one [`StepSample`] per step for export.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    samples: Vec<StepSample>,
}

impl Recorder {
    pub fn record(&mut self, sample: StepSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[StepSample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&StepSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
