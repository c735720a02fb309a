//! One-sided amplitude/phase spectra of uniformly sampled signals.

use lp_core::{mean, units};
use num_complex::Complex64;
use rustfft::FftPlanner;
use tracing::debug;

use crate::error::{SignalError, SignalResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    /// Bin frequencies in Hz.
    pub frequencies: Vec<f64>,
    /// `2/N · |X_k|`.
    pub amplitudes: Vec<f64>,
    /// Wrapped phase in degrees.
    pub phases_deg: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// FFT of the mean-removed signal, keeping the first `N/2` bins.
pub fn one_sided(values: &[f64], sample_spacing: f64) -> SignalResult<Spectrum> {
    let n = values.len();
    if n < 2 {
        return Err(SignalError::InsufficientData {
            what: "spectrum",
            got: n,
            need: 2,
        });
    }
    if !(sample_spacing.is_finite() && sample_spacing > 0.0) {
        return Err(SignalError::InvalidArg {
            what: "sample spacing must be positive",
        });
    }

    let offset = mean(values).unwrap_or(0.0);
    let mut buffer: Vec<Complex64> = values
        .iter()
        .map(|v| Complex64::new(v - offset, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let bins = n / 2;
    let scale = 2.0 / n as f64;
    let df = 1.0 / (n as f64 * sample_spacing);
    debug!(samples = n, bins, df, "spectrum computed");

    Ok(Spectrum {
        frequencies: (0..bins).map(|k| k as f64 * df).collect(),
        amplitudes: buffer[..bins].iter().map(|c| scale * c.norm()).collect(),
        phases_deg: buffer[..bins]
            .iter()
            .map(|c| units::radians_to_degrees(c.arg()))
            .collect(),
    })
}
