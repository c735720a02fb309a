//! Excitation signals for simulated runs.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::{SignalError, SignalResult};

/// Produces one value per sample time `0, interval, 2·interval, … < total_time`.
pub trait SignalGenerator {
    fn value_at(&self, t: f64, total_time: f64) -> f64;

    fn generate(&self, interval: f64, total_time: f64) -> SignalResult<Vec<f64>> {
        Ok(sample_times(interval, total_time)?
            .into_iter()
            .map(|t| self.value_at(t, total_time))
            .collect())
    }
}

pub fn sample_times(interval: f64, total_time: f64) -> SignalResult<Vec<f64>> {
    if !(interval.is_finite() && interval > 0.0) {
        return Err(SignalError::InvalidArg {
            what: "sample interval must be positive",
        });
    }
    if !(total_time.is_finite() && total_time >= 0.0) {
        return Err(SignalError::InvalidArg {
            what: "total time must be non-negative",
        });
    }
    let n = (total_time / interval).ceil() as usize;
    Ok((0..n).map(|i| i as f64 * interval).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SineGenerator {
    pub frequency: f64,
    #[serde(default = "one")]
    pub amplitude: f64,
    #[serde(default)]
    pub offset: f64,
}

impl SignalGenerator for SineGenerator {
    fn value_at(&self, t: f64, _total_time: f64) -> f64 {
        self.amplitude * (TAU * self.frequency * t).sin() + self.offset
    }
}

/// Linear frequency sweep from `f0` at `t = 0` to `f1` at the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChirpGenerator {
    #[serde(default)]
    pub f0: f64,
    #[serde(default = "one")]
    pub f1: f64,
    #[serde(default)]
    pub offset: f64,
}

impl SignalGenerator for ChirpGenerator {
    fn value_at(&self, t: f64, total_time: f64) -> f64 {
        let k = if total_time > 0.0 {
            (self.f1 - self.f0) / total_time
        } else {
            0.0
        };
        (TAU * (self.f0 * t + 0.5 * k * t * t)).cos() + self.offset
    }
}

/// Constant level; the step happens when the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepGenerator {
    #[serde(default)]
    pub offset: f64,
}

impl SignalGenerator for StepGenerator {
    fn value_at(&self, _t: f64, _total_time: f64) -> f64 {
        self.offset
    }
}

fn one() -> f64 {
    1.0
}

/// Serializable choice of generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalSpec {
    Sine(SineGenerator),
    Chirp(ChirpGenerator),
    Step(StepGenerator),
}

impl SignalSpec {
    pub fn generator(&self) -> &dyn SignalGenerator {
        match self {
            SignalSpec::Sine(g) => g,
            SignalSpec::Chirp(g) => g,
            SignalSpec::Step(g) => g,
        }
    }

    pub fn generate(&self, interval: f64, total_time: f64) -> SignalResult<Vec<f64>> {
        self.generator().generate(interval, total_time)
    }
}
