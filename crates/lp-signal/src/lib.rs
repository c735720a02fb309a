//! Logged-signal side of loop evaluation.
//!
//! Frequency response (gain and phase at one excitation frequency) and
//! step-response metrics are extracted from recorded time series. The helpers
//! they are built on (spectra, spline interpolation, peak detection) are
//! public as well.

pub mod error;
pub mod frequency;
pub mod generator;
pub mod peaks;
pub mod series;
pub mod spectrum;
pub mod spline;
pub mod step;

pub use error::{SignalError, SignalResult};
pub use frequency::{FrequencyResponse, FrequencyResponseAnalyzer};
pub use generator::{ChirpGenerator, SignalGenerator, SignalSpec, SineGenerator, StepGenerator};
pub use series::{LogTable, TimeSeries};
pub use step::{
    AxisConfig, Metric, StepEvaluation, StepMetrics, StepParams, StepResponseEvaluator,
    StepTargets, Verdict,
};
