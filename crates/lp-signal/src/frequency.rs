//! Gain and phase of a logged loop at one excitation frequency.

use lp_core::{interp_linear, mean};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SignalError, SignalResult};
use crate::peaks::find_peaks;
use crate::series::TimeSeries;
use crate::spectrum::one_sided;
use crate::spline::CubicSpline;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyResponse {
    pub frequency_hz: f64,
    pub gain_db: f64,
    /// Peak-timing phase. Positive when the output lags the input.
    pub phase_deg: Option<f64>,
    /// Raw FFT phase of the input at `frequency_hz`.
    pub input_phase_deg: f64,
    /// Raw FFT phase of the output at `frequency_hz`.
    pub output_phase_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyResponseAnalyzer {
    pub start_time_s: f64,
    pub target_freq_hz: f64,
    #[serde(default)]
    pub invert_input: bool,
    #[serde(default)]
    pub invert_output: bool,
}

impl FrequencyResponseAnalyzer {
    pub fn new(start_time_s: f64, target_freq_hz: f64) -> Self {
        Self {
            start_time_s,
            target_freq_hz,
            invert_input: false,
            invert_output: false,
        }
    }

    pub fn analyze(&self, input: &TimeSeries, output: &TimeSeries) -> SignalResult<FrequencyResponse> {
        if !(self.target_freq_hz.is_finite() && self.target_freq_hz > 0.0) {
            return Err(SignalError::InvalidArg {
                what: "target frequency must be positive",
            });
        }

        let end = input.last_time().ok_or(SignalError::InsufficientData {
            what: "frequency analysis input",
            got: 0,
            need: 2,
        })?;
        let mut x = input.window(self.start_time_s, end).drop_last();
        let mut y = output.window(self.start_time_s, end).drop_last();
        let got = x.len().min(y.len());
        if got < 2 {
            return Err(SignalError::InsufficientData {
                what: "frequency analysis window",
                got,
                need: 2,
            });
        }
        if self.invert_input {
            x = x.negated();
        }
        if self.invert_output {
            y = y.negated();
        }

        let dt = x.sample_spacing().unwrap_or(0.0);
        let phase_deg = peak_phase(&x, &y);

        let spec_x = one_sided(x.values(), dt)?;
        let spec_y = one_sided(y.values(), dt)?;
        let bins = spec_x.len().min(spec_y.len());
        if bins < 2 {
            return Err(SignalError::InsufficientData {
                what: "spectrum bins",
                got: bins,
                need: 2,
            });
        }
        let freqs = &spec_x.frequencies[..bins];

        let amp_in = CubicSpline::not_a_knot(freqs, &spec_x.amplitudes[..bins])?.eval(self.target_freq_hz);
        let amp_out = CubicSpline::not_a_knot(freqs, &spec_y.amplitudes[..bins])?.eval(self.target_freq_hz);
        let gain_db = 20.0 * (amp_out / amp_in).log10();
        if !gain_db.is_finite() {
            return Err(SignalError::NonFinite {
                what: "gain",
                value: gain_db,
            });
        }

        let at = |phases: &[f64]| interp_linear(self.target_freq_hz, freqs, &phases[..bins]).unwrap_or(f64::NAN);
        let response = FrequencyResponse {
            frequency_hz: self.target_freq_hz,
            gain_db,
            phase_deg,
            input_phase_deg: at(&spec_x.phases_deg),
            output_phase_deg: at(&spec_y.phases_deg),
        };
        debug!(
            freq = response.frequency_hz,
            gain_db = response.gain_db,
            phase = ?response.phase_deg,
            bins,
            "frequency response"
        );
        Ok(response)
    }
}

/// Phase from paired peak times: mean output delay over the mean input
/// period, in degrees.
fn peak_phase(input: &TimeSeries, output: &TimeSeries) -> Option<f64> {
    let peaks_in = find_peaks(input.values());
    let peaks_out = find_peaks(output.values());
    debug!(input = peaks_in.len(), output = peaks_out.len(), "peaks found");

    if peaks_in.is_empty() || peaks_out.is_empty() {
        warn!("no peaks in one of the signals, phase undefined");
        return None;
    }

    let t_in: Vec<f64> = peaks_in.iter().map(|&i| input.times()[i]).collect();
    let t_out: Vec<f64> = peaks_out.iter().map(|&i| output.times()[i]).collect();

    let spacings: Vec<f64> = t_in.windows(2).map(|w| w[1] - w[0]).collect();
    let Some(period) = mean(&spacings) else {
        warn!("fewer than two input peaks, period undefined");
        return None;
    };
    if period <= 0.0 {
        return None;
    }

    let lags: Vec<f64> = t_in.iter().zip(&t_out).map(|(a, b)| b - a).collect();
    mean(&lags).map(|lag| lag / period * 360.0)
}
