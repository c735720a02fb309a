//! Frequency and step evaluation of logged runs and analytic models.

use std::path::{Path, PathBuf};

use lp_core::units;
use lp_model::{BodePoint, StepOptions, TransferFunction, simulate_step};
use lp_signal::step::{compute_metrics, judge};
use lp_signal::{FrequencyResponse, StepEvaluation, StepMetrics, StepParams, StepTargets, TimeSeries};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uom::si::angular_velocity::radian_per_second;

use crate::error::AppResult;
use crate::eval_config::{EvaluationConfig, StepEvaluationConfig};
use crate::log_io::read_log;

/// Gain and phase at the configured frequency, from the input and output
/// logs named in `config`.
pub fn evaluate_frequency(config: &EvaluationConfig) -> AppResult<FrequencyResponse> {
    let input = config.input()?;
    let output = config.output()?;
    let freq = config.freq()?;

    let in_log = read_log(&input.log_file)?;
    let x = in_log.series(&input.axis)?;
    let y = if output.log_file == input.log_file {
        in_log.series(&output.axis)?
    } else {
        read_log(&output.log_file)?.series(&output.axis)?
    };

    let response = freq.analyzer().analyze(&x, &y)?;
    info!(
        freq = response.frequency_hz,
        gain_db = response.gain_db,
        phase = ?response.phase_deg,
        "frequency evaluation"
    );
    Ok(response)
}

/// Evaluate several configurations in parallel. Each slot carries its own
/// outcome; one failing run does not stop the others.
pub fn evaluate_frequency_batch(configs: &[EvaluationConfig]) -> Vec<AppResult<FrequencyResponse>> {
    configs.par_iter().map(evaluate_frequency).collect()
}

/// Step evaluation of the output log named in `config`.
pub fn evaluate_step(config: &EvaluationConfig) -> AppResult<StepEvaluation> {
    evaluate_step_log(config.step()?, &config.output()?.log_file)
}

pub fn evaluate_step_log(step: &StepEvaluationConfig, log_path: &Path) -> AppResult<StepEvaluation> {
    let log = read_log(log_path)?;
    let evaluation = step.evaluator().evaluate(&log, step.axis())?;
    if !evaluation.stable {
        warn!(path = %log_path.display(), variance = evaluation.variance, "unstable run");
    }
    info!(path = %log_path.display(), all_ok = evaluation.all_ok(), "step evaluation");
    Ok(evaluation)
}

/// Evaluate many logs against one step configuration, in parallel and in
/// input order.
pub fn evaluate_step_batch(
    step: &StepEvaluationConfig,
    logs: &[PathBuf],
) -> Vec<AppResult<StepEvaluation>> {
    logs.par_iter().map(|path| evaluate_step_log(step, path)).collect()
}

/// Step metrics of a transfer function, measured the same way as a log.
pub fn analytic_step_metrics(
    tf: &TransferFunction,
    opts: StepOptions,
    params: &StepParams,
) -> AppResult<StepMetrics> {
    let trace = simulate_step(tf, opts)?;
    let series = TimeSeries::new(trace.times, trace.values)?;
    Ok(compute_metrics(&series, params)?)
}

pub fn analytic_step(
    tf: &TransferFunction,
    opts: StepOptions,
    params: &StepParams,
    targets: &StepTargets,
) -> AppResult<StepEvaluation> {
    Ok(judge(&analytic_step_metrics(tf, opts, params)?, targets))
}

/// Model response at a frequency given in Hz, for comparison with a
/// measured point.
pub fn model_point(tf: &TransferFunction, freq_hz: f64) -> Option<BodePoint> {
    let omega = units::hz_to_rad_per_s(units::hz(freq_hz)).get::<radian_per_second>();
    lp_model::bode(tf, &[omega]).into_iter().next()
}

/// One line of a measured Bode table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreqRow {
    pub frequency_hz: f64,
    pub log10_frequency: f64,
    pub gain_db: f64,
    pub phase_deg: Option<f64>,
    pub input_phase_deg: f64,
    pub output_phase_deg: f64,
}

impl From<&FrequencyResponse> for FreqRow {
    fn from(r: &FrequencyResponse) -> Self {
        Self {
            frequency_hz: r.frequency_hz,
            log10_frequency: r.frequency_hz.log10(),
            gain_db: r.gain_db,
            phase_deg: r.phase_deg,
            input_phase_deg: r.input_phase_deg,
            output_phase_deg: r.output_phase_deg,
        }
    }
}

/// Bode table rows ordered by frequency.
pub fn sweep_rows<'a, I>(responses: I) -> Vec<FreqRow>
where
    I: IntoIterator<Item = &'a FrequencyResponse>,
{
    let mut rows: Vec<FreqRow> = responses.into_iter().map(FreqRow::from).collect();
    rows.sort_by(|a, b| a.frequency_hz.total_cmp(&b.frequency_hz));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn analytic_first_order_step() {
        // 1 / (2s + 1): tau = 2 s, unit final value.
        let tf = TransferFunction::from_coefficients(&[1.0], &[2.0, 1.0]).unwrap();
        let opts = StepOptions {
            t_end: Some(40.0),
            samples: 4001,
        };
        let m = analytic_step_metrics(&tf, opts, &StepParams::default()).unwrap();

        assert!(m.stable);
        assert_abs_diff_eq!(m.steady_state, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(m.rise_time.unwrap(), 2.0 * 9f64.ln(), epsilon = 0.02);
        assert_abs_diff_eq!(m.delay_time.unwrap(), 2.0 * 2f64.ln(), epsilon = 0.02);
        assert_abs_diff_eq!(m.overshoot.unwrap(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn model_point_uses_angular_frequency() {
        // 1 / (s + 1) at 1/(2π) Hz is ω = 1 rad/s: -3.01 dB, -45°.
        let tf = TransferFunction::from_coefficients(&[1.0], &[1.0, 1.0]).unwrap();
        let p = model_point(&tf, 1.0 / std::f64::consts::TAU).unwrap();
        assert_abs_diff_eq!(p.omega_rad_s, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.magnitude_db, -3.0103, epsilon = 1e-3);
        assert_abs_diff_eq!(p.phase_deg, -45.0, epsilon = 1e-9);
    }

    #[test]
    fn rows_sorted_by_frequency() {
        let r = |f: f64| FrequencyResponse {
            frequency_hz: f,
            gain_db: -f,
            phase_deg: None,
            input_phase_deg: 0.0,
            output_phase_deg: 0.0,
        };
        let responses = [r(10.0), r(0.1), r(1.0)];
        let rows = sweep_rows(&responses);
        let freqs: Vec<f64> = rows.iter().map(|r| r.frequency_hz).collect();
        assert_eq!(freqs, vec![0.1, 1.0, 10.0]);
        assert_abs_diff_eq!(rows[2].log10_frequency, 1.0, epsilon = 1e-12);
    }
}
