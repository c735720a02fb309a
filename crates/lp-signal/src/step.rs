//! Step-response metrics of a logged axis and their pass/fail verdicts.
//!
//! The metric core ([`compute_metrics`]) works on any time series whose
//! first sample sits at the start of the step, so analytic simulations and
//! recorded logs are judged the same way.

use std::fmt;

use lp_core::{mean, sample_variance, units};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SignalError, SignalResult};
use crate::series::{LogTable, TimeSeries};

/// Reported settling time when the signal never stays inside the band.
pub const SETTLING_SENTINEL: f64 = 10000.0;

/// Tunable thresholds, named as in evaluation config files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepParams {
    #[serde(rename = "VARIANCE_THRESHOLD")]
    pub variance_threshold: f64,
    #[serde(rename = "RISE_TIME_10_PERCENT")]
    pub rise_low: f64,
    #[serde(rename = "RISE_TIME_90_PERCENT")]
    pub rise_high: f64,
    #[serde(rename = "DELAY_TIME_PERCENT")]
    pub delay: f64,
    #[serde(rename = "SETTLING_TIME_PERCENT")]
    pub settling_band: f64,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            variance_threshold: 1.0,
            rise_low: 0.1,
            rise_high: 0.9,
            delay: 0.5,
            settling_band: 0.05,
        }
    }
}

fn default_cv() -> f64 {
    0.01
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepTargets {
    #[serde(rename = "TARGET_VALUE")]
    pub value: f64,
    #[serde(rename = "TARGET_TR")]
    pub rise_time: f64,
    #[serde(rename = "TARGET_TD")]
    pub delay_time: f64,
    #[serde(rename = "TARGET_OS")]
    pub overshoot: f64,
    #[serde(rename = "TARGET_TS")]
    pub settling_time: f64,
    /// Allowed steady-state deviation as a fraction of the target value.
    #[serde(rename = "TARGET_CV", default = "default_cv")]
    pub cv: f64,
}

/// Which column to evaluate and how to condition it first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    #[serde(rename = "AXIS")]
    pub axis: String,
    #[serde(rename = "INVERT_AXIS", default)]
    pub invert: bool,
    #[serde(rename = "EVALUATION_START_TIME", default)]
    pub evaluation_start_time: f64,
    #[serde(rename = "CONVERT_TO_DEGREE", default)]
    pub convert_to_degree: bool,
}

impl AxisConfig {
    pub fn new(axis: impl Into<String>) -> Self {
        Self {
            axis: axis.into(),
            invert: false,
            evaluation_start_time: 0.0,
            convert_to_degree: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NG")]
    Ng,
}

impl Verdict {
    fn from_pass(pass: bool) -> Self {
        if pass { Verdict::Ok } else { Verdict::Ng }
    }

    pub fn is_ok(self) -> bool {
        self == Verdict::Ok
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Ok => "OK",
            Verdict::Ng => "NG",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub verdict: Verdict,
    pub value: Option<f64>,
}

impl Metric {
    fn failed() -> Self {
        Self {
            verdict: Verdict::Ng,
            value: None,
        }
    }

    /// `OK` when the value exists and does not exceed `limit`.
    fn at_most(value: Option<f64>, limit: f64) -> Self {
        Self {
            verdict: Verdict::from_pass(value.is_some_and(|v| v <= limit)),
            value,
        }
    }
}

/// Raw metrics before any comparison against targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub steady_state: f64,
    pub variance: f64,
    /// `false` when the steady-state window varies more than allowed; the
    /// timing metrics are then not computed.
    pub stable: bool,
    pub rise_time: Option<f64>,
    pub delay_time: Option<f64>,
    pub overshoot: Option<f64>,
    pub settling_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepEvaluation {
    pub steady_state: Metric,
    pub rise_time: Metric,
    pub delay_time: Metric,
    pub overshoot: Metric,
    pub settling_time: Metric,
    pub variance: f64,
    pub stable: bool,
}

impl StepEvaluation {
    pub fn all_ok(&self) -> bool {
        [
            self.steady_state,
            self.rise_time,
            self.delay_time,
            self.overshoot,
            self.settling_time,
        ]
        .iter()
        .all(|m| m.verdict.is_ok())
    }
}

/// Condition one logged column for evaluation: drop the trailing sample,
/// optionally negate and convert to degrees, cut everything before the
/// evaluation start and shift time to zero.
pub fn preprocess(log: &LogTable, axis: &AxisConfig) -> SignalResult<TimeSeries> {
    let mut series = log.series(&axis.axis)?.drop_last();
    if axis.invert {
        series = series.negated();
    }
    if axis.convert_to_degree {
        series = series.map_values(units::radians_to_degrees);
    }
    let series = series.since(axis.evaluation_start_time).rezeroed();
    if series.len() < 2 {
        return Err(SignalError::InsufficientData {
            what: "step evaluation",
            got: series.len(),
            need: 2,
        });
    }
    Ok(series)
}

/// Steady state, rise, delay, overshoot and settling of a step response.
pub fn compute_metrics(series: &TimeSeries, params: &StepParams) -> SignalResult<StepMetrics> {
    let n = series.len();
    if n < 2 {
        return Err(SignalError::InsufficientData {
            what: "step metrics",
            got: n,
            need: 2,
        });
    }
    let times = series.times();
    let values = series.values();

    let window = &values[n - n.div_ceil(10)..];
    let steady = mean(window).unwrap_or(f64::NAN);
    let variance = sample_variance(window).unwrap_or(0.0);
    if !steady.is_finite() {
        return Err(SignalError::NonFinite {
            what: "steady state",
            value: steady,
        });
    }

    if variance > params.variance_threshold {
        warn!(variance, threshold = params.variance_threshold, "steady state is unstable");
        return Ok(StepMetrics {
            steady_state: steady,
            variance,
            stable: false,
            rise_time: None,
            delay_time: None,
            overshoot: None,
            settling_time: None,
        });
    }

    // Decreasing responses are mirrored about the initial value so the
    // thresholds below always read as "rising towards steady".
    let initial = values[0];
    let increasing = steady >= initial;
    let (x, target): (Vec<f64>, f64) = if increasing {
        (values.to_vec(), steady)
    } else {
        (values.iter().map(|v| initial - v).collect(), initial - steady)
    };

    let first_reaching = |level: f64| x.iter().position(|&v| v >= level).map(|i| times[i]);
    let rise_start = first_reaching(target * params.rise_low);
    let rise_end = first_reaching(target * params.rise_high);
    let rise_time = rise_start.zip(rise_end).map(|(a, b)| b - a);
    let delay_time = first_reaching(target * params.delay);

    let overshoot = if increasing {
        x.iter().copied().fold(f64::NEG_INFINITY, f64::max) - target
    } else {
        0.0
    };

    let band = (target * params.settling_band).abs();
    let settling_time = match x.iter().rposition(|&v| (v - target).abs() > band) {
        None => times[0],
        Some(last_out) if last_out + 1 < n => times[last_out + 1],
        Some(_) => SETTLING_SENTINEL,
    };

    debug!(
        steady,
        variance,
        increasing,
        ?rise_time,
        ?delay_time,
        overshoot,
        settling_time,
        "step metrics"
    );

    Ok(StepMetrics {
        steady_state: steady,
        variance,
        stable: true,
        rise_time,
        delay_time,
        overshoot: Some(overshoot),
        settling_time: Some(settling_time),
    })
}

/// Compare raw metrics with their targets.
pub fn judge(metrics: &StepMetrics, targets: &StepTargets) -> StepEvaluation {
    let tolerance = (targets.value * targets.cv).abs();
    let steady_state = Metric {
        verdict: Verdict::from_pass(
            metrics.stable && (metrics.steady_state - targets.value).abs() <= tolerance,
        ),
        value: Some(metrics.steady_state),
    };

    if !metrics.stable {
        return StepEvaluation {
            steady_state,
            rise_time: Metric::failed(),
            delay_time: Metric::failed(),
            overshoot: Metric::failed(),
            settling_time: Metric::failed(),
            variance: metrics.variance,
            stable: false,
        };
    }

    StepEvaluation {
        steady_state,
        rise_time: Metric::at_most(metrics.rise_time, targets.rise_time),
        delay_time: Metric::at_most(metrics.delay_time, targets.delay_time),
        overshoot: Metric::at_most(metrics.overshoot, targets.overshoot),
        settling_time: Metric::at_most(metrics.settling_time, targets.settling_time),
        variance: metrics.variance,
        stable: true,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResponseEvaluator {
    pub params: StepParams,
    pub targets: StepTargets,
}

impl StepResponseEvaluator {
    pub fn new(params: StepParams, targets: StepTargets) -> Self {
        Self { params, targets }
    }

    /// Evaluate one logged column.
    pub fn evaluate(&self, log: &LogTable, axis: &AxisConfig) -> SignalResult<StepEvaluation> {
        let series = preprocess(log, axis)?;
        self.evaluate_series(&series)
    }

    /// Evaluate an already conditioned series.
    pub fn evaluate_series(&self, series: &TimeSeries) -> SignalResult<StepEvaluation> {
        let metrics = compute_metrics(series, &self.params)?;
        Ok(judge(&metrics, &self.targets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn targets() -> StepTargets {
        StepTargets {
            value: 10.0,
            rise_time: 5.0,
            delay_time: 2.0,
            overshoot: 0.5,
            settling_time: 7.0,
            cv: 0.01,
        }
    }

    fn series(values: &[f64], dt: f64) -> TimeSeries {
        let times = (0..values.len()).map(|i| i as f64 * dt).collect();
        TimeSeries::new(times, values.to_vec()).unwrap()
    }

    #[test]
    fn steady_window_is_last_tenth_rounded_up() {
        // 15 samples -> window of 2.
        let mut v = vec![0.0; 13];
        v.extend([4.0, 6.0]);
        let m = compute_metrics(&series(&v, 1.0), &StepParams {
            variance_threshold: 10.0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(m.steady_state, 5.0);
        assert_eq!(m.variance, 2.0);
    }

    #[test]
    fn decreasing_response_is_mirrored() {
        // 10 -> 0 in one step, then flat.
        let mut v = vec![10.0];
        v.extend(std::iter::repeat_n(0.0, 19));
        let m = compute_metrics(&series(&v, 0.5), &StepParams::default()).unwrap();
        assert_eq!(m.steady_state, 0.0);
        assert_eq!(m.overshoot, Some(0.0));
        assert_eq!(m.rise_time, Some(0.0));
        assert_eq!(m.delay_time, Some(0.5));
        assert_eq!(m.settling_time, Some(0.5));
    }

    #[test]
    fn overshoot_and_settling() {
        let v = [0.0, 5.0, 12.0, 10.6, 10.2, 10.0, 10.0, 10.0, 10.0, 10.0];
        let m = compute_metrics(&series(&v, 1.0), &StepParams::default()).unwrap();
        assert_abs_diff_eq!(m.overshoot.unwrap(), 2.0, epsilon = 1e-12);
        // |10.6 - 10| > 0.5 at t = 3, inside from t = 4 on.
        assert_eq!(m.settling_time, Some(4.0));
        assert_eq!(m.rise_time, Some(1.0));
    }

    #[test]
    fn never_settling_reports_sentinel() {
        // Window of two samples, the last one outside the 5% band.
        let mut v: Vec<f64> = vec![0.0; 10];
        v.extend([10.0; 8]);
        v.extend([9.0, 11.0]);
        let params = StepParams {
            variance_threshold: 10.0,
            ..Default::default()
        };
        let m = compute_metrics(&series(&v, 1.0), &params).unwrap();
        assert_eq!(m.steady_state, 10.0);
        assert_eq!(m.settling_time, Some(SETTLING_SENTINEL));
    }

    #[test]
    fn unstable_tail_short_circuits() {
        let v: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 0.0 } else { 20.0 }).collect();
        let eval = StepResponseEvaluator::new(StepParams::default(), targets())
            .evaluate_series(&series(&v, 0.1))
            .unwrap();

        assert!(!eval.stable);
        assert_eq!(eval.steady_state.verdict, Verdict::Ng);
        assert_eq!(eval.steady_state.value, Some(10.0));
        for m in [eval.rise_time, eval.delay_time, eval.overshoot, eval.settling_time] {
            assert_eq!(m, Metric::failed());
        }
    }

    #[test]
    fn verdicts_against_targets() {
        let metrics = StepMetrics {
            steady_state: 10.05,
            variance: 0.0,
            stable: true,
            rise_time: Some(4.0),
            delay_time: None,
            overshoot: Some(0.6),
            settling_time: Some(7.0),
        };
        let eval = judge(&metrics, &targets());
        assert_eq!(eval.steady_state.verdict, Verdict::Ok);
        assert_eq!(eval.rise_time.verdict, Verdict::Ok);
        assert_eq!(eval.delay_time.verdict, Verdict::Ng);
        assert_eq!(eval.overshoot.verdict, Verdict::Ng);
        assert_eq!(eval.settling_time.verdict, Verdict::Ok);
        assert!(!eval.all_ok());
    }

    #[test]
    fn preprocess_converts_and_rezeroes() {
        let log = LogTable::new(vec![0, 1_000_000, 2_000_000, 3_000_000, 4_000_000])
            .with_column("roll", vec![0.0, -0.5, -1.0, -1.5, 99.0])
            .unwrap();
        let axis = AxisConfig {
            axis: "roll".into(),
            invert: true,
            evaluation_start_time: 1.0,
            convert_to_degree: true,
        };
        let s = preprocess(&log, &axis).unwrap();
        assert_eq!(s.times(), &[0.0, 1.0, 2.0]);
        assert_abs_diff_eq!(s.values()[2], 1.5f64.to_degrees(), epsilon = 1e-12);
        assert!(matches!(
            preprocess(&log, &AxisConfig::new("pitch")),
            Err(SignalError::MissingColumn { .. })
        ));
    }
}
