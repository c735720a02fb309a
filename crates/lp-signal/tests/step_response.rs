use approx::assert_abs_diff_eq;
use lp_signal::{
    AxisConfig, LogTable, StepParams, StepResponseEvaluator, StepTargets, Verdict,
};

/// 60 s of a first-order lag (tau = 2 s, final value 10) sampled every 10 ms,
/// plus one garbage row at the end the way recorders leave it.
fn first_order_log(decreasing: bool) -> LogTable {
    let mut stamps: Vec<i64> = (0..=6000).map(|i| i * 10_000).collect();
    let mut values: Vec<f64> = stamps
        .iter()
        .map(|&us| {
            let t = us as f64 * 1e-6;
            let rise = 10.0 * (1.0 - (-t / 2.0).exp());
            if decreasing { 10.0 - rise } else { rise }
        })
        .collect();
    stamps.push(60_010_000);
    values.push(-1.0e6);
    LogTable::new(stamps).with_column("Z", values).unwrap()
}

fn evaluator(target: f64) -> StepResponseEvaluator {
    StepResponseEvaluator::new(
        StepParams::default(),
        StepTargets {
            value: target,
            rise_time: 5.0,
            delay_time: 2.0,
            overshoot: 0.5,
            settling_time: 7.0,
            cv: 0.01,
        },
    )
}

#[test]
fn first_order_metrics() {
    let eval = evaluator(10.0)
        .evaluate(&first_order_log(false), &AxisConfig::new("Z"))
        .unwrap();

    assert!(eval.stable);
    assert_abs_diff_eq!(eval.steady_state.value.unwrap(), 10.0, epsilon = 1e-6);
    assert_abs_diff_eq!(eval.rise_time.value.unwrap(), 2.0 * 9f64.ln(), epsilon = 0.05);
    assert_abs_diff_eq!(eval.delay_time.value.unwrap(), 2.0 * 2f64.ln(), epsilon = 0.05);
    assert_abs_diff_eq!(eval.overshoot.value.unwrap(), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(eval.settling_time.value.unwrap(), 2.0 * 20f64.ln(), epsilon = 0.05);
    assert!(eval.all_ok());
}

#[test]
fn decreasing_response_uses_mirrored_metrics() {
    let eval = evaluator(0.0)
        .evaluate(&first_order_log(true), &AxisConfig::new("Z"))
        .unwrap();

    assert_abs_diff_eq!(eval.steady_state.value.unwrap(), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(eval.rise_time.value.unwrap(), 2.0 * 9f64.ln(), epsilon = 0.05);
    assert_eq!(eval.overshoot.value, Some(0.0));
    assert_eq!(eval.overshoot.verdict, Verdict::Ok);
}

#[test]
fn start_time_and_inversion() {
    let axis = AxisConfig {
        axis: "Z".into(),
        invert: true,
        evaluation_start_time: 1.0,
        convert_to_degree: false,
    };
    let eval = evaluator(-10.0).evaluate(&first_order_log(false), &axis).unwrap();

    // Inverted: falls from about -3.93 toward -10, timed from t = 1 s.
    assert_abs_diff_eq!(eval.steady_state.value.unwrap(), -10.0, epsilon = 1e-6);
    assert_eq!(eval.steady_state.verdict, Verdict::Ok);
    assert_eq!(eval.overshoot.value, Some(0.0));
}

#[test]
fn oscillating_tail_is_flagged_not_failed() {
    let stamps: Vec<i64> = (0..200).map(|i| i * 10_000).collect();
    let values: Vec<f64> = (0..200).map(|i| if i % 2 == 0 { 5.0 } else { 15.0 }).collect();
    let log = LogTable::new(stamps).with_column("Z", values).unwrap();

    let eval = evaluator(10.0).evaluate(&log, &AxisConfig::new("Z")).unwrap();
    assert!(!eval.stable);
    assert_eq!(eval.steady_state.verdict, Verdict::Ng);
    assert!(eval.rise_time.value.is_none());
    assert!(eval.settling_time.value.is_none());
}
