//! Evaluation configs driving logged-run analysis end to end.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;
use lp_app::{
    AppError, EvaluationConfig, evaluate_frequency, evaluate_step, evaluate_step_batch, read_log,
    sweep_rows, write_rows, write_signal,
};
use lp_signal::{SignalSpec, StepGenerator};
use tempfile::TempDir;

/// CSV with a microsecond timestamp column and one column per closure.
fn write_log(path: &Path, n: usize, dt: f64, columns: &[(&str, &dyn Fn(f64) -> f64)]) {
    let mut text = String::from("timestamp");
    for (name, _) in columns {
        write!(text, ",{name}").unwrap();
    }
    text.push('\n');
    for i in 0..n {
        let t = i as f64 * dt;
        write!(text, "{}", (t * 1e6).round() as i64).unwrap();
        for (_, f) in columns {
            write!(text, ",{}", f(t)).unwrap();
        }
        text.push('\n');
    }
    fs::write(path, text).unwrap();
}

const STEP_SECTION: &str = r#"
    "step_evaluation": {
        "config_params": { "AXIS": "Z", "INVERT_AXIS": false, "EVALUATION_START_TIME": 0 },
        "target_params": {
            "TARGET_VALUE": 10, "TARGET_TR": 5, "TARGET_TD": 2,
            "TARGET_OS": 0.5, "TARGET_TS": 7, "TARGET_CV": 0.01
        }
    }"#;

fn config_file(dir: &Path, output_log: &str) -> std::path::PathBuf {
    let text = format!(
        r#"{{ "evaluation": {{
            "input_data": {{ "log_file": "run.csv", "axis": "value" }},
            "output_data": {{ "log_file": "{output_log}", "axis": "X" }},
            "freq_evaluation": {{ "start_time": 0.0, "freq": 1.0 }},
            {STEP_SECTION}
        }} }}"#
    );
    let path = dir.join("eval.json");
    fs::write(&path, text).unwrap();
    path
}

fn first_order(t: f64) -> f64 {
    10.0 * (1.0 - (-t / 2.0).exp())
}

#[test]
fn frequency_from_one_log() {
    let tmp = TempDir::new().unwrap();
    write_log(
        &tmp.path().join("run.csv"),
        10_001,
        1e-3,
        &[
            ("value", &|t| (TAU * t).sin()),
            ("X", &|t| 0.5 * (TAU * t - FRAC_PI_2).sin()),
        ],
    );
    let config = EvaluationConfig::load(&config_file(tmp.path(), "run.csv")).unwrap();

    let r = evaluate_frequency(&config).unwrap();
    assert_abs_diff_eq!(r.gain_db, -6.0206, epsilon = 0.25);
    assert_abs_diff_eq!(r.phase_deg.unwrap(), 90.0, epsilon = 1.0);

    let table = tmp.path().join("bode.csv");
    write_rows(&table, &sweep_rows([&r])).unwrap();
    let text = fs::read_to_string(&table).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("frequency_hz,log10_frequency,gain_db,phase_deg,input_phase_deg,output_phase_deg")
    );
    assert!(lines.next().unwrap().starts_with("1.0,0.0,"));
}

#[test]
fn step_from_output_log() {
    let tmp = TempDir::new().unwrap();
    write_log(&tmp.path().join("step.csv"), 6002, 0.01, &[("Z", &first_order)]);
    let config = EvaluationConfig::load(&config_file(tmp.path(), "step.csv")).unwrap();

    let eval = evaluate_step(&config).unwrap();
    assert!(eval.stable);
    assert!(eval.all_ok());
    assert_abs_diff_eq!(eval.rise_time.value.unwrap(), 2.0 * 9f64.ln(), epsilon = 0.05);
    assert_abs_diff_eq!(eval.settling_time.value.unwrap(), 2.0 * 20f64.ln(), epsilon = 0.05);
}

#[test]
fn batch_keeps_failures_in_their_slots() {
    let tmp = TempDir::new().unwrap();
    let good = tmp.path().join("good.csv");
    let shaky = tmp.path().join("shaky.csv");
    write_log(&good, 6002, 0.01, &[("Z", &first_order)]);
    write_log(&shaky, 500, 0.01, &[("Z", &|t| if (t * 100.0).round() as i64 % 2 == 0 { 5.0 } else { 15.0 })]);

    let config = EvaluationConfig::load(&config_file(tmp.path(), "good.csv")).unwrap();
    let step = config.step().unwrap();
    let logs = vec![good, shaky, tmp.path().join("missing.csv")];

    let results = evaluate_step_batch(step, &logs);
    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().all_ok());

    let unstable = results[1].as_ref().unwrap();
    assert!(!unstable.stable);
    assert!(unstable.rise_time.value.is_none());

    assert!(matches!(results[2], Err(AppError::FileRead { .. })));
}

#[test]
fn generated_signal_reads_back_as_a_log() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("step_in.csv");
    let spec = SignalSpec::Step(StepGenerator { offset: 2.5 });
    let values = spec.generate(0.01, 0.05).unwrap();
    write_signal(&path, 0.01, &values).unwrap();

    let log = read_log(&path).unwrap();
    assert_eq!(log.timestamps_us(), &[0, 10_000, 20_000, 30_000, 40_000]);
    assert_eq!(log.column("value").unwrap(), &[2.5; 5]);
}
