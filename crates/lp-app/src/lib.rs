//! Shared service layer for loopeval front ends.
//!
//! Wraps the analytic (`lp-model`) and logged-signal (`lp-signal`) engines
//! with file handling: model documents and manifests, CSV logs, evaluation
//! configuration, and batch evaluation.

pub mod error;
pub mod eval_config;
pub mod evaluation_service;
pub mod log_io;
pub mod model_service;

pub use error::{AppError, AppResult};
pub use eval_config::{
    DataSource, Evaluation, EvaluationConfig, FreqEvaluation, StepConfigParams,
    StepEvaluationConfig,
};
pub use evaluation_service::{
    FreqRow, analytic_step, analytic_step_metrics, evaluate_frequency, evaluate_frequency_batch,
    evaluate_step, evaluate_step_batch, evaluate_step_log, model_point, sweep_rows,
};
pub use log_io::{parse_log, read_log, write_rows, write_signal};
pub use model_service::{
    DocumentFormat, ExpansionInputs, Manifest, expand_constant_files, load_manifest, load_model,
    merge_manifest, merge_manifest_file, open_model, save_model,
};
