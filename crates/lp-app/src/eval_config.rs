//! Evaluation configuration file.
//!
//! ```json
//! {
//!   "evaluation": {
//!     "input_data":  { "log_file": "in.csv",  "axis": "value" },
//!     "output_data": { "log_file": "out.csv", "axis": "X" },
//!     "freq_evaluation": { "start_time": 5.0, "freq": 1.0 },
//!     "step_evaluation": {
//!       "config_params": { "AXIS": "Z", "INVERT_AXIS": false, "EVALUATION_START_TIME": 0.0 },
//!       "target_params": {
//!         "TARGET_VALUE": 10.0, "TARGET_TR": 5.0, "TARGET_TD": 2.0,
//!         "TARGET_OS": 0.5, "TARGET_TS": 7.0
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Relative log paths are taken relative to the directory holding the
//! configuration file.

use std::path::{Path, PathBuf};

use lp_signal::{AxisConfig, FrequencyResponseAnalyzer, StepParams, StepResponseEvaluator, StepTargets};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::model_service::read_document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Evaluation {
    pub input_data: Option<DataSource>,
    pub output_data: Option<DataSource>,
    pub freq_evaluation: Option<FreqEvaluation>,
    pub step_evaluation: Option<StepEvaluationConfig>,
}

/// One logged signal: which file, which column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub log_file: PathBuf,
    pub axis: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreqEvaluation {
    pub start_time: f64,
    pub freq: f64,
    #[serde(default)]
    pub input_inverse: bool,
    #[serde(default)]
    pub output_inverse: bool,
}

impl FreqEvaluation {
    pub fn analyzer(&self) -> FrequencyResponseAnalyzer {
        FrequencyResponseAnalyzer {
            start_time_s: self.start_time,
            target_freq_hz: self.freq,
            invert_input: self.input_inverse,
            invert_output: self.output_inverse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvaluationConfig {
    pub config_params: StepConfigParams,
    pub target_params: StepTargets,
}

/// Axis selection and threshold overrides share one flat object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfigParams {
    #[serde(flatten)]
    pub axis: AxisConfig,
    #[serde(flatten)]
    pub thresholds: StepParams,
}

impl StepEvaluationConfig {
    pub fn evaluator(&self) -> StepResponseEvaluator {
        StepResponseEvaluator::new(self.config_params.thresholds, self.target_params)
    }

    pub fn axis(&self) -> &AxisConfig {
        &self.config_params.axis
    }
}

impl EvaluationConfig {
    pub fn load(path: &Path) -> AppResult<Self> {
        let mut config: EvaluationConfig = read_document(path)?;
        if let Some(dir) = path.parent() {
            config.rebase(dir);
        }
        Ok(config)
    }

    /// Make relative log paths relative to `dir`.
    pub fn rebase(&mut self, dir: &Path) {
        let eval = &mut self.evaluation;
        for source in [&mut eval.input_data, &mut eval.output_data].into_iter().flatten() {
            if source.log_file.is_relative() {
                source.log_file = dir.join(&source.log_file);
            }
        }
    }

    pub fn input(&self) -> AppResult<&DataSource> {
        required(self.evaluation.input_data.as_ref(), "evaluation.input_data")
    }

    pub fn output(&self) -> AppResult<&DataSource> {
        required(self.evaluation.output_data.as_ref(), "evaluation.output_data")
    }

    pub fn freq(&self) -> AppResult<&FreqEvaluation> {
        required(self.evaluation.freq_evaluation.as_ref(), "evaluation.freq_evaluation")
    }

    pub fn step(&self) -> AppResult<&StepEvaluationConfig> {
        required(self.evaluation.step_evaluation.as_ref(), "evaluation.step_evaluation")
    }
}

fn required<'a, T>(value: Option<&'a T>, key: &str) -> AppResult<&'a T> {
    value.ok_or_else(|| AppError::Config(format!("missing '{key}'")))
}
