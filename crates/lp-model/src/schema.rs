//! Serializable model description.
//!
//! ```yaml
//! constants:
//!   m: 1.2
//!   tau: "m / 4"
//! controllers:
//!   - num: ["Kd", "Kp", "Ki"]
//!     den: [1, 0]
//! plants:
//!   - num: [1]
//!     den: ["tau", 1]
//! pd_args: { PM: 60, Ki: 0.1, Wc: 4 }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::ValueDef;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelDef {
    #[serde(default)]
    pub constants: BTreeMap<String, ValueDef>,
    pub controllers: Vec<BlockDef>,
    pub plants: Vec<BlockDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pd_args: Option<PdArgs>,
}

/// One transfer-function block: coefficient terms, highest degree first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    pub num: Vec<ValueDef>,
    pub den: Vec<ValueDef>,
}

impl BlockDef {
    pub fn new(num: Vec<ValueDef>, den: Vec<ValueDef>) -> Self {
        Self { num, den }
    }
}

/// Inputs to the PD gain design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdArgs {
    /// Target phase margin in degrees.
    #[serde(rename = "PM")]
    pub phase_margin_deg: f64,
    #[serde(rename = "Ki")]
    pub integral_gain: f64,
    /// Crossover angular frequency in rad/s.
    #[serde(rename = "Wc")]
    pub crossover_rad_s: f64,
}
