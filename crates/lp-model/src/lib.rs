//! Analytic side of loop evaluation.
//!
//! A [`ModelDef`] describes controllers and plants as coefficient terms over
//! named constants. [`LoopModel`] resolves those constants and derives the
//! plant, open loop, closed loop and disturbance-rejection transfer functions.
//! PID gains for a target phase margin, Bode sweeps, margins, poles and step
//! simulation operate on the resulting [`TransferFunction`]s.

pub mod constants;
pub mod error;
pub mod expand;
pub mod expr;
pub mod frequency;
pub mod loop_model;
pub mod pd;
pub mod roots;
pub mod schema;
pub mod step_sim;
pub mod transfer;
pub mod validate;

pub use constants::{ConstantTable, ValueDef, resolve as resolve_constants};
pub use error::{ModelError, ModelResult};
pub use expr::{Expr, ExprError, Scope};
pub use frequency::{BodePoint, StabilityMargins, bode, margins};
pub use loop_model::{DerivedLoop, LoopCache, LoopKind, LoopModel};
pub use pd::{PdGainSolver, PdGains};
pub use roots::{is_stable, poles, zeros};
pub use schema::{BlockDef, ModelDef, PdArgs};
pub use step_sim::{StepOptions, StepTrace, simulate_step};
pub use transfer::{
    TransferFunction, build_block, closed_loop, combine_loop, compose_series,
    disturbance_rejection,
};
pub use validate::validate_model;
