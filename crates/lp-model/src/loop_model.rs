//! A model description bound to its resolved constants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{self, ConstantTable};
use crate::error::{ModelError, ModelResult};
use crate::schema::{BlockDef, ModelDef, PdArgs};
use crate::transfer::{self, TransferFunction};
use crate::validate::validate_model;

/// Which transfer function of the loop to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopKind {
    /// Plant `P`.
    Ps,
    /// Open loop `L = C·P`.
    Ls,
    /// Closed loop `W = L / (1 + L)`.
    Ws,
    /// Disturbance rejection `Ed = P / (1 + L)`.
    Eds,
}

impl LoopKind {
    pub const ALL: [LoopKind; 4] = [LoopKind::Ps, LoopKind::Ls, LoopKind::Ws, LoopKind::Eds];

    pub fn as_str(self) -> &'static str {
        match self {
            LoopKind::Ps => "ps",
            LoopKind::Ls => "ls",
            LoopKind::Ws => "ws",
            LoopKind::Eds => "eds",
        }
    }
}

impl fmt::Display for LoopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoopKind {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ps" => Ok(LoopKind::Ps),
            "ls" => Ok(LoopKind::Ls),
            "ws" => Ok(LoopKind::Ws),
            "eds" => Ok(LoopKind::Eds),
            other => Err(ModelError::config(format!(
                "unknown loop kind '{other}' (expected ps, ls, ws or eds)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopModel {
    def: ModelDef,
    constants: ConstantTable,
}

impl LoopModel {
    /// Validate the description and resolve its constants.
    pub fn new(def: ModelDef) -> ModelResult<Self> {
        validate_model(&def)?;
        let constants = constants::resolve(&def.constants)?;
        debug!(
            constants = constants.len(),
            controllers = def.controllers.len(),
            plants = def.plants.len(),
            "model loaded"
        );
        Ok(Self { def, constants })
    }

    pub fn def(&self) -> &ModelDef {
        &self.def
    }

    pub fn constants(&self) -> &ConstantTable {
        &self.constants
    }

    pub fn pd_args(&self) -> Option<&PdArgs> {
        self.def.pd_args.as_ref()
    }

    /// Change one constant. Derived transfer functions must be rebuilt
    /// afterwards; a [`LoopCache`] notices through the version counter.
    pub fn update_constant(&mut self, name: &str, value: f64) -> ModelResult<u64> {
        self.constants.update(name, value)
    }

    fn build_chain(&self, blocks: &[BlockDef]) -> ModelResult<TransferFunction> {
        let built = blocks
            .iter()
            .map(|b| transfer::build_block(&b.num, &b.den, &self.constants))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(transfer::compose_series(&built))
    }

    pub fn controller(&self) -> ModelResult<TransferFunction> {
        self.build_chain(&self.def.controllers)
    }

    pub fn plant(&self) -> ModelResult<TransferFunction> {
        self.build_chain(&self.def.plants)
    }

    pub fn open_loop(&self) -> ModelResult<TransferFunction> {
        Ok(transfer::combine_loop(&self.controller()?, &self.plant()?))
    }

    pub fn closed_loop(&self) -> ModelResult<TransferFunction> {
        transfer::closed_loop(&self.open_loop()?)
    }

    pub fn disturbance_rejection(&self) -> ModelResult<TransferFunction> {
        let plant = self.plant()?;
        let open_loop = transfer::combine_loop(&self.controller()?, &plant);
        transfer::disturbance_rejection(&plant, &open_loop)
    }

    pub fn select(&self, kind: LoopKind) -> ModelResult<TransferFunction> {
        match kind {
            LoopKind::Ps => self.plant(),
            LoopKind::Ls => self.open_loop(),
            LoopKind::Ws => self.closed_loop(),
            LoopKind::Eds => self.disturbance_rejection(),
        }
    }

    /// Build every loop transfer function at once, tagged with the constants
    /// version they were derived from.
    pub fn derive(&self) -> ModelResult<DerivedLoop> {
        let controller = self.controller()?;
        let plant = self.plant()?;
        let open_loop = transfer::combine_loop(&controller, &plant);
        let closed_loop = transfer::closed_loop(&open_loop)?;
        let disturbance = transfer::disturbance_rejection(&plant, &open_loop)?;
        Ok(DerivedLoop {
            version: self.constants.version(),
            controller,
            plant,
            open_loop,
            closed_loop,
            disturbance,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedLoop {
    pub version: u64,
    pub controller: TransferFunction,
    pub plant: TransferFunction,
    pub open_loop: TransferFunction,
    pub closed_loop: TransferFunction,
    pub disturbance: TransferFunction,
}

impl DerivedLoop {
    pub fn get(&self, kind: LoopKind) -> &TransferFunction {
        match kind {
            LoopKind::Ps => &self.plant,
            LoopKind::Ls => &self.open_loop,
            LoopKind::Ws => &self.closed_loop,
            LoopKind::Eds => &self.disturbance,
        }
    }
}

/// Memoized [`DerivedLoop`] for a single [`LoopModel`].
///
/// Rebuilt lazily whenever the model's constants version moves on.
#[derive(Debug, Default)]
pub struct LoopCache {
    derived: Option<DerivedLoop>,
}

impl LoopCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fresh(&self, model: &LoopModel) -> bool {
        self.derived
            .as_ref()
            .is_some_and(|d| d.version == model.constants().version())
    }

    pub fn get(&mut self, model: &LoopModel) -> ModelResult<&DerivedLoop> {
        let derived = match self.derived.take() {
            Some(d) if d.version == model.constants().version() => d,
            _ => {
                debug!(version = model.constants().version(), "rebuilding loop");
                model.derive()?
            }
        };
        Ok(self.derived.insert(derived))
    }
}
