//! Named model constants and their fixed-point resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::expr::{Expr, ExprError, Scope};

/// A literal number or an expression string.
///
/// Used both for constant definitions and for transfer-function terms, so
/// model files may write `1` or `"1"` interchangeably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueDef {
    Number(f64),
    Expr(String),
}

impl From<f64> for ValueDef {
    fn from(v: f64) -> Self {
        ValueDef::Number(v)
    }
}

impl From<&str> for ValueDef {
    fn from(s: &str) -> Self {
        ValueDef::Expr(s.to_string())
    }
}

impl ValueDef {
    /// Evaluate against `scope`. `context` names the value in error messages.
    pub fn evaluate(&self, scope: &dyn Scope, context: &str) -> ModelResult<f64> {
        match self {
            ValueDef::Number(v) => Ok(*v),
            ValueDef::Expr(src) => Expr::parse(src)
                .and_then(|e| e.eval(scope))
                .map_err(|e| ModelError::expression(context, e)),
        }
    }
}

/// Resolved constants plus a version counter bumped on every update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantTable {
    values: BTreeMap<String, f64>,
    version: u64,
}

impl ConstantTable {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Overwrite one constant. Only names that already exist may be updated.
    pub fn update(&mut self, name: &str, value: f64) -> ModelResult<u64> {
        let slot = self
            .values
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownConstant {
                name: name.to_string(),
            })?;
        *slot = lp_core::ensure_finite(value, "constant update")?;
        self.version += 1;
        debug!(name, value, version = self.version, "constant updated");
        Ok(self.version)
    }
}

impl Scope for ConstantTable {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name)
    }
}

/// Resolve a raw constant mapping into a flat numeric table.
///
/// Expressions are retried pass after pass; one that fails only because a name
/// is not resolved yet is deferred. A pass that makes no progress ends the
/// resolution with [`ModelError::CircularOrUndefinedConstant`].
pub fn resolve(raw: &BTreeMap<String, ValueDef>) -> ModelResult<ConstantTable> {
    let mut values = BTreeMap::new();
    let mut pending: Vec<(&String, Expr)> = Vec::new();

    for (name, def) in raw {
        match def {
            ValueDef::Number(v) => {
                values.insert(name.clone(), *v);
            }
            ValueDef::Expr(src) => {
                let expr = Expr::parse(src).map_err(|e| ModelError::expression(name, e))?;
                pending.push((name, expr));
            }
        }
    }

    let mut pass = 0;
    while !pending.is_empty() {
        pass += 1;
        let before = pending.len();
        let mut deferred = Vec::new();

        for (name, expr) in pending {
            match expr.eval(&values) {
                Ok(v) => {
                    values.insert(name.clone(), v);
                }
                Err(ExprError::UnknownName { .. }) => deferred.push((name, expr)),
                Err(e) => return Err(ModelError::expression(name, e)),
            }
        }

        debug!(
            pass,
            resolved = before - deferred.len(),
            remaining = deferred.len(),
            "constant resolution pass"
        );

        if deferred.len() == before {
            return Err(ModelError::CircularOrUndefinedConstant {
                names: deferred.into_iter().map(|(n, _)| n.clone()).collect(),
            });
        }
        pending = deferred;
    }

    Ok(ConstantTable { values, version: 0 })
}
