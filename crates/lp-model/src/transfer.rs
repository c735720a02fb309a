//! Transfer functions over `s` and the loop algebra that composes them.

use lp_core::{Complex64, Polynomial, Real};
use serde::{Deserialize, Serialize};

use crate::constants::ValueDef;
use crate::error::{ModelError, ModelResult};
use crate::expr::Scope;

/// `num(s) / den(s)` with a non-zero denominator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransferFunction", into = "RawTransferFunction")]
pub struct TransferFunction {
    num: Polynomial,
    den: Polynomial,
}

#[derive(Serialize, Deserialize)]
struct RawTransferFunction {
    num: Polynomial,
    den: Polynomial,
}

impl TryFrom<RawTransferFunction> for TransferFunction {
    type Error = ModelError;

    fn try_from(raw: RawTransferFunction) -> ModelResult<Self> {
        TransferFunction::new(raw.num, raw.den)
    }
}

impl From<TransferFunction> for RawTransferFunction {
    fn from(tf: TransferFunction) -> Self {
        RawTransferFunction {
            num: tf.num,
            den: tf.den,
        }
    }
}

impl TransferFunction {
    pub fn new(num: Polynomial, den: Polynomial) -> ModelResult<Self> {
        if den.is_zero() {
            return Err(ModelError::config("transfer function denominator is zero"));
        }
        Ok(Self { num, den })
    }

    /// Build from polynomials already known to have a non-zero denominator.
    pub(crate) fn from_parts(num: Polynomial, den: Polynomial) -> Self {
        debug_assert!(!den.is_zero());
        Self { num, den }
    }

    /// Convenience constructor from coefficient slices, highest degree first.
    pub fn from_coefficients(num: &[Real], den: &[Real]) -> ModelResult<Self> {
        Self::new(Polynomial::new(num.to_vec()), Polynomial::new(den.to_vec()))
    }

    /// The identity block `1 / 1`.
    pub fn unity() -> Self {
        Self {
            num: Polynomial::one(),
            den: Polynomial::one(),
        }
    }

    pub fn num(&self) -> &Polynomial {
        &self.num
    }

    pub fn den(&self) -> &Polynomial {
        &self.den
    }

    /// `(num, den)` coefficient vectors, highest degree first.
    pub fn coefficients(&self) -> (Vec<Real>, Vec<Real>) {
        (
            self.num.coefficients().to_vec(),
            self.den.coefficients().to_vec(),
        )
    }

    pub fn is_proper(&self) -> bool {
        self.num.degree() <= self.den.degree()
    }

    pub fn eval(&self, s: Complex64) -> Complex64 {
        self.num.eval_complex(s) / self.den.eval_complex(s)
    }

    /// Value on the imaginary axis, `G(jω)`.
    pub fn freq_response(&self, omega: Real) -> Complex64 {
        self.eval(Complex64::new(0.0, omega))
    }

    /// `G(0)`. Infinite when the denominator has a root at the origin.
    pub fn dc_gain(&self) -> Real {
        self.num.eval(0.0) / self.den.eval(0.0)
    }

    /// Series connection `self · other`.
    pub fn series(&self, other: &TransferFunction) -> TransferFunction {
        TransferFunction {
            num: &self.num * &other.num,
            den: &self.den * &other.den,
        }
    }
}

/// Evaluate coefficient terms against `constants` and build one block.
pub fn build_block(
    num_terms: &[ValueDef],
    den_terms: &[ValueDef],
    constants: &dyn Scope,
) -> ModelResult<TransferFunction> {
    let num = eval_terms("numerator", num_terms, constants)?;
    let den = eval_terms("denominator", den_terms, constants)?;
    TransferFunction::new(Polynomial::new(num), Polynomial::new(den))
}

fn eval_terms(side: &str, terms: &[ValueDef], constants: &dyn Scope) -> ModelResult<Vec<Real>> {
    if terms.is_empty() {
        return Err(ModelError::config(format!("{side} term list is empty")));
    }
    terms
        .iter()
        .enumerate()
        .map(|(i, term)| term.evaluate(constants, &format!("{side} term {i}")))
        .collect()
}

/// Product of all blocks. An empty list yields `1 / 1`.
pub fn compose_series<'a, I>(blocks: I) -> TransferFunction
where
    I: IntoIterator<Item = &'a TransferFunction>,
{
    blocks
        .into_iter()
        .fold(TransferFunction::unity(), |acc, b| acc.series(b))
}

/// Open loop `L = C · P`.
pub fn combine_loop(controller: &TransferFunction, plant: &TransferFunction) -> TransferFunction {
    controller.series(plant)
}

/// Unity-feedback closed loop `W = L / (1 + L)`.
pub fn closed_loop(open_loop: &TransferFunction) -> ModelResult<TransferFunction> {
    let den = &open_loop.den + &open_loop.num;
    if den.is_zero() {
        return Err(ModelError::config(
            "closed loop characteristic polynomial is zero",
        ));
    }
    Ok(TransferFunction {
        num: open_loop.num.clone(),
        den,
    })
}

/// Disturbance-to-error transfer `Ed = P / (1 + L)`.
pub fn disturbance_rejection(
    plant: &TransferFunction,
    open_loop: &TransferFunction,
) -> ModelResult<TransferFunction> {
    let characteristic = &open_loop.den + &open_loop.num;
    if characteristic.is_zero() {
        return Err(ModelError::config(
            "closed loop characteristic polynomial is zero",
        ));
    }
    Ok(TransferFunction {
        num: plant.num.clone(),
        den: &plant.den * &characteristic,
    })
}

pub fn coefficients(tf: &TransferFunction) -> (Vec<Real>, Vec<Real>) {
    tf.coefficients()
}
