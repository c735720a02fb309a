//! Unit-step response of a transfer function by fixed-step RK4.
//!
//! The transfer function is realised in controllable canonical form and
//! integrated with a constant unit input from a zero initial state.

use lp_core::Real;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::roots::poles;
use crate::transfer::TransferFunction;

const MIN_HORIZON_S: Real = 1.0;
const MAX_HORIZON_S: Real = 1000.0;
const HORIZON_TIME_CONSTANTS: Real = 7.0;
/// Largest `|λ|·h` allowed per RK4 substep.
const MAX_STEP_STIFFNESS: Real = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepOptions {
    /// Simulation horizon in seconds. `None` picks one from the slowest pole.
    pub t_end: Option<Real>,
    pub samples: usize,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            t_end: None,
            samples: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTrace {
    pub times: Vec<Real>,
    pub values: Vec<Real>,
}

struct StateSpace {
    a: DMatrix<Real>,
    b: DVector<Real>,
    c: DVector<Real>,
    d: Real,
}

impl StateSpace {
    fn controllable_canonical(tf: &TransferFunction) -> ModelResult<Self> {
        let num = tf.num();
        let den = tf.den();
        let n = den.degree();
        if num.degree() > n {
            return Err(ModelError::ImproperSystem {
                num_degree: num.degree(),
                den_degree: n,
            });
        }

        let lead = den.leading();
        let a: Vec<Real> = den.coefficients().iter().map(|v| v / lead).collect();
        let mut b = vec![0.0; n + 1];
        let offset = n - num.degree();
        for (i, v) in num.coefficients().iter().enumerate() {
            b[offset + i] = v / lead;
        }

        let d = b[0];
        let mut am = DMatrix::<Real>::zeros(n, n);
        let mut c = DVector::<Real>::zeros(n);
        for k in 0..n {
            // State k holds the (k)th derivative of the internal variable.
            if k + 1 < n {
                am[(k, k + 1)] = 1.0;
            }
            am[(n - 1, k)] = -a[n - k];
            c[k] = b[n - k] - d * a[n - k];
        }
        let mut bv = DVector::<Real>::zeros(n);
        if n > 0 {
            bv[n - 1] = 1.0;
        }

        Ok(Self { a: am, b: bv, c, d })
    }

    fn derivative(&self, x: &DVector<Real>, u: Real) -> DVector<Real> {
        &self.a * x + &self.b * u
    }

    fn rk4_step(&self, x: &DVector<Real>, u: Real, h: Real) -> DVector<Real> {
        let k1 = self.derivative(x, u);
        let k2 = self.derivative(&(x + &k1 * (h / 2.0)), u);
        let k3 = self.derivative(&(x + &k2 * (h / 2.0)), u);
        let k4 = self.derivative(&(x + &k3 * h), u);
        x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
    }

    fn output(&self, x: &DVector<Real>, u: Real) -> Real {
        self.c.dot(x) + self.d * u
    }
}

/// Horizon covering roughly seven time constants of the slowest pole.
pub fn default_horizon(tf: &TransferFunction) -> Real {
    let slowest = poles(tf)
        .iter()
        .map(|p| p.re.abs())
        .fold(Real::INFINITY, Real::min);
    if slowest.is_infinite() {
        return MIN_HORIZON_S;
    }
    (HORIZON_TIME_CONSTANTS / slowest).clamp(MIN_HORIZON_S, MAX_HORIZON_S)
}

pub fn simulate_step(tf: &TransferFunction, opts: StepOptions) -> ModelResult<StepTrace> {
    if opts.samples < 2 {
        return Err(ModelError::InvalidArg {
            what: "step simulation needs at least two samples",
        });
    }
    let t_end = match opts.t_end {
        Some(t) if t.is_finite() && t > 0.0 => t,
        Some(_) => {
            return Err(ModelError::InvalidArg {
                what: "step horizon must be positive and finite",
            });
        }
        None => default_horizon(tf),
    };

    let ss = StateSpace::controllable_canonical(tf)?;
    let dt = t_end / (opts.samples - 1) as Real;
    let fastest = poles(tf).iter().map(|p| p.norm()).fold(0.0, Real::max);
    let substeps = ((fastest * dt / MAX_STEP_STIFFNESS).ceil() as usize).max(1);
    let h = dt / substeps as Real;

    debug!(t_end, dt, substeps, order = ss.b.len(), "simulating step response");

    let u = 1.0;
    let mut x = DVector::<Real>::zeros(ss.b.len());
    let mut times = Vec::with_capacity(opts.samples);
    let mut values = Vec::with_capacity(opts.samples);

    for i in 0..opts.samples {
        times.push(i as Real * dt);
        values.push(ss.output(&x, u));
        for _ in 0..substeps {
            x = ss.rk4_step(&x, u, h);
        }
    }

    Ok(StepTrace { times, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_order_matches_exponential() {
        // 10 / (2s + 1): y = 10 (1 - e^{-t/2})
        let tf = TransferFunction::from_coefficients(&[10.0], &[2.0, 1.0]).unwrap();
        let trace = simulate_step(
            &tf,
            StepOptions {
                t_end: Some(10.0),
                samples: 101,
            },
        )
        .unwrap();

        assert_eq!(trace.times.len(), 101);
        for (t, y) in trace.times.iter().zip(&trace.values) {
            assert_abs_diff_eq!(*y, 10.0 * (1.0 - (-t / 2.0).exp()), epsilon = 1e-4);
        }
    }

    #[test]
    fn feedthrough_and_second_order() {
        // (s + 3) / (s^2 + 3s + 2): final value 1.5, starts at 0.
        let tf = TransferFunction::from_coefficients(&[1.0, 3.0], &[1.0, 3.0, 2.0]).unwrap();
        let trace = simulate_step(&tf, StepOptions::default()).unwrap();
        assert_abs_diff_eq!(trace.values[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(*trace.values.last().unwrap(), 1.5, epsilon = 1e-2);

        // Biproper: (2s + 1) / (s + 1) jumps to 2 at t = 0.
        let tf = TransferFunction::from_coefficients(&[2.0, 1.0], &[1.0, 1.0]).unwrap();
        let trace = simulate_step(&tf, StepOptions::default()).unwrap();
        assert_abs_diff_eq!(trace.values[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(*trace.values.last().unwrap(), 1.0, epsilon = 1e-2);
    }

    #[test]
    fn default_horizon_follows_slowest_pole() {
        let tf = TransferFunction::from_coefficients(&[1.0], &[1.0, 3.0, 2.0]).unwrap();
        assert_abs_diff_eq!(default_horizon(&tf), 7.0, epsilon = 1e-9);
        let gain = TransferFunction::from_coefficients(&[3.0], &[1.0]).unwrap();
        assert_eq!(default_horizon(&gain), MIN_HORIZON_S);
    }

    #[test]
    fn improper_system_is_rejected() {
        let tf = TransferFunction::from_coefficients(&[1.0, 0.0], &[1.0]).unwrap();
        let err = simulate_step(&tf, StepOptions::default()).unwrap_err();
        assert!(matches!(err, ModelError::ImproperSystem { num_degree: 1, den_degree: 0 }));
    }
}
