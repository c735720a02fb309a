//! Analytic PID gain design from a target phase margin.
//!
//! Given the plant response `P(jω_c) = u + jv` at the desired crossover and a
//! chosen integral gain, the proportional and derivative gains follow from
//! requiring `C(jω_c)·P(jω_c) = e^{jφ_m}` with `φ_m = PM − 180°`.

use lp_core::{Polynomial, Real, units};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::schema::PdArgs;
use crate::transfer::TransferFunction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdGains {
    pub kp: Real,
    pub ki: Real,
    pub kd: Real,
}

impl PdGains {
    /// The parallel controller `(Kd·s² + Kp·s + Ki) / s`.
    pub fn controller(&self) -> TransferFunction {
        TransferFunction::from_parts(
            Polynomial::new(vec![self.kd, self.kp, self.ki]),
            Polynomial::new(vec![1.0, 0.0]),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdGainSolver {
    phase_margin_deg: Real,
    integral_gain: Real,
    crossover_rad_s: Real,
}

impl PdGainSolver {
    pub fn new(phase_margin_deg: Real, integral_gain: Real, crossover_rad_s: Real) -> ModelResult<Self> {
        if !(phase_margin_deg.is_finite() && integral_gain.is_finite() && crossover_rad_s.is_finite()) {
            return Err(ModelError::InvalidArg {
                what: "PD design inputs must be finite",
            });
        }
        if crossover_rad_s <= 0.0 {
            return Err(ModelError::InvalidArg {
                what: "crossover frequency must be positive",
            });
        }
        Ok(Self {
            phase_margin_deg,
            integral_gain,
            crossover_rad_s,
        })
    }

    pub fn from_args(args: &PdArgs) -> ModelResult<Self> {
        Self::new(args.phase_margin_deg, args.integral_gain, args.crossover_rad_s)
    }

    pub fn solve(&self, plant: &TransferFunction) -> ModelResult<PdGains> {
        let wc = self.crossover_rad_s;
        let p = plant.freq_response(wc);
        let (u, v) = (p.re, p.im);
        let mag2 = u * u + v * v;

        if !(u.is_finite() && v.is_finite()) {
            return Err(ModelError::DegenerateEvaluation {
                what: format!("plant has a pole at s = j{wc}"),
            });
        }
        if mag2 == 0.0 {
            return Err(ModelError::DegenerateEvaluation {
                what: format!("plant has a zero at s = j{wc}"),
            });
        }

        let phi = units::degrees_to_radians(self.phase_margin_deg) - std::f64::consts::PI;
        let (sin, cos) = phi.sin_cos();

        let kp = (u * cos + v * sin) / mag2;
        let kd = self.integral_gain / (wc * wc) + (u * sin - v * cos) / (wc * mag2);

        debug!(u, v, kp, kd, "PD gains solved");
        Ok(PdGains {
            kp,
            ki: self.integral_gain,
            kd,
        })
    }
}

/// Free-function form of [`PdGainSolver::solve`].
pub fn solve(
    plant: &TransferFunction,
    phase_margin_deg: Real,
    integral_gain: Real,
    crossover_rad_s: Real,
) -> ModelResult<PdGains> {
    PdGainSolver::new(phase_margin_deg, integral_gain, crossover_rad_s)?.solve(plant)
}

pub fn solve_from_args(plant: &TransferFunction, args: &PdArgs) -> ModelResult<PdGains> {
    PdGainSolver::from_args(args)?.solve(plant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::combine_loop;
    use approx::assert_relative_eq;

    #[test]
    fn open_loop_hits_target_at_crossover() {
        // P = 1 / (s (s + 1))
        let plant = TransferFunction::from_coefficients(&[1.0], &[1.0, 1.0, 0.0]).unwrap();
        let gains = solve(&plant, 60.0, 0.2, 2.0).unwrap();

        let l = combine_loop(&gains.controller(), &plant).freq_response(2.0);
        assert_relative_eq!(l.norm(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(l.arg().to_degrees(), 60.0 - 180.0, epsilon = 1e-9);
        assert_eq!(gains.ki, 0.2);
    }

    #[test]
    fn zero_at_crossover_is_degenerate() {
        // P = s^2 + 4 vanishes at s = 2j
        let plant = TransferFunction::from_coefficients(&[1.0, 0.0, 4.0], &[1.0]).unwrap();
        let err = solve(&plant, 45.0, 0.0, 2.0).unwrap_err();
        assert!(matches!(err, ModelError::DegenerateEvaluation { .. }));
    }

    #[test]
    fn pole_at_crossover_is_degenerate() {
        let plant = TransferFunction::from_coefficients(&[1.0], &[1.0, 0.0, 4.0]).unwrap();
        let err = solve(&plant, 45.0, 0.0, 2.0).unwrap_err();
        assert!(matches!(err, ModelError::DegenerateEvaluation { .. }));
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(PdGainSolver::new(45.0, 0.0, 0.0).is_err());
        assert!(PdGainSolver::new(f64::NAN, 0.0, 1.0).is_err());
    }
}
