//! Dense real polynomials in the Laplace variable `s`.
//!
//! Coefficients are stored highest degree first, the same order control
//! tooling exchanges numerator/denominator arrays in. Leading zeros are
//! always trimmed, so the zero polynomial is exactly `[0.0]`.

use core::fmt;
use core::ops::{Add, Mul};

use num_complex::Complex64;

use crate::Real;

#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<Real>", into = "Vec<Real>"))]
pub struct Polynomial {
    coeffs: Vec<Real>,
}

impl Polynomial {
    /// Build from coefficients, highest degree first.
    pub fn new(coeffs: Vec<Real>) -> Self {
        let first_nonzero = coeffs.iter().position(|&c| c != 0.0);
        let coeffs = match first_nonzero {
            Some(0) => coeffs,
            Some(i) => coeffs[i..].to_vec(),
            None => vec![0.0],
        };
        Self { coeffs }
    }

    pub fn constant(c: Real) -> Self {
        Self::new(vec![c])
    }

    pub fn one() -> Self {
        Self::constant(1.0)
    }

    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    /// Coefficients, highest degree first.
    pub fn coefficients(&self) -> &[Real] {
        &self.coeffs
    }

    /// Degree of the polynomial. The zero polynomial reports degree 0.
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0] == 0.0
    }

    pub fn leading(&self) -> Real {
        self.coeffs[0]
    }

    /// Horner evaluation at a real point.
    pub fn eval(&self, x: Real) -> Real {
        self.coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Horner evaluation at a complex point, e.g. `s = jω`.
    pub fn eval_complex(&self, s: Complex64) -> Complex64 {
        self.coeffs
            .iter()
            .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * s + c)
    }
}

impl From<Vec<Real>> for Polynomial {
    fn from(coeffs: Vec<Real>) -> Self {
        Self::new(coeffs)
    }
}

impl From<Polynomial> for Vec<Real> {
    fn from(p: Polynomial) -> Self {
        p.coeffs
    }
}

/// Polynomial product by direct convolution.
impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut out = vec![0.0; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial::new(out)
    }
}

/// Polynomial sum, aligned on the constant term.
impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        let mut out = vec![0.0; n];
        let off_a = n - self.coeffs.len();
        let off_b = n - rhs.coeffs.len();
        for (i, &a) in self.coeffs.iter().enumerate() {
            out[off_a + i] += a;
        }
        for (i, &b) in rhs.coeffs.iter().enumerate() {
            out[off_b + i] += b;
        }
        Polynomial::new(out)
    }
}

impl fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polynomial({:?})", self.coeffs)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.degree();
        let mut first = true;
        for (i, &c) in self.coeffs.iter().enumerate() {
            let power = n - i;
            if c == 0.0 && !(first && power == 0) {
                continue;
            }
            if !first {
                f.write_str(if c < 0.0 { " - " } else { " + " })?;
            } else if c < 0.0 {
                f.write_str("-")?;
            }
            let mag = c.abs();
            match power {
                0 => write!(f, "{mag}")?,
                1 => write!(f, "{mag}*s")?,
                p => write!(f, "{mag}*s^{p}")?,
            }
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn trims_leading_zeros() {
        let p = Polynomial::new(vec![0.0, 0.0, 1.0, 2.0]);
        assert_eq!(p.coefficients(), &[1.0, 2.0]);
        assert_eq!(p.degree(), 1);

        let z = Polynomial::new(vec![0.0, 0.0]);
        assert!(z.is_zero());
        assert_eq!(z.coefficients(), &[0.0]);
        assert!(Polynomial::new(vec![]).is_zero());
    }

    #[test]
    fn product_and_sum() {
        // (s + 1)(s + 2) = s^2 + 3s + 2
        let a = Polynomial::new(vec![1.0, 1.0]);
        let b = Polynomial::new(vec![1.0, 2.0]);
        assert_eq!((&a * &b).coefficients(), &[1.0, 3.0, 2.0]);

        // (s^2 + 3s + 2) + 5 = s^2 + 3s + 7
        let c = &(&a * &b) + &Polynomial::constant(5.0);
        assert_eq!(c.coefficients(), &[1.0, 3.0, 7.0]);
    }

    #[test]
    fn sum_cancels_leading_term() {
        let a = Polynomial::new(vec![1.0, 2.0]);
        let b = Polynomial::new(vec![-1.0, 3.0]);
        assert_eq!((&a + &b).coefficients(), &[5.0]);
    }

    #[test]
    fn evaluation_real_and_complex() {
        let p = Polynomial::new(vec![1.0, 3.0, 2.0]);
        assert_eq!(p.eval(1.0), 6.0);

        // s = j: -1 + 3j + 2 = 1 + 3j
        let v = p.eval_complex(Complex64::new(0.0, 1.0));
        assert_relative_eq!(v.re, 1.0);
        assert_relative_eq!(v.im, 3.0);
    }

    #[test]
    fn display_is_readable() {
        let p = Polynomial::new(vec![2.0, 0.0, -1.5]);
        assert_eq!(format!("{p}"), "2*s^2 - 1.5");
        assert_eq!(format!("{}", Polynomial::zero()), "0");
    }
}
