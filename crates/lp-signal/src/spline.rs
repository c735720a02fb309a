//! Not-a-knot cubic spline interpolation.
//!
//! The not-a-knot end conditions (third derivative continuous at the second
//! and second-to-last knots) are folded into the first and last interior
//! equations, which leaves a tridiagonal system for the interior second
//! derivatives.

use crate::error::{SignalError, SignalResult};

#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative at each knot.
    m: Vec<f64>,
}

impl CubicSpline {
    pub fn not_a_knot(xs: &[f64], ys: &[f64]) -> SignalResult<Self> {
        let n = xs.len();
        if ys.len() != n {
            return Err(SignalError::LengthMismatch {
                what: "spline knots".into(),
                expected: n,
                got: ys.len(),
            });
        }
        if n < 2 {
            return Err(SignalError::InsufficientData {
                what: "spline",
                got: n,
                need: 2,
            });
        }
        if xs.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(SignalError::InvalidArg {
                what: "spline knots must be strictly increasing",
            });
        }

        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        let m = match n {
            2 => vec![0.0; 2],
            3 => {
                // Single parabola through all three points.
                let curvature = 2.0 * (slope[1] - slope[0]) / (h[0] + h[1]);
                vec![curvature; 3]
            }
            _ => second_derivatives(&h, &slope),
        };

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            m,
        })
    }

    /// Value at `x`. Outside the knots the end polynomials are extended.
    pub fn eval(&self, x: f64) -> f64 {
        let last = self.xs.len() - 2;
        let i = self.xs.partition_point(|&k| k <= x).saturating_sub(1).min(last);

        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let (m0, m1) = (self.m[i], self.m[i + 1]);
        let h = x1 - x0;
        let a = x1 - x;
        let b = x - x0;

        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }
}

/// Solve for all knot curvatures with `n >= 4` knots.
fn second_derivatives(h: &[f64], slope: &[f64]) -> Vec<f64> {
    let n = h.len() + 1;
    let k = n - 2; // interior unknowns M_1 ..= M_{n-2}

    let mut sub = vec![0.0; k];
    let mut diag = vec![0.0; k];
    let mut sup = vec![0.0; k];
    let mut rhs = vec![0.0; k];

    for j in 0..k {
        let i = j + 1;
        sub[j] = h[i - 1];
        diag[j] = 2.0 * (h[i - 1] + h[i]);
        sup[j] = h[i];
        rhs[j] = 6.0 * (slope[i] - slope[i - 1]);
    }

    // Eliminate M_0 from the first row and M_{n-1} from the last.
    let (h0, h1) = (h[0], h[1]);
    diag[0] = 3.0 * h0 + 2.0 * h1 + h0 * h0 / h1;
    sup[0] = h1 - h0 * h0 / h1;
    let (ha, hb) = (h[n - 3], h[n - 2]);
    sub[k - 1] = ha - hb * hb / ha;
    diag[k - 1] = 2.0 * ha + 3.0 * hb + hb * hb / ha;

    let inner = thomas(&sub, &diag, &sup, &rhs);

    let mut m = Vec::with_capacity(n);
    m.push(inner[0] * (1.0 + h0 / h1) - (h0 / h1) * inner[1]);
    m.extend_from_slice(&inner);
    m.push(inner[k - 1] * (1.0 + hb / ha) - (hb / ha) * inner[k - 2]);
    m
}

/// Tridiagonal solve. `sub[0]` and `sup[last]` are ignored.
fn thomas(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    c[0] = sup[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - sub[i] * c[i - 1];
        c[i] = if i + 1 < n { sup[i] / denom } else { 0.0 };
        d[i] = (rhs[i] - sub[i] * d[i - 1]) / denom;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d[i] - c[i] * x[i + 1];
    }
    x
}
