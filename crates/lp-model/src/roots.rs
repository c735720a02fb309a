//! Poles and zeros via companion-matrix eigenvalues.

use lp_core::{Complex64, Polynomial};
use nalgebra::DMatrix;

use crate::transfer::TransferFunction;

/// All complex roots of `p`, sorted by real then imaginary part.
///
/// Constants (including the zero polynomial) have no roots.
pub fn roots(p: &Polynomial) -> Vec<Complex64> {
    let n = p.degree();
    if n == 0 {
        return Vec::new();
    }
    let c = p.coefficients();
    let lead = p.leading();

    // Companion matrix of the monic polynomial: first row holds -a_k / a_0,
    // ones on the sub-diagonal.
    let mut m = DMatrix::<f64>::zeros(n, n);
    for k in 0..n {
        m[(0, k)] = -c[k + 1] / lead;
    }
    for i in 1..n {
        m[(i, i - 1)] = 1.0;
    }

    let mut out: Vec<Complex64> = m.complex_eigenvalues().iter().copied().collect();
    out.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
    out
}

pub fn poles(tf: &TransferFunction) -> Vec<Complex64> {
    roots(tf.den())
}

pub fn zeros(tf: &TransferFunction) -> Vec<Complex64> {
    roots(tf.num())
}

/// Every pole strictly in the open left half plane.
pub fn is_stable(tf: &TransferFunction) -> bool {
    poles(tf).iter().all(|p| p.re < 0.0)
}
