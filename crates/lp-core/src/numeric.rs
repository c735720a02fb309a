use crate::CoreError;

pub type Real = f64;

/// Absolute floor plus relative band for comparing computed coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Tolerances {
    pub const fn new(abs: Real, rel: Real) -> Self {
        Self { abs, rel }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::new(1e-12, 1e-9)
    }
}

/// `|a - b|` within `tol.abs`, or within `tol.rel` of the larger magnitude.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let gap = (a - b).abs();
    gap <= tol.abs || gap <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Arithmetic mean. Empty input yields `None`.
pub fn mean(values: &[Real]) -> Option<Real> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<Real>() / values.len() as Real)
}

/// Sample variance (one delta degree of freedom).
///
/// A single value has zero spread, so it reports `0.0` instead of dividing by zero.
pub fn sample_variance(values: &[Real]) -> Option<Real> {
    let m = mean(values)?;
    if values.len() < 2 {
        return Some(0.0);
    }
    let ss: Real = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / (values.len() - 1) as Real)
}

/// Piecewise-linear interpolation over ascending `xs`, clamped to the end values
/// outside the sampled range.
pub fn interp_linear(x: Real, xs: &[Real], ys: &[Real]) -> Option<Real> {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return None;
    }
    if x <= xs[0] {
        return Some(ys[0]);
    }
    if x >= xs[n - 1] {
        return Some(ys[n - 1]);
    }
    let hi = xs[..n].partition_point(|&v| v <= x);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span == 0.0 {
        return Some(ys[lo]);
    }
    let w = (x - xs[lo]) / span;
    Some(ys[lo] + w * (ys[hi] - ys[lo]))
}

/// `n` points spaced evenly on a log10 scale between `lo` and `hi` inclusive.
pub fn log_space(lo: Real, hi: Real, n: usize) -> Result<Vec<Real>, CoreError> {
    if lo <= 0.0 || hi <= lo {
        return Err(CoreError::InvalidArg {
            what: "log_space requires 0 < lo < hi",
        });
    }
    if n < 2 {
        return Err(CoreError::InvalidArg {
            what: "log_space requires at least two points",
        });
    }
    let (a, b) = (lo.log10(), hi.log10());
    let step = (b - a) / (n - 1) as Real;
    Ok((0..n).map(|i| 10f64.powf(a + step * i as Real)).collect())
}
