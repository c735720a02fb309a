//! Analytic frequency response: Bode sweeps and stability margins.

use lp_core::{Real, log_space, units};
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::transfer::TransferFunction;

/// Default sweep, rad/s.
pub const DEFAULT_OMEGA_MIN: Real = 1e-2;
pub const DEFAULT_OMEGA_MAX: Real = 1e4;
const MARGIN_SWEEP_POINTS: usize = 2000;
const BISECTION_STEPS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodePoint {
    pub omega_rad_s: Real,
    pub magnitude_db: Real,
    pub phase_deg: Real,
}

/// Magnitude and unwrapped phase at each `omegas` entry.
pub fn bode(tf: &TransferFunction, omegas: &[Real]) -> Vec<BodePoint> {
    let mut out: Vec<BodePoint> = Vec::with_capacity(omegas.len());
    for &omega in omegas {
        let g = tf.freq_response(omega);
        let wrapped = units::radians_to_degrees(g.arg());
        let phase_deg = match out.last() {
            Some(prev) => unwrap_near(wrapped, prev.phase_deg),
            None => wrapped,
        };
        out.push(BodePoint {
            omega_rad_s: omega,
            magnitude_db: 20.0 * g.norm().log10(),
            phase_deg,
        });
    }
    out
}

/// Bode sweep over the default range with `n` log-spaced points.
pub fn bode_default(tf: &TransferFunction, n: usize) -> ModelResult<Vec<BodePoint>> {
    let omegas = log_space(DEFAULT_OMEGA_MIN, DEFAULT_OMEGA_MAX, n)?;
    Ok(bode(tf, &omegas))
}

/// Shift `wrapped` by whole turns so it lands closest to `reference`.
fn unwrap_near(wrapped: Real, reference: Real) -> Real {
    wrapped + 360.0 * ((reference - wrapped) / 360.0).round()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StabilityMargins {
    pub gain_margin_db: Option<Real>,
    pub phase_margin_deg: Option<Real>,
    pub phase_crossover_rad_s: Option<Real>,
    pub gain_crossover_rad_s: Option<Real>,
}

/// Gain and phase margins of an open loop over the default sweep.
///
/// The first crossing of each kind is bracketed on a log grid and refined by
/// bisection. A loop that never crosses 0 dB (or -180°) in the sweep reports
/// `None` for the corresponding margin.
pub fn margins(open_loop: &TransferFunction) -> ModelResult<StabilityMargins> {
    let omegas = log_space(DEFAULT_OMEGA_MIN, DEFAULT_OMEGA_MAX, MARGIN_SWEEP_POINTS)?;
    let sweep = bode(open_loop, &omegas);
    let mut out = StabilityMargins::default();

    for pair in sweep.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let crosses = a.magnitude_db.is_finite()
            && b.magnitude_db.is_finite()
            && (a.magnitude_db >= 0.0) != (b.magnitude_db >= 0.0);
        if crosses {
            let wc = bisect(a.omega_rad_s, b.omega_rad_s, |w| {
                20.0 * open_loop.freq_response(w).norm().log10()
            });
            let phase = phase_between(open_loop, wc, &a, &b);
            out.gain_crossover_rad_s = Some(wc);
            out.phase_margin_deg = Some(wrap_180(phase + 180.0));
            break;
        }
    }

    for pair in sweep.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let turn_a = ((a.phase_deg + 180.0) / 360.0).floor();
        let turn_b = ((b.phase_deg + 180.0) / 360.0).floor();
        if turn_a != turn_b {
            // Level of the -180° (mod 360) line between the two samples.
            let level = 360.0 * turn_a.max(turn_b) - 180.0;
            let wpc = bisect(a.omega_rad_s, b.omega_rad_s, |w| {
                phase_between(open_loop, w, &a, &b) - level
            });
            let mag_db = 20.0 * open_loop.freq_response(wpc).norm().log10();
            out.phase_crossover_rad_s = Some(wpc);
            out.gain_margin_db = Some(-mag_db);
            break;
        }
    }

    Ok(out)
}

/// Unwrapped phase at `omega`, kept on the branch of the bracketing samples.
fn phase_between(tf: &TransferFunction, omega: Real, a: &BodePoint, b: &BodePoint) -> Real {
    let span = (b.omega_rad_s / a.omega_rad_s).ln();
    let t = if span > 0.0 {
        (omega / a.omega_rad_s).ln() / span
    } else {
        0.0
    };
    let reference = a.phase_deg + t * (b.phase_deg - a.phase_deg);
    unwrap_near(units::radians_to_degrees(tf.freq_response(omega).arg()), reference)
}

/// Root of `f` between `lo` and `hi`, bisecting in log frequency.
fn bisect(mut lo: Real, mut hi: Real, f: impl Fn(Real) -> Real) -> Real {
    let mut f_lo = f(lo);
    for _ in 0..BISECTION_STEPS {
        let mid = (lo * hi).sqrt();
        let f_mid = f(mid);
        if (f_mid >= 0.0) == (f_lo >= 0.0) {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    (lo * hi).sqrt()
}

fn wrap_180(deg: Real) -> Real {
    let w = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if w == -180.0 { 180.0 } else { w }
}
