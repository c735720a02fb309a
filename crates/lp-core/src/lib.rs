//! lp-core: numeric foundation for loopeval.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - poly (dense polynomials in the Laplace variable)
//! - units (uom conversions for log timestamps, angles, frequencies)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod poly;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use num_complex::Complex64;
pub use numeric::*;
pub use poly::Polynomial;
