//! Analytical pricing formulas for European options.
//!
//! - [`distributions`]: standard normal CDF/PDF
//! - [`black_scholes`]: lognormal closed form with `d1`/`d2`
//! - [`error`]: construction errors

pub mod black_scholes;
pub mod distributions;
pub mod error;

pub use black_scholes::BlackScholes;
pub use distributions::{norm_cdf, norm_pdf};
pub use error::AnalyticalError;

use num_traits::Float;

/// Converts an `f64` literal into `T`, yielding NaN if `T` cannot hold it.
#[inline]
pub(crate) fn lit<T: Float>(x: f64) -> T {
    T::from(x).unwrap_or_else(T::nan)
}
