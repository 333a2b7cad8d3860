//! Construction errors for the closed-form models.

use thiserror::Error;

/// Rejected model or contract input.
///
/// Each variant carries the offending value converted to `f64`.
///
/// # Examples
/// ```
/// use pricer_models::analytical::AnalyticalError;
///
/// let err = AnalyticalError::InvalidStrike { strike: -5.0 };
/// assert_eq!(err.to_string(), "strike must be finite and >= 0, got -5");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalyticalError {
    /// σ below zero, NaN or infinite.
    #[error("volatility must be finite and >= 0, got {volatility}")]
    InvalidVolatility {
        /// Rejected σ
        volatility: f64,
    },

    /// S0 at or below zero, NaN or infinite.
    #[error("spot must be finite and > 0, got {spot}")]
    InvalidSpot {
        /// Rejected S0
        spot: f64,
    },

    /// K below zero, NaN or infinite.
    #[error("strike must be finite and >= 0, got {strike}")]
    InvalidStrike {
        /// Rejected K
        strike: f64,
    },

    /// T below zero, NaN or infinite.
    #[error("maturity must be finite and >= 0, got {expiry}")]
    InvalidExpiry {
        /// Rejected T
        expiry: f64,
    },
}
