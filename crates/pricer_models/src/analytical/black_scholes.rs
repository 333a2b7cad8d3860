//! Black-Scholes pricing model for European options.
//!
//! ## Mathematical Formulas
//!
//! **Call Price**: C = S·N(d₁) - K·e^(-rT)·N(d₂)
//! **Put Price**: P = K·e^(-rT)·N(-d₂) - S·N(-d₁)
//!
//! Where:
//! - d₁ = (ln(S/K) + (r + σ²/2)T) / (σ√T)
//! - d₂ = d₁ - σ√T
//!
//! When σ√T vanishes the lognormal law collapses onto the forward and the
//! prices reduce to their deterministic limits, e.g. C = max(S - K·e^(-rT), 0).

use num_traits::Float;

use super::distributions::norm_cdf;
use super::error::AnalyticalError;
use super::lit;

/// Total-variance threshold below which the deterministic limit is used.
const DEGENERATE_VOL_SQRT_T: f64 = 1e-12;

/// Black-Scholes model for European option pricing.
///
/// # Examples
/// ```
/// use pricer_models::analytical::BlackScholes;
///
/// let bs = BlackScholes::new(100.0_f64, 0.05, 0.2).unwrap();
/// let call_price = bs.price_call(100.0, 1.0);
/// let put_price = bs.price_put(100.0, 1.0);
///
/// // Put-call parity: C - P = S - K*exp(-rT)
/// let parity = call_price - put_price - (100.0 - 100.0 * (-0.05_f64).exp());
/// assert!(parity.abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BlackScholes<T: Float> {
    spot: T,
    rate: T,
    volatility: T,
}

impl<T: Float> BlackScholes<T> {
    /// Creates a new Black-Scholes model.
    ///
    /// Zero volatility is accepted and priced with the deterministic limit.
    ///
    /// # Errors
    /// - `AnalyticalError::InvalidSpot` if spot <= 0 or not finite
    /// - `AnalyticalError::InvalidVolatility` if volatility < 0 or not finite
    pub fn new(spot: T, rate: T, volatility: T) -> Result<Self, AnalyticalError> {
        if !(spot > T::zero() && spot.is_finite()) {
            return Err(AnalyticalError::InvalidSpot {
                spot: spot.to_f64().unwrap_or(f64::NAN),
            });
        }

        if !(volatility >= T::zero() && volatility.is_finite()) {
            return Err(AnalyticalError::InvalidVolatility {
                volatility: volatility.to_f64().unwrap_or(f64::NAN),
            });
        }

        Ok(Self {
            spot,
            rate,
            volatility,
        })
    }

    /// Returns the spot price.
    #[inline]
    pub fn spot(&self) -> T {
        self.spot
    }

    /// Returns the risk-free rate.
    #[inline]
    pub fn rate(&self) -> T {
        self.rate
    }

    /// Returns the volatility.
    #[inline]
    pub fn volatility(&self) -> T {
        self.volatility
    }

    /// Checks a contract's strike and expiry against this model.
    ///
    /// # Errors
    /// - `AnalyticalError::InvalidStrike` if strike < 0 or not finite
    /// - `AnalyticalError::InvalidExpiry` if expiry < 0 or not finite
    pub fn check_contract(&self, strike: T, expiry: T) -> Result<(), AnalyticalError> {
        if !(strike >= T::zero() && strike.is_finite()) {
            return Err(AnalyticalError::InvalidStrike {
                strike: strike.to_f64().unwrap_or(f64::NAN),
            });
        }
        if !(expiry >= T::zero() && expiry.is_finite()) {
            return Err(AnalyticalError::InvalidExpiry {
                expiry: expiry.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }

    /// Discount factor e^(-rT).
    #[inline]
    pub fn discount_factor(&self, expiry: T) -> T {
        (-self.rate * expiry).exp()
    }

    #[inline]
    fn is_degenerate(&self, expiry: T) -> bool {
        self.volatility * expiry.sqrt() <= lit(DEGENERATE_VOL_SQRT_T)
    }

    /// d₁ = (ln(S/K) + (r + σ²/2)T) / (σ√T)
    ///
    /// Infinite (signed by moneyness against the discounted strike) when σ√T
    /// vanishes.
    #[inline]
    pub fn d1(&self, strike: T, expiry: T) -> T {
        if self.is_degenerate(expiry) {
            let forward_gap = self.spot - strike * self.discount_factor(expiry);
            return if forward_gap > T::zero() {
                T::infinity()
            } else if forward_gap < T::zero() {
                T::neg_infinity()
            } else {
                T::zero()
            };
        }

        let vol_sqrt_t = self.volatility * expiry.sqrt();
        let log_moneyness = (self.spot / strike).ln();
        let drift = (self.rate + lit::<T>(0.5) * self.volatility * self.volatility) * expiry;

        (log_moneyness + drift) / vol_sqrt_t
    }

    /// d₂ = d₁ - σ√T
    #[inline]
    pub fn d2(&self, strike: T, expiry: T) -> T {
        self.d1(strike, expiry) - self.volatility * expiry.sqrt()
    }

    /// European call price: C = S·N(d₁) - K·e^(-rT)·N(d₂).
    ///
    /// # Examples
    /// ```
    /// use pricer_models::analytical::BlackScholes;
    ///
    /// let bs = BlackScholes::new(100.0_f64, 0.01, 0.2).unwrap();
    /// let price = bs.price_call(100.0, 1.0);
    /// assert!((price - 8.4333).abs() < 1e-4);
    /// ```
    #[inline]
    pub fn price_call(&self, strike: T, expiry: T) -> T {
        let discounted_strike = strike * self.discount_factor(expiry);

        if self.is_degenerate(expiry) {
            return (self.spot - discounted_strike).max(T::zero());
        }

        let d1 = self.d1(strike, expiry);
        let d2 = self.d2(strike, expiry);
        self.spot * norm_cdf(d1) - discounted_strike * norm_cdf(d2)
    }

    /// European put price: P = K·e^(-rT)·N(-d₂) - S·N(-d₁).
    #[inline]
    pub fn price_put(&self, strike: T, expiry: T) -> T {
        let discounted_strike = strike * self.discount_factor(expiry);

        if self.is_degenerate(expiry) {
            return (discounted_strike - self.spot).max(T::zero());
        }

        let d1 = self.d1(strike, expiry);
        let d2 = self.d2(strike, expiry);
        discounted_strike * norm_cdf(-d2) - self.spot * norm_cdf(-d1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_rejects_bad_inputs() {
        assert!(matches!(
            BlackScholes::new(0.0_f64, 0.05, 0.2),
            Err(AnalyticalError::InvalidSpot { .. })
        ));
        assert!(matches!(
            BlackScholes::new(100.0_f64, 0.05, -0.2),
            Err(AnalyticalError::InvalidVolatility { .. })
        ));
        assert!(matches!(
            BlackScholes::new(100.0_f64, 0.05, f64::NAN),
            Err(AnalyticalError::InvalidVolatility { .. })
        ));
        assert!(BlackScholes::new(100.0_f64, 0.05, 0.0).is_ok());
    }

    #[test]
    fn test_check_contract() {
        let bs = BlackScholes::new(100.0_f64, 0.05, 0.2).unwrap();
        assert!(bs.check_contract(0.0, 0.0).is_ok());
        assert_eq!(
            bs.check_contract(-1.0, 1.0),
            Err(AnalyticalError::InvalidStrike { strike: -1.0 })
        );
        assert!(matches!(
            bs.check_contract(100.0, f64::INFINITY),
            Err(AnalyticalError::InvalidExpiry { .. })
        ));
    }

    #[test]
    fn test_atm_call_reference() {
        // Hull, Options Futures & Other Derivatives: S=K=100, r=5%, σ=20%, T=1
        let bs = BlackScholes::new(100.0_f64, 0.05, 0.2).unwrap();
        assert_relative_eq!(bs.price_call(100.0, 1.0), 10.450583572185565, epsilon = 1e-6);
        assert_relative_eq!(bs.price_put(100.0, 1.0), 5.573526022256971, epsilon = 1e-6);
    }

    #[test]
    fn test_put_call_parity() {
        let bs = BlackScholes::new(105.0_f64, 0.03, 0.35).unwrap();
        for strike in [60.0, 90.0, 105.0, 130.0, 200.0] {
            let lhs = bs.price_call(strike, 2.0) - bs.price_put(strike, 2.0);
            let rhs = 105.0 - strike * (-0.03_f64 * 2.0).exp();
            assert_relative_eq!(lhs, rhs, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_zero_volatility_limit() {
        let bs = BlackScholes::new(100.0_f64, 0.01, 0.0).unwrap();
        let expected = 100.0 - 90.0 * (-0.01_f64).exp();
        assert_relative_eq!(bs.price_call(90.0, 1.0), expected, epsilon = 1e-12);
        assert_eq!(bs.price_put(90.0, 1.0), 0.0);
    }

    #[test]
    fn test_zero_expiry_is_intrinsic() {
        let bs = BlackScholes::new(100.0_f64, 0.05, 0.2).unwrap();
        assert_eq!(bs.price_call(100.0, 0.0), 0.0);
        assert_relative_eq!(bs.price_call(80.0, 0.0), 20.0, epsilon = 1e-12);
        assert_relative_eq!(bs.price_put(120.0, 0.0), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_d2_relation() {
        let bs = BlackScholes::new(100.0_f64, 0.02, 0.25).unwrap();
        let d1 = bs.d1(95.0, 0.5);
        let d2 = bs.d2(95.0, 0.5);
        assert_relative_eq!(d1 - d2, 0.25 * 0.5_f64.sqrt(), epsilon = 1e-14);
    }
}
