//! Closed-form cross-check of the Monte Carlo estimate.
//!
//! Only the European call has a reference price. The analytic value is
//! expressed on the same basis as the estimate: discounted when the request
//! discounts payoffs, forward (undiscounted) otherwise.

use pricer_models::analytical::BlackScholes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregate::Estimate;
use crate::error::Result;
use crate::payoff::PayoffKind;
use crate::request::SimulationRequest;

/// Reference price and the estimator's distance from it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticCheck {
    /// Black-Scholes price on the estimate's basis.
    pub analytic_price: f64,
    /// `|estimate − analytic_price|`
    pub absolute_error: f64,
}

/// Black-Scholes price of the request's European call.
///
/// Returns `None` for payoffs without a closed form.
///
/// # Errors
///
/// `InvalidParameter` if the market parameters are outside the model domain.
pub fn analytic_price(request: &SimulationRequest) -> Result<Option<f64>> {
    if request.payoff != PayoffKind::EuropeanCall {
        return Ok(None);
    }

    let market = &request.market;
    let model = BlackScholes::new(market.spot, market.rate, market.volatility)?;
    model.check_contract(market.strike, market.maturity)?;
    let discounted = model.price_call(market.strike, market.maturity);

    if request.discount {
        Ok(Some(discounted))
    } else {
        Ok(Some(discounted / model.discount_factor(market.maturity)))
    }
}

/// Compares an estimate with the closed-form price.
///
/// Returns `None` when the payoff has no closed form. Logs a warning when
/// the simulated drift differs from the discount rate, since the estimate is
/// then not a risk-neutral price.
///
/// # Errors
///
/// `InvalidParameter` if the market parameters are outside the model domain.
///
/// # Examples
///
/// ```rust
/// use pricer_sharding::aggregate::Estimate;
/// use pricer_sharding::validator::analytic_check;
/// use pricer_sharding::{PayoffKind, SimulationRequest};
///
/// let request = SimulationRequest::builder().drift(0.01).build().unwrap();
/// let estimate = Estimate {
///     total_paths_processed: 200_000,
///     estimate: 8.44,
///     stddev: 13.0,
///     stderr: 0.03,
///     confidence_95: (8.38, 8.50),
///     shard_count: 4,
/// };
///
/// let check = analytic_check(&request, &estimate).unwrap().unwrap();
/// assert!((check.analytic_price - 8.4333).abs() < 1e-4);
///
/// let asian = SimulationRequest::builder().payoff(PayoffKind::AsianCall).build().unwrap();
/// assert!(analytic_check(&asian, &estimate).unwrap().is_none());
/// ```
pub fn analytic_check(
    request: &SimulationRequest,
    estimate: &Estimate,
) -> Result<Option<AnalyticCheck>> {
    let Some(price) = analytic_price(request)? else {
        return Ok(None);
    };

    if request.market.drift != request.market.rate {
        warn!(
            mu = request.market.drift,
            r = request.market.rate,
            "Simulated drift differs from the discount rate; Black-Scholes comparison is informational"
        );
    }

    Ok(Some(AnalyticCheck {
        analytic_price: price,
        absolute_error: (estimate.estimate - price).abs(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn estimate(value: f64) -> Estimate {
        Estimate {
            total_paths_processed: 1,
            estimate: value,
            stddev: 0.0,
            stderr: 0.0,
            confidence_95: (value, value),
            shard_count: 1,
        }
    }

    #[test]
    fn test_only_european_call_is_checked() {
        for payoff in [
            PayoffKind::EuropeanPut,
            PayoffKind::AsianCall,
            PayoffKind::AsianPut,
        ] {
            let request = SimulationRequest::builder().payoff(payoff).build().unwrap();
            assert_eq!(analytic_check(&request, &estimate(1.0)).unwrap(), None);
        }
    }

    #[test]
    fn test_absolute_error() {
        let request = SimulationRequest::builder()
            .drift(0.05)
            .rate(0.05)
            .build()
            .unwrap();
        let check = analytic_check(&request, &estimate(10.0)).unwrap().unwrap();
        assert_relative_eq!(check.analytic_price, 10.450583572185565, epsilon = 1e-6);
        assert_relative_eq!(check.absolute_error, 0.450583572185565, epsilon = 1e-6);
    }

    #[test]
    fn test_undiscounted_basis_is_forward_value() {
        let discounted = SimulationRequest::builder().build().unwrap();
        let forward = SimulationRequest::builder().discount(false).build().unwrap();

        let pv = analytic_price(&discounted).unwrap().unwrap();
        let fv = analytic_price(&forward).unwrap().unwrap();
        assert_relative_eq!(fv, pv * (0.01_f64).exp(), max_relative = 1e-14);
    }

    #[test]
    fn test_degenerate_market_uses_intrinsic_limit() {
        let request = SimulationRequest::builder()
            .spot(100.0)
            .strike(90.0)
            .drift(0.0)
            .volatility(0.0)
            .rate(0.0)
            .maturity(0.0)
            .build()
            .unwrap();
        let check = analytic_check(&request, &estimate(10.0)).unwrap().unwrap();
        assert_eq!(check.analytic_price, 10.0);
        assert_eq!(check.absolute_error, 0.0);
    }
}
