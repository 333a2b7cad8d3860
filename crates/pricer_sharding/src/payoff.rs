//! Payoff selector.
//!
//! A closed set of payoffs evaluated on a simulated path. European payoffs
//! read the terminal price; Asian payoffs read the arithmetic average of the
//! prices observed after each step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Payoff applied to each simulated path.
///
/// # Examples
/// ```
/// use pricer_sharding::PayoffKind;
///
/// let kind: PayoffKind = "asian_put".parse().unwrap();
/// assert_eq!(kind, PayoffKind::AsianPut);
/// assert_eq!(kind.to_string(), "asian_put");
/// assert!("lookback".parse::<PayoffKind>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PayoffKind {
    /// max(S_T - K, 0)
    EuropeanCall,
    /// max(K - S_T, 0)
    EuropeanPut,
    /// max(A - K, 0) with A the arithmetic average of the path
    AsianCall,
    /// max(K - A, 0) with A the arithmetic average of the path
    AsianPut,
}

impl PayoffKind {
    /// All supported payoffs.
    pub const ALL: [PayoffKind; 4] = [
        PayoffKind::EuropeanCall,
        PayoffKind::EuropeanPut,
        PayoffKind::AsianCall,
        PayoffKind::AsianPut,
    ];

    /// Wire name of the payoff.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoffKind::EuropeanCall => "european_call",
            PayoffKind::EuropeanPut => "european_put",
            PayoffKind::AsianCall => "asian_call",
            PayoffKind::AsianPut => "asian_put",
        }
    }

    /// Whether the payoff needs the running path average.
    #[inline]
    pub fn is_asian(&self) -> bool {
        matches!(self, PayoffKind::AsianCall | PayoffKind::AsianPut)
    }

    /// Whether a closed-form reference price is available.
    #[inline]
    pub fn has_closed_form(&self) -> bool {
        matches!(self, PayoffKind::EuropeanCall)
    }

    /// Undiscounted payoff of one path.
    #[inline]
    pub fn evaluate(&self, terminal: f64, average: f64, strike: f64) -> f64 {
        match self {
            PayoffKind::EuropeanCall => (terminal - strike).max(0.0),
            PayoffKind::EuropeanPut => (strike - terminal).max(0.0),
            PayoffKind::AsianCall => (average - strike).max(0.0),
            PayoffKind::AsianPut => (strike - average).max(0.0),
        }
    }
}

impl fmt::Display for PayoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoffKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        PayoffKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| SimulationError::UnsupportedPayoff(s.to_string()))
    }
}

impl TryFrom<String> for PayoffKind {
    type Error = SimulationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for kind in PayoffKind::ALL {
            assert_eq!(kind.as_str().parse::<PayoffKind>().unwrap(), kind);
        }
        assert_eq!(
            "European_Call".parse::<PayoffKind>().unwrap(),
            PayoffKind::EuropeanCall
        );
    }

    #[test]
    fn test_unknown_payoff_is_rejected() {
        let err = "barrier_call".parse::<PayoffKind>().unwrap_err();
        assert_eq!(err, SimulationError::UnsupportedPayoff("barrier_call".into()));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&PayoffKind::AsianCall).unwrap();
        assert_eq!(json, "\"asian_call\"");

        let kind: PayoffKind = serde_json::from_str("\"european_put\"").unwrap();
        assert_eq!(kind, PayoffKind::EuropeanPut);

        let err = serde_json::from_str::<PayoffKind>("\"digital\"").unwrap_err();
        assert!(err.to_string().contains("Unsupported payoff 'digital'"));
    }

    #[test]
    fn test_evaluate() {
        assert_eq!(PayoffKind::EuropeanCall.evaluate(110.0, 0.0, 100.0), 10.0);
        assert_eq!(PayoffKind::EuropeanCall.evaluate(90.0, 0.0, 100.0), 0.0);
        assert_eq!(PayoffKind::EuropeanPut.evaluate(90.0, 0.0, 100.0), 10.0);
        assert_eq!(PayoffKind::AsianCall.evaluate(0.0, 104.0, 100.0), 4.0);
        assert_eq!(PayoffKind::AsianPut.evaluate(1000.0, 97.0, 100.0), 3.0);
    }

    #[test]
    fn test_closed_form_only_for_european_call() {
        assert!(PayoffKind::EuropeanCall.has_closed_form());
        assert!(!PayoffKind::EuropeanPut.has_closed_form());
        assert!(!PayoffKind::AsianCall.has_closed_form());
        assert!(!PayoffKind::AsianPut.has_closed_form());
    }
}
