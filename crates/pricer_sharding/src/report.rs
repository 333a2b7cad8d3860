//! Result document returned to callers.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateResult;
use crate::payoff::PayoffKind;
use crate::request::SimulationRequest;

/// Serialisable outcome of one orchestration.
///
/// The Black-Scholes fields are omitted entirely (not `null`) for payoffs
/// without a closed form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Paths simulated across all shards.
    pub num_paths_total: usize,
    /// GBM steps per path.
    pub steps_per_path: usize,
    /// Payoff that was priced.
    pub payoff: PayoffKind,
    /// Monte Carlo estimate.
    pub estimate: f64,
    /// Sample standard deviation of the payoff.
    pub stddev: f64,
    /// Standard error of the estimate.
    pub stderr: f64,
    /// 95% confidence interval `[low, high]`.
    pub confidence_95: [f64; 2],
    /// Number of shards.
    pub shards: usize,
    /// Closed-form reference price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_scholes_call: Option<f64>,
    /// `|estimate − black_scholes_call|`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abs_error_vs_bs: Option<f64>,
}

impl SimulationReport {
    /// Builds the report of `request` from its aggregate result.
    pub fn new(request: &SimulationRequest, result: &AggregateResult) -> Self {
        let estimate = result.estimate();
        Self {
            num_paths_total: estimate.total_paths_processed,
            steps_per_path: request.steps_per_path,
            payoff: request.payoff,
            estimate: estimate.estimate,
            stddev: estimate.stddev,
            stderr: estimate.stderr,
            confidence_95: [estimate.confidence_95.0, estimate.confidence_95.1],
            shards: estimate.shard_count,
            black_scholes_call: result.analytic_price(),
            abs_error_vs_bs: result.absolute_error(),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Estimate;
    use crate::validator::AnalyticCheck;

    fn estimate() -> Estimate {
        Estimate {
            total_paths_processed: 200_000,
            estimate: 8.4,
            stddev: 13.1,
            stderr: 0.03,
            confidence_95: (8.34, 8.46),
            shard_count: 4,
        }
    }

    #[test]
    fn test_call_report_includes_black_scholes() {
        let request = SimulationRequest::default();
        let result = AggregateResult::new(
            estimate(),
            Some(AnalyticCheck {
                analytic_price: 8.43,
                absolute_error: 0.03,
            }),
        );
        let value = serde_json::to_value(SimulationReport::new(&request, &result)).unwrap();

        assert_eq!(value["num_paths_total"], 200_000);
        assert_eq!(value["steps_per_path"], 128);
        assert_eq!(value["payoff"], "european_call");
        assert_eq!(value["shards"], 4);
        assert_eq!(value["confidence_95"][0], 8.34);
        assert_eq!(value["black_scholes_call"], 8.43);
        assert_eq!(value["abs_error_vs_bs"], 0.03);
    }

    #[test]
    fn test_non_call_report_omits_black_scholes() {
        let request = SimulationRequest {
            payoff: PayoffKind::AsianPut,
            ..SimulationRequest::default()
        };
        let report = SimulationReport::new(&request, &AggregateResult::new(estimate(), None));
        let json = report.to_json_pretty().unwrap();

        assert!(!json.contains("black_scholes_call"));
        assert!(!json.contains("abs_error_vs_bs"));
        assert!(!json.contains("null"));
        assert!(json.contains("\"asian_put\""));

        let back: SimulationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
