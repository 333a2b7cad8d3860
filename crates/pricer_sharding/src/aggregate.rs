//! Aggregation of shard results into one estimate.
//!
//! Shard triples are sorted by `shard_index` and reduced with
//! [`Moments::pairwise`], so every permutation of the same results produces
//! bit-identical statistics.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SimulationError};
use crate::shard::ShardResult;
use crate::stats::Moments;
use crate::validator::AnalyticCheck;

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.96;

/// Monte Carlo statistics of the combined sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Paths across all shards.
    pub total_paths_processed: usize,
    /// Sample mean of the payoff.
    pub estimate: f64,
    /// Sample standard deviation of the payoff.
    pub stddev: f64,
    /// Standard error of the mean, `stddev / √n`.
    pub stderr: f64,
    /// `estimate ∓ 1.96·stderr`.
    pub confidence_95: (f64, f64),
    /// Number of shards combined.
    pub shard_count: usize,
}

impl Estimate {
    /// Statistics of a combined `(count, sum, sum_sq)` triple.
    ///
    /// # Errors
    ///
    /// `EmptyResultSet` if the triple holds no samples.
    pub fn from_moments(moments: Moments, shard_count: usize) -> Result<Self> {
        if moments.count == 0 {
            return Err(SimulationError::EmptyResultSet);
        }

        let n = moments.count as f64;
        let mean = moments.mean();
        let stddev = moments.variance().sqrt();
        let stderr = stddev / n.sqrt();

        Ok(Self {
            total_paths_processed: moments.count,
            estimate: mean,
            stddev,
            stderr,
            confidence_95: (mean - Z_95 * stderr, mean + Z_95 * stderr),
            shard_count,
        })
    }
}

/// Combines shard results in any order.
///
/// # Errors
///
/// - `EmptyResultSet` if `results` is empty or holds no paths
/// - `ResultMismatch` if two results share a shard index
///
/// # Examples
///
/// ```rust
/// use pricer_sharding::aggregate::aggregate;
/// use pricer_sharding::ShardResult;
///
/// let results = [
///     ShardResult { shard_index: 1, count: 2, sum_payoff: 6.0, sum_squared_payoff: 20.0 },
///     ShardResult { shard_index: 0, count: 2, sum_payoff: 2.0, sum_squared_payoff: 2.0 },
/// ];
/// let estimate = aggregate(&results).unwrap();
/// assert_eq!(estimate.total_paths_processed, 4);
/// assert_eq!(estimate.estimate, 2.0);
/// assert_eq!(estimate.shard_count, 2);
/// ```
pub fn aggregate(results: &[ShardResult]) -> Result<Estimate> {
    if results.is_empty() {
        return Err(SimulationError::EmptyResultSet);
    }

    let mut ordered: Vec<&ShardResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.shard_index);
    if let Some(pair) = ordered
        .windows(2)
        .find(|pair| pair[0].shard_index == pair[1].shard_index)
    {
        return Err(SimulationError::ResultMismatch(format!(
            "shard {} reported more than once",
            pair[0].shard_index
        )));
    }
    let parts: Vec<Moments> = ordered.into_iter().map(ShardResult::moments).collect();

    let estimate = Estimate::from_moments(Moments::pairwise(&parts), results.len())?;
    debug!(
        shards = estimate.shard_count,
        paths = estimate.total_paths_processed,
        estimate = estimate.estimate,
        stderr = estimate.stderr,
        "Shard results aggregated"
    );
    Ok(estimate)
}

/// Final result of one orchestration.
///
/// Immutable once constructed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregateResult {
    estimate: Estimate,
    analytic: Option<AnalyticCheck>,
}

impl AggregateResult {
    /// Bundles the estimate with its optional closed-form cross-check.
    pub fn new(estimate: Estimate, analytic: Option<AnalyticCheck>) -> Self {
        Self { estimate, analytic }
    }

    /// Monte Carlo statistics.
    pub fn estimate(&self) -> &Estimate {
        &self.estimate
    }

    /// Closed-form cross-check, when the payoff has one.
    pub fn analytic(&self) -> Option<&AnalyticCheck> {
        self.analytic.as_ref()
    }

    /// Paths across all shards.
    pub fn total_paths_processed(&self) -> usize {
        self.estimate.total_paths_processed
    }

    /// Number of shards combined.
    pub fn shard_count(&self) -> usize {
        self.estimate.shard_count
    }

    /// Closed-form price, when available.
    pub fn analytic_price(&self) -> Option<f64> {
        self.analytic.map(|check| check.analytic_price)
    }

    /// `|estimate − analytic price|`, when available.
    pub fn absolute_error(&self) -> Option<f64> {
        self.analytic.map(|check| check.absolute_error)
    }
}
