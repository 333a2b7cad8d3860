//! Shard-level data: the work item and its reduced outcome.

use serde::{Deserialize, Serialize};

use crate::payoff::PayoffKind;
use crate::request::MarketParams;
use crate::rng::derive_shard_seed;
use crate::stats::Moments;

/// One independently executable slice of a request.
///
/// Carries a copy of every parameter needed to simulate the shard without
/// access to the originating request. Created by the planner and never
/// mutated afterwards; a retry re-runs the same spec.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShardSpec {
    /// 0-based position in the plan.
    pub shard_index: usize,
    /// Number of paths simulated by this shard.
    pub paths_in_shard: usize,
    /// GBM steps per path.
    pub steps_per_path: usize,
    /// Market and contract parameters.
    pub market: MarketParams,
    /// Payoff evaluated on each path.
    pub payoff: PayoffKind,
    /// Multiply each payoff by e^(-rT).
    pub discount: bool,
    /// Master seed of the request.
    pub master_seed: u64,
    /// Heartbeat interval in completed paths; 0 disables heartbeats.
    pub heartbeat_every_paths: usize,
    /// Retain the full price history of every path.
    pub store_full_paths: bool,
}

impl ShardSpec {
    /// Seed of this shard's random stream.
    #[inline]
    pub fn seed(&self) -> u64 {
        derive_shard_seed(self.master_seed, self.shard_index)
    }

    /// Number of GBM step evaluations the shard performs.
    #[inline]
    pub fn step_evaluations(&self) -> u128 {
        self.paths_in_shard as u128 * self.steps_per_path as u128
    }
}

/// Reduced outcome of one successful shard execution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShardResult {
    /// Index of the shard that produced this result.
    pub shard_index: usize,
    /// Paths simulated; equals `paths_in_shard`.
    pub count: usize,
    /// Sum of (possibly discounted) payoffs.
    pub sum_payoff: f64,
    /// Sum of squared payoffs.
    pub sum_squared_payoff: f64,
}

impl ShardResult {
    /// The `(count, sum, sum_sq)` triple of this shard.
    #[inline]
    pub fn moments(&self) -> Moments {
        Moments {
            count: self.count,
            sum: self.sum_payoff,
            sum_sq: self.sum_squared_payoff,
        }
    }

    /// Shard-local sample mean.
    pub fn mean(&self) -> f64 {
        self.moments().mean()
    }
}
