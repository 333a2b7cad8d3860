//! Plan command implementation
//!
//! Shows how a request would be sharded without simulating anything.

use std::path::Path;

use pricer_sharding::planner::plan_shards;
use pricer_sharding::SimulationRequest;
use serde::Serialize;

use super::load_request;
use crate::config::CliConfig;
use crate::Result;

/// One row of the shard layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedShard {
    /// Shard index
    pub shard_index: usize,
    /// Paths simulated by the shard
    pub paths_in_shard: usize,
    /// Derived RNG seed
    pub seed: u64,
    /// Per-attempt timeout in seconds
    pub timeout_secs: f64,
}

/// Shard layout of `request` under `config`'s execution policy
pub fn layout(config: &CliConfig, request: &SimulationRequest) -> Result<Vec<PlannedShard>> {
    let policy = config.engine.execution_policy();
    let shards = plan_shards(request)?
        .iter()
        .map(|spec| PlannedShard {
            shard_index: spec.shard_index,
            paths_in_shard: spec.paths_in_shard,
            seed: spec.seed(),
            timeout_secs: policy.submit_options(spec).timeout.as_secs_f64(),
        })
        .collect();
    Ok(shards)
}

/// Run the plan command
pub fn run(config: &CliConfig, request_path: &Path) -> Result<Vec<PlannedShard>> {
    let request = load_request(request_path)?;
    layout(config, &request)
}
