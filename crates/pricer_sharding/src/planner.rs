//! Shard planner.
//!
//! Splits a total path count into contiguous shards of at most
//! `paths_per_shard` paths. Only the last shard may be smaller.

use crate::error::{Result, SimulationError};
use crate::request::SimulationRequest;
use crate::shard::ShardSpec;

/// Upper bound on the shards of one request.
pub const MAX_SHARDS: usize = 1 << 20;

/// Number of shards needed for `total` paths, `ceil(total / per_shard)`.
///
/// Returns 0 when `per_shard` is 0.
#[inline]
pub fn shard_count(total: usize, per_shard: usize) -> usize {
    if per_shard == 0 {
        return 0;
    }
    total.div_ceil(per_shard)
}

/// Shard sizes for `total` paths in shards of at most `per_shard`.
///
/// # Errors
///
/// `InvalidParameter` if either argument is 0, or if more than
/// [`MAX_SHARDS`] shards would be needed.
///
/// # Examples
///
/// ```rust
/// use pricer_sharding::planner::shard_sizes;
///
/// assert_eq!(shard_sizes(200_001, 50_000).unwrap(), vec![50_000, 50_000, 50_000, 50_000, 1]);
/// assert!(shard_sizes(10, 0).is_err());
/// ```
pub fn shard_sizes(total: usize, per_shard: usize) -> Result<Vec<usize>> {
    if total == 0 {
        return Err(SimulationError::invalid("num_paths_total", "must be > 0"));
    }
    if per_shard == 0 {
        return Err(SimulationError::invalid("paths_per_shard", "must be > 0"));
    }

    let count = shard_count(total, per_shard);
    if count > MAX_SHARDS {
        return Err(SimulationError::invalid(
            "paths_per_shard",
            format!("{total} paths would need {count} shards, at most {MAX_SHARDS} allowed"),
        ));
    }
    let sizes = (0..count)
        .map(|index| {
            let start = index * per_shard;
            per_shard.min(total - start)
        })
        .collect();
    Ok(sizes)
}

/// Plans the shards of a request.
///
/// The request is validated first; nothing is planned for an invalid request.
///
/// # Errors
///
/// `InvalidParameter` from request validation.
pub fn plan_shards(request: &SimulationRequest) -> Result<Vec<ShardSpec>> {
    request.validate()?;

    let specs = shard_sizes(request.num_paths_total, request.paths_per_shard)?
        .into_iter()
        .enumerate()
        .map(|(shard_index, paths_in_shard)| ShardSpec {
            shard_index,
            paths_in_shard,
            steps_per_path: request.steps_per_path,
            market: request.market,
            payoff: request.payoff,
            discount: request.discount,
            master_seed: request.master_seed,
            heartbeat_every_paths: request.heartbeat_every_paths,
            store_full_paths: request.store_full_paths,
        })
        .collect();
    Ok(specs)
}
