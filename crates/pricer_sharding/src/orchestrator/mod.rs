//! Orchestration of a sharded simulation.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator::run(request)
//! ├── plan_shards()            (validate, split into ShardSpecs)
//! ├── JoinSet of shard tasks   (optionally gated by max_concurrency)
//! │   └── ExecutionSubstrate::execute(spec, SubmitOptions)
//! │       └── LocalSubstrate: retry loop → supervised attempt → ShardWorker
//! ├── completeness check       (every planned shard exactly once)
//! ├── aggregate()              (order-independent reduction)
//! └── analytic_check()         (European call only)
//! ```
//!
//! Results are all-or-nothing: the first permanent shard failure, or the
//! overall deadline, aborts every outstanding shard and fails the run.

mod policy;
mod substrate;

pub use policy::{
    ExecutionPolicy, RetryPolicy, SubmitOptions, TimeoutPolicy, DEFAULT_HEARTBEAT_TIMEOUT,
    DEFAULT_THROUGHPUT_STEPS_PER_SEC, DEFAULT_TIMEOUT_FLOOR,
};
pub use substrate::{
    ExecutionSubstrate, LocalSubstrate, MonteCarloWorker, ProgressCallback, ShardWorker,
};

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info};

use crate::aggregate::{aggregate, AggregateResult};
use crate::config::EngineConfig;
use crate::error::{Result, SimulationError};
use crate::planner::plan_shards;
use crate::request::SimulationRequest;
use crate::shard::{ShardResult, ShardSpec};
use crate::validator::analytic_check;

/// Drives a request through planning, execution and aggregation.
///
/// # Examples
///
/// ```rust
/// use pricer_sharding::{EngineConfig, Orchestrator, SimulationRequest};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let orchestrator = Orchestrator::local(&EngineConfig::default()).unwrap();
/// let request = SimulationRequest::builder()
///     .num_paths_total(4_000)
///     .paths_per_shard(1_000)
///     .steps_per_path(8)
///     .build()
///     .unwrap();
///
/// let result = orchestrator.run(&request).await.unwrap();
/// assert_eq!(result.shard_count(), 4);
/// assert_eq!(result.total_paths_processed(), 4_000);
/// assert!(result.analytic_price().is_some());
/// # });
/// ```
pub struct Orchestrator<S: ExecutionSubstrate> {
    substrate: Arc<S>,
    policy: ExecutionPolicy,
}

impl Orchestrator<LocalSubstrate<MonteCarloWorker>> {
    /// In-process orchestrator configured from `config`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the configuration is invalid.
    pub fn local(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let worker = MonteCarloWorker::new(config.path_buffer_limit_bytes);
        let substrate = LocalSubstrate::with_worker(worker, config.resolved_worker_threads());
        Ok(Self::new(substrate, config.execution_policy()))
    }
}

impl<S: ExecutionSubstrate + 'static> Orchestrator<S> {
    /// Orchestrator submitting to `substrate` under `policy`.
    pub fn new(substrate: S, policy: ExecutionPolicy) -> Self {
        Self {
            substrate: Arc::new(substrate),
            policy,
        }
    }

    /// The execution policy applied to every shard.
    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    /// The substrate shards are submitted to.
    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// Runs `request` end to end.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` before any shard is scheduled
    /// - `ShardExecutionFailed` naming the first shard that failed permanently
    /// - `DeadlineExceeded` if the overall deadline elapses
    /// - `ResultMismatch` if the substrate returns results that do not match the plan
    pub async fn run(&self, request: &SimulationRequest) -> Result<AggregateResult> {
        let results = self.collect(request).await?;
        let estimate = aggregate(&results)?;
        let analytic = analytic_check(request, &estimate)?;

        info!(
            payoff = %request.payoff,
            paths = estimate.total_paths_processed,
            shards = estimate.shard_count,
            estimate = estimate.estimate,
            stderr = estimate.stderr,
            analytic_price = analytic.map(|check| check.analytic_price),
            "Sharded simulation complete"
        );
        Ok(AggregateResult::new(estimate, analytic))
    }

    /// Executes every shard of `request` and returns their results ordered
    /// by shard index.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run`].
    pub async fn collect(&self, request: &SimulationRequest) -> Result<Vec<ShardResult>> {
        let specs = plan_shards(request)?;
        let total = specs.len();
        info!(
            paths = request.num_paths_total,
            steps = request.steps_per_path,
            shards = total,
            max_concurrency = request.max_concurrency,
            payoff = %request.payoff,
            "Starting sharded simulation"
        );

        // More permits than shards never gates anything.
        let limiter = (request.max_concurrency > 0 && request.max_concurrency < total)
            .then(|| Arc::new(Semaphore::new(request.max_concurrency)));

        let mut tasks = JoinSet::new();
        for spec in specs.iter().copied() {
            let substrate = Arc::clone(&self.substrate);
            let limiter = limiter.clone();
            let options = self.policy.submit_options(&spec);
            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => Some(semaphore.acquire_owned().await.map_err(|_| {
                        SimulationError::Cancelled {
                            shard_index: spec.shard_index,
                        }
                    })?),
                    None => None,
                };
                substrate.execute(spec, options).await
            });
        }

        let deadline = self
            .policy
            .overall_deadline
            .map(|limit| (limit, substrate::instant_after(Instant::now(), limit)));
        let mut results = Vec::with_capacity(total);

        loop {
            let next = match deadline {
                Some((limit, at)) => match timeout_at(at, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tasks.abort_all();
                        error!(
                            completed = results.len(),
                            total,
                            "Orchestration deadline exceeded, cancelling outstanding shards"
                        );
                        return Err(SimulationError::DeadlineExceeded {
                            deadline: limit,
                            completed: results.len(),
                            total,
                        });
                    }
                },
                None => tasks.join_next().await,
            };

            let Some(joined) = next else {
                break;
            };
            match joined {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(err)) => {
                    tasks.abort_all();
                    error!(
                        shard_index = err.shard_index(),
                        error = %err,
                        "Shard failed, cancelling outstanding shards"
                    );
                    return Err(err);
                }
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(SimulationError::ResultMismatch(format!(
                        "shard task terminated abnormally: {join_err}"
                    )));
                }
            }
        }

        check_complete(&specs, &mut results)?;
        Ok(results)
    }
}

/// Sorts `results` by shard index and checks them against the plan.
fn check_complete(specs: &[ShardSpec], results: &mut [ShardResult]) -> Result<()> {
    if results.len() != specs.len() {
        return Err(SimulationError::ResultMismatch(format!(
            "expected {} shard results, got {}",
            specs.len(),
            results.len()
        )));
    }

    results.sort_by_key(|result| result.shard_index);
    for (spec, result) in specs.iter().zip(results.iter()) {
        if spec.shard_index != result.shard_index {
            return Err(SimulationError::ResultMismatch(format!(
                "shard {} missing or duplicated",
                spec.shard_index
            )));
        }
        if spec.paths_in_shard != result.count {
            return Err(SimulationError::ResultMismatch(format!(
                "shard {} reported {} paths, planned {}",
                spec.shard_index, result.count, spec.paths_in_shard
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Vec<ShardSpec> {
        let request = SimulationRequest::builder()
            .num_paths_total(25)
            .paths_per_shard(10)
            .build()
            .unwrap();
        plan_shards(&request).unwrap()
    }

    fn results_for(specs: &[ShardSpec]) -> Vec<ShardResult> {
        specs
            .iter()
            .map(|spec| ShardResult {
                shard_index: spec.shard_index,
                count: spec.paths_in_shard,
                sum_payoff: 1.0,
                sum_squared_payoff: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_check_complete_sorts() {
        let specs = plan();
        let mut results = results_for(&specs);
        results.reverse();
        check_complete(&specs, &mut results).unwrap();
        assert_eq!(results[0].shard_index, 0);
        assert_eq!(results[2].count, 5);
    }

    #[test]
    fn test_check_complete_detects_duplicates() {
        let specs = plan();
        let mut results = results_for(&specs);
        results[2] = results[1];
        assert!(matches!(
            check_complete(&specs, &mut results),
            Err(SimulationError::ResultMismatch(_))
        ));
    }

    #[test]
    fn test_check_complete_detects_count_and_length() {
        let specs = plan();
        let mut short = results_for(&specs[..2]);
        assert!(check_complete(&specs, &mut short).is_err());

        let mut wrong = results_for(&specs);
        wrong[1].count = 3;
        assert!(check_complete(&specs, &mut wrong).is_err());
    }
}
