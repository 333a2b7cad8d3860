//! Shard simulator.
//!
//! Runs one [`ShardSpec`]: simulates its GBM paths, evaluates the payoff on
//! each and reduces the shard to a [`ShardResult`].
//!
//! # Path Dynamics
//!
//! Log-space stepping with constants hoisted out of the path loop:
//!
//! ```text
//! dt          = T / steps
//! drift_dt    = (μ - σ²/2)·dt
//! vol_sqrt_dt = σ·√dt
//! S(t+dt)     = S(t)·exp(drift_dt + vol_sqrt_dt·Z)
//! ```
//!
//! # Cooperation With The Supervisor
//!
//! - A heartbeat is emitted after every `heartbeat_every_paths` completed
//!   paths (never when the interval is 0).
//! - The [`CancelFlag`] is polled before each path; a raised flag ends the
//!   shard with `Cancelled`.

mod buffer;
mod control;

pub use buffer::PathBuffer;
pub use control::{CancelFlag, Heartbeat, HeartbeatSink, NoHeartbeat};

use tracing::debug;

use crate::error::{Result, SimulationError};
use crate::rng::PricerRng;
use crate::shard::{ShardResult, ShardSpec};
use crate::stats::CompensatedSum;

/// Outcome of one simulator run.
#[derive(Clone, Debug, PartialEq)]
pub struct ShardRun {
    /// Reduced shard statistics.
    pub result: ShardResult,
    /// Full price history, present when `store_full_paths` is set.
    pub paths: Option<PathBuffer>,
}

/// Executes one shard.
///
/// # Examples
///
/// ```rust
/// use pricer_sharding::planner::plan_shards;
/// use pricer_sharding::simulator::{CancelFlag, NoHeartbeat, ShardSimulator};
/// use pricer_sharding::SimulationRequest;
///
/// let request = SimulationRequest::builder()
///     .num_paths_total(2_000)
///     .paths_per_shard(1_000)
///     .steps_per_path(16)
///     .build()
///     .unwrap();
/// let spec = plan_shards(&request).unwrap()[1];
///
/// let run = ShardSimulator::new(spec)
///     .run(&NoHeartbeat, &CancelFlag::new())
///     .unwrap();
/// assert_eq!(run.result.shard_index, 1);
/// assert_eq!(run.result.count, 1_000);
/// assert!(run.paths.is_none());
/// ```
#[derive(Clone, Debug)]
pub struct ShardSimulator {
    spec: ShardSpec,
    attempt: u32,
    buffer_limit: Option<usize>,
}

impl ShardSimulator {
    /// Creates a simulator for the first attempt of `spec`.
    pub fn new(spec: ShardSpec) -> Self {
        Self {
            spec,
            attempt: 1,
            buffer_limit: None,
        }
    }

    /// Sets the 1-based attempt number reported in heartbeats.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    /// Caps the size of the full-path buffer.
    pub fn with_buffer_limit(mut self, limit_bytes: Option<usize>) -> Self {
        self.buffer_limit = limit_bytes;
        self
    }

    /// The shard being simulated.
    pub fn spec(&self) -> &ShardSpec {
        &self.spec
    }

    /// Simulates every path of the shard.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if the shard is empty or its market is invalid
    /// - `ResourceExhausted` if the full-path buffer cannot be allocated
    /// - `Cancelled` if `cancel` is raised before the last path completes
    pub fn run(&self, heartbeats: &dyn HeartbeatSink, cancel: &CancelFlag) -> Result<ShardRun> {
        let spec = &self.spec;
        if spec.paths_in_shard == 0 {
            return Err(SimulationError::invalid("paths_in_shard", "must be > 0"));
        }
        if spec.steps_per_path == 0 {
            return Err(SimulationError::invalid("steps_per_path", "must be > 0"));
        }
        spec.market.validate()?;

        let mut paths = if spec.store_full_paths {
            Some(PathBuffer::allocate(
                spec.shard_index,
                spec.paths_in_shard,
                spec.steps_per_path,
                self.buffer_limit,
            )?)
        } else {
            None
        };

        let market = &spec.market;
        let steps = spec.steps_per_path;
        let dt = market.maturity / steps as f64;
        let drift_dt = (market.drift - 0.5 * market.volatility * market.volatility) * dt;
        let vol_sqrt_dt = market.volatility * dt.sqrt();
        let discount = if spec.discount {
            market.discount_factor()
        } else {
            1.0
        };

        let mut rng = PricerRng::from_seed(spec.seed());
        let mut normals = vec![0.0; steps];
        let mut sum = CompensatedSum::default();
        let mut sum_sq = CompensatedSum::default();

        for path in 0..spec.paths_in_shard {
            if cancel.is_cancelled() {
                debug!(
                    shard_index = spec.shard_index,
                    attempt = self.attempt,
                    paths_processed = path,
                    "Shard cancelled"
                );
                return Err(SimulationError::Cancelled {
                    shard_index: spec.shard_index,
                });
            }

            rng.fill_normal(&mut normals);

            let mut row = paths.as_mut().map(|buffer| buffer.row_mut(path));
            let mut price = market.spot;
            let mut running = 0.0;
            for (step, z) in normals.iter().enumerate() {
                price *= (drift_dt + vol_sqrt_dt * z).exp();
                running += price;
                if let Some(row) = row.as_deref_mut() {
                    row[step] = price;
                }
            }
            let average = running / steps as f64;

            let payoff = spec.payoff.evaluate(price, average, market.strike) * discount;
            sum.add(payoff);
            sum_sq.add(payoff * payoff);

            let done = path + 1;
            if spec.heartbeat_every_paths > 0 && done % spec.heartbeat_every_paths == 0 {
                heartbeats.beat(Heartbeat {
                    shard_index: spec.shard_index,
                    attempt: self.attempt,
                    paths_processed: done,
                });
            }
        }

        let result = ShardResult {
            shard_index: spec.shard_index,
            count: spec.paths_in_shard,
            sum_payoff: sum.value(),
            sum_squared_payoff: sum_sq.value(),
        };
        debug!(
            shard_index = result.shard_index,
            attempt = self.attempt,
            count = result.count,
            mean = result.mean(),
            "Shard simulated"
        );

        Ok(ShardRun { result, paths })
    }
}

/// Simulates one shard without heartbeats or cancellation.
///
/// # Errors
///
/// See [`ShardSimulator::run`].
pub fn simulate_shard(spec: &ShardSpec) -> Result<ShardResult> {
    ShardSimulator::new(*spec)
        .run(&NoHeartbeat, &CancelFlag::new())
        .map(|run| run.result)
}
