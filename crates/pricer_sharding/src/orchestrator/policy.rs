//! Per-shard execution policy: timeout sizing, retry schedule and heartbeat
//! liveness.

use std::time::Duration;

use crate::error::SimulationError;
use crate::shard::ShardSpec;

/// Default lower bound on a shard's attempt timeout.
pub const DEFAULT_TIMEOUT_FLOOR: Duration = Duration::from_secs(30);

/// Default assumed throughput in GBM step evaluations per second.
pub const DEFAULT_THROUGHPUT_STEPS_PER_SEC: f64 = 50_000.0;

/// Default heartbeat silence tolerated before an attempt counts as stalled.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Workload-proportional attempt timeout.
///
/// `timeout = max(floor, steps_per_path × paths_in_shard / throughput)`.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use pricer_sharding::orchestrator::TimeoutPolicy;
///
/// let policy = TimeoutPolicy::default();
/// // 128 steps x 50,000 paths at 50,000 steps/s
/// assert_eq!(policy.timeout_for_workload(128 * 50_000), Duration::from_secs(128));
/// assert_eq!(policy.timeout_for_workload(1_000), Duration::from_secs(30));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeoutPolicy {
    /// Smallest timeout handed out.
    pub floor: Duration,
    /// Step evaluations per second used to size the timeout.
    pub throughput_steps_per_sec: f64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            floor: DEFAULT_TIMEOUT_FLOOR,
            throughput_steps_per_sec: DEFAULT_THROUGHPUT_STEPS_PER_SEC,
        }
    }
}

impl TimeoutPolicy {
    /// Timeout for `step_evaluations` units of work.
    pub fn timeout_for_workload(&self, step_evaluations: u128) -> Duration {
        let secs = step_evaluations as f64 / self.throughput_steps_per_sec;
        let scaled = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        scaled.max(self.floor)
    }

    /// Timeout for one attempt of `spec`.
    pub fn timeout_for(&self, spec: &ShardSpec) -> Duration {
        self.timeout_for_workload(spec.step_evaluations())
    }
}

/// Bounded exponential backoff.
///
/// Attempt `n` (1-based) that fails is followed by a pause of
/// `min(initial_interval · coefficientⁿ⁻¹, maximum_interval)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Pause after the first failed attempt.
    pub initial_interval: Duration,
    /// Growth factor between consecutive pauses.
    pub backoff_coefficient: f64,
    /// Upper bound on any pause.
    pub maximum_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Pause after failed attempt `attempt` (1-based).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use pricer_sharding::orchestrator::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.backoff(1), Duration::from_secs(1));
    /// assert_eq!(policy.backoff(3), Duration::from_secs(4));
    /// assert_eq!(policy.backoff(10), Duration::from_secs(30));
    /// ```
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.maximum_interval)
            .min(self.maximum_interval)
    }

    /// Whether `error` raised by attempt `attempt` warrants another attempt.
    pub fn should_retry(&self, error: &SimulationError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_attempts
    }
}

/// Parameters attached to one shard submission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubmitOptions {
    /// Deadline of each attempt.
    pub timeout: Duration,
    /// Retry schedule.
    pub retry: RetryPolicy,
    /// Silence after which an attempt is stalled; `None` disables the check.
    pub heartbeat_timeout: Option<Duration>,
}

/// Engine-wide execution policy from which per-shard options are derived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExecutionPolicy {
    /// Attempt timeout sizing.
    pub timeout: TimeoutPolicy,
    /// Retry schedule.
    pub retry: RetryPolicy,
    /// Heartbeat silence tolerated for shards that emit heartbeats.
    pub heartbeat_timeout: Duration,
    /// Bound on the whole orchestration.
    pub overall_deadline: Option<Duration>,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            timeout: TimeoutPolicy::default(),
            retry: RetryPolicy::default(),
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            overall_deadline: None,
        }
    }
}

impl ExecutionPolicy {
    /// Submission options for `spec`.
    ///
    /// Liveness checking is only enabled when the shard emits at least one
    /// heartbeat, i.e. it has no fewer paths than the heartbeat interval.
    pub fn submit_options(&self, spec: &ShardSpec) -> SubmitOptions {
        let beats = spec.heartbeat_every_paths > 0
            && spec.paths_in_shard >= spec.heartbeat_every_paths;
        SubmitOptions {
            timeout: self.timeout.timeout_for(spec),
            retry: self.retry,
            heartbeat_timeout: beats.then_some(self.heartbeat_timeout),
        }
    }
}
