//! Engine configuration.
//!
//! [`EngineConfig`] is the serialisable form of the execution policy and
//! worker pool settings. Every field has a default, so partial TOML tables
//! deserialise cleanly.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::{Result, SimulationError};
use crate::orchestrator::{
    ExecutionPolicy, RetryPolicy, TimeoutPolicy, DEFAULT_HEARTBEAT_TIMEOUT,
    DEFAULT_THROUGHPUT_STEPS_PER_SEC, DEFAULT_TIMEOUT_FLOOR,
};

/// Tunables of the sharded engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Concurrent shard attempts in the local substrate (0 = CPU count).
    pub worker_threads: usize,
    /// Lower bound on an attempt's timeout, in seconds.
    pub shard_timeout_floor_secs: u64,
    /// Step evaluations per second used to size attempt timeouts.
    pub throughput_steps_per_sec: f64,
    /// Heartbeat silence tolerated before an attempt is stalled, in seconds.
    pub heartbeat_timeout_secs: u64,
    /// Attempts per shard including the first.
    pub max_attempts: u32,
    /// Pause after the first failed attempt, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Growth factor between retry pauses.
    pub backoff_coefficient: f64,
    /// Upper bound on any retry pause, in milliseconds.
    pub max_backoff_ms: u64,
    /// Bound on a whole orchestration, in seconds.
    pub overall_deadline_secs: Option<u64>,
    /// Cap on a shard's full-path buffer, in bytes.
    pub path_buffer_limit_bytes: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            worker_threads: 0,
            shard_timeout_floor_secs: DEFAULT_TIMEOUT_FLOOR.as_secs(),
            throughput_steps_per_sec: DEFAULT_THROUGHPUT_STEPS_PER_SEC,
            heartbeat_timeout_secs: DEFAULT_HEARTBEAT_TIMEOUT.as_secs(),
            max_attempts: retry.max_attempts,
            initial_backoff_ms: retry.initial_interval.as_millis() as u64,
            backoff_coefficient: retry.backoff_coefficient,
            max_backoff_ms: retry.maximum_interval.as_millis() as u64,
            overall_deadline_secs: None,
            path_buffer_limit_bytes: None,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads > Semaphore::MAX_PERMITS {
            return Err(SimulationError::invalid(
                "worker_threads",
                format!(
                    "must be at most {}, got {}",
                    Semaphore::MAX_PERMITS,
                    self.worker_threads
                ),
            ));
        }
        if !(self.throughput_steps_per_sec.is_finite() && self.throughput_steps_per_sec > 0.0) {
            return Err(SimulationError::invalid(
                "throughput_steps_per_sec",
                format!("must be finite and > 0, got {}", self.throughput_steps_per_sec),
            ));
        }
        if self.heartbeat_timeout_secs == 0 {
            return Err(SimulationError::invalid("heartbeat_timeout_secs", "must be > 0"));
        }
        if self.max_attempts == 0 {
            return Err(SimulationError::invalid("max_attempts", "must be >= 1"));
        }
        if !(self.backoff_coefficient.is_finite() && self.backoff_coefficient >= 1.0) {
            return Err(SimulationError::invalid(
                "backoff_coefficient",
                format!("must be finite and >= 1, got {}", self.backoff_coefficient),
            ));
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(SimulationError::invalid(
                "max_backoff_ms",
                "must not be below initial_backoff_ms",
            ));
        }
        if self.overall_deadline_secs == Some(0) {
            return Err(SimulationError::invalid("overall_deadline_secs", "must be > 0"));
        }
        Ok(())
    }

    /// Worker slots after resolving 0 to the CPU count.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.worker_threads
        }
    }

    /// Execution policy described by this configuration.
    pub fn execution_policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            timeout: TimeoutPolicy {
                floor: Duration::from_secs(self.shard_timeout_floor_secs),
                throughput_steps_per_sec: self.throughput_steps_per_sec,
            },
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                initial_interval: Duration::from_millis(self.initial_backoff_ms),
                backoff_coefficient: self.backoff_coefficient,
                maximum_interval: Duration::from_millis(self.max_backoff_ms),
            },
            heartbeat_timeout: Duration::from_secs(self.heartbeat_timeout_secs),
            overall_deadline: self.overall_deadline_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_mirror_policy_defaults() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.execution_policy(), ExecutionPolicy::default());
    }

    #[test]
    fn test_partial_table_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "max_attempts": 2 }"#).unwrap();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.shard_timeout_floor_secs, 30);
        assert_eq!(config.throughput_steps_per_sec, 50_000.0);
    }

    #[test]
    fn test_validation() {
        let bad = [
            EngineConfig {
                throughput_steps_per_sec: 0.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                max_attempts: 0,
                ..EngineConfig::default()
            },
            EngineConfig {
                backoff_coefficient: 0.5,
                ..EngineConfig::default()
            },
            EngineConfig {
                initial_backoff_ms: 10_000,
                max_backoff_ms: 100,
                ..EngineConfig::default()
            },
            EngineConfig {
                overall_deadline_secs: Some(0),
                ..EngineConfig::default()
            },
            EngineConfig {
                heartbeat_timeout_secs: 0,
                ..EngineConfig::default()
            },
            EngineConfig {
                worker_threads: usize::MAX,
                ..EngineConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn test_execution_policy_conversion() {
        let config = EngineConfig {
            shard_timeout_floor_secs: 5,
            throughput_steps_per_sec: 1e6,
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
            overall_deadline_secs: Some(600),
            ..EngineConfig::default()
        };
        let policy = config.execution_policy();

        assert_eq!(policy.timeout.floor, Duration::from_secs(5));
        assert_eq!(policy.retry.max_attempts, 3);
        assert_eq!(policy.retry.backoff(1), Duration::from_millis(250));
        assert_eq!(policy.retry.backoff(5), Duration::from_millis(2_000));
        assert_eq!(policy.overall_deadline, Some(Duration::from_secs(600)));
    }
}
