//! Error taxonomy for the sharded simulation engine.
//!
//! Errors are classified where they occur; only the orchestrator decides
//! whether a classified failure is retried or fatal (see
//! [`SimulationError::is_retryable`]).

use std::time::Duration;

use pricer_models::analytical::AnalyticalError;
use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Errors raised while planning, simulating, orchestrating or aggregating.
///
/// # Examples
/// ```
/// use pricer_sharding::SimulationError;
///
/// let err = SimulationError::ShardStalled {
///     shard_index: 3,
///     attempt: 1,
///     silent_for: std::time::Duration::from_secs(60),
/// };
/// assert!(err.is_retryable());
/// assert_eq!(err.kind(), "ShardStalled");
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// A request or shard parameter is out of its domain.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the request.
        name: &'static str,
        /// What is wrong with the supplied value.
        reason: String,
    },

    /// Payoff selector that names no known payoff.
    #[error("Unsupported payoff '{0}': expected one of european_call, european_put, asian_call, asian_put")]
    UnsupportedPayoff(String),

    /// The full-path buffer of a shard could not be allocated.
    #[error(
        "Shard {shard_index}: cannot allocate path buffer of {requested_bytes} bytes \
         ({paths_in_shard} paths x {steps_per_path} steps); reduce paths_per_shard"
    )]
    ResourceExhausted {
        /// Offending shard.
        shard_index: usize,
        /// Paths requested for the shard.
        paths_in_shard: usize,
        /// Steps per path.
        steps_per_path: usize,
        /// Size of the buffer that was requested.
        requested_bytes: u128,
    },

    /// An attempt ran past its workload-scaled deadline.
    #[error("Shard {shard_index} attempt {attempt} timed out after {timeout:?}")]
    ShardTimeout {
        /// Offending shard.
        shard_index: usize,
        /// 1-based attempt number.
        attempt: u32,
        /// Deadline that was exceeded.
        timeout: Duration,
    },

    /// An attempt stopped emitting heartbeats.
    #[error("Shard {shard_index} attempt {attempt} stalled: no heartbeat for {silent_for:?}")]
    ShardStalled {
        /// Offending shard.
        shard_index: usize,
        /// 1-based attempt number.
        attempt: u32,
        /// Length of the silent window.
        silent_for: Duration,
    },

    /// The worker executing an attempt died (panicked or was torn down).
    #[error("Shard {shard_index} attempt {attempt} crashed: {reason}")]
    ShardCrashed {
        /// Offending shard.
        shard_index: usize,
        /// 1-based attempt number.
        attempt: u32,
        /// Panic payload or join error text.
        reason: String,
    },

    /// The shard observed its cancellation flag and stopped early.
    #[error("Shard {shard_index} was cancelled")]
    Cancelled {
        /// Cancelled shard.
        shard_index: usize,
    },

    /// A shard failed permanently; the whole orchestration is aborted.
    #[error("Shard {shard_index} failed after {attempts} attempt(s) with {}", .source.kind())]
    ShardExecutionFailed {
        /// Offending shard.
        shard_index: usize,
        /// Attempts made before giving up.
        attempts: u32,
        /// Terminal error of the last attempt.
        #[source]
        source: Box<SimulationError>,
    },

    /// Aggregation was asked to combine zero paths.
    #[error("Cannot aggregate an empty result set")]
    EmptyResultSet,

    /// The collected shard results do not match the plan.
    #[error("Shard results do not match the plan: {0}")]
    ResultMismatch(String),

    /// The overall orchestration deadline elapsed.
    #[error("Orchestration deadline of {deadline:?} exceeded with {completed}/{total} shards complete")]
    DeadlineExceeded {
        /// Configured overall deadline.
        deadline: Duration,
        /// Shards finished before the deadline.
        completed: usize,
        /// Shards planned.
        total: usize,
    },
}

impl SimulationError {
    /// Shorthand for [`SimulationError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Whether a fresh attempt of the same shard may succeed.
    ///
    /// Timeouts, stalls and crashed workers are transient. Parameter errors,
    /// allocation failures and cancellations fail identically on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ShardTimeout { .. } | Self::ShardStalled { .. } | Self::ShardCrashed { .. }
        )
    }

    /// Variant name, used when reporting the terminal error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "InvalidParameter",
            Self::UnsupportedPayoff(_) => "UnsupportedPayoff",
            Self::ResourceExhausted { .. } => "ResourceExhausted",
            Self::ShardTimeout { .. } => "ShardTimeout",
            Self::ShardStalled { .. } => "ShardStalled",
            Self::ShardCrashed { .. } => "ShardCrashed",
            Self::Cancelled { .. } => "Cancelled",
            Self::ShardExecutionFailed { .. } => "ShardExecutionFailed",
            Self::EmptyResultSet => "EmptyResultSet",
            Self::ResultMismatch(_) => "ResultMismatch",
            Self::DeadlineExceeded { .. } => "DeadlineExceeded",
        }
    }

    /// The shard this error is attributed to, if any.
    pub fn shard_index(&self) -> Option<usize> {
        match self {
            Self::ResourceExhausted { shard_index, .. }
            | Self::ShardTimeout { shard_index, .. }
            | Self::ShardStalled { shard_index, .. }
            | Self::ShardCrashed { shard_index, .. }
            | Self::Cancelled { shard_index }
            | Self::ShardExecutionFailed { shard_index, .. } => Some(*shard_index),
            _ => None,
        }
    }
}

impl From<AnalyticalError> for SimulationError {
    fn from(err: AnalyticalError) -> Self {
        let name = match err {
            AnalyticalError::InvalidVolatility { .. } => "sigma",
            AnalyticalError::InvalidSpot { .. } => "S0",
            AnalyticalError::InvalidStrike { .. } => "K",
            AnalyticalError::InvalidExpiry { .. } => "T",
        };
        Self::invalid(name, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_retry_classification() {
        let transient = [
            SimulationError::ShardTimeout {
                shard_index: 0,
                attempt: 1,
                timeout: Duration::from_secs(30),
            },
            SimulationError::ShardStalled {
                shard_index: 0,
                attempt: 1,
                silent_for: Duration::from_secs(5),
            },
            SimulationError::ShardCrashed {
                shard_index: 0,
                attempt: 1,
                reason: "boom".to_string(),
            },
        ];
        for err in &transient {
            assert!(err.is_retryable(), "{} should be retryable", err.kind());
        }

        let fatal = [
            SimulationError::invalid("paths_per_shard", "must be > 0"),
            SimulationError::UnsupportedPayoff("lookback".to_string()),
            SimulationError::ResourceExhausted {
                shard_index: 1,
                paths_in_shard: 10,
                steps_per_path: 10,
                requested_bytes: 800,
            },
            SimulationError::Cancelled { shard_index: 2 },
            SimulationError::EmptyResultSet,
        ];
        for err in &fatal {
            assert!(!err.is_retryable(), "{} must not be retried", err.kind());
        }
    }

    #[test]
    fn test_execution_failure_reports_shard_and_cause() {
        let err = SimulationError::ShardExecutionFailed {
            shard_index: 7,
            attempts: 5,
            source: Box::new(SimulationError::ShardTimeout {
                shard_index: 7,
                attempt: 5,
                timeout: Duration::from_secs(30),
            }),
        };

        let message = err.to_string();
        assert!(message.contains("Shard 7"));
        assert!(message.contains("5 attempt(s)"));
        assert!(message.contains("ShardTimeout"));
        assert_eq!(err.shard_index(), Some(7));

        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("timed out"));
    }

    #[test]
    fn test_resource_exhausted_display_includes_shape() {
        let err = SimulationError::ResourceExhausted {
            shard_index: 2,
            paths_in_shard: 50_000,
            steps_per_path: 128,
            requested_bytes: 51_200_000,
        };
        let message = err.to_string();
        assert!(message.contains("50000 paths x 128 steps"));
        assert!(message.contains("51200000 bytes"));
    }

    #[test]
    fn test_from_analytical_error() {
        let err: SimulationError = AnalyticalError::InvalidVolatility { volatility: -0.1 }.into();
        assert!(matches!(
            err,
            SimulationError::InvalidParameter { name: "sigma", .. }
        ));
    }
}
