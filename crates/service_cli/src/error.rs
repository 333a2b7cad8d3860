//! CLI error types

use std::path::PathBuf;

use pricer_sharding::SimulationError;
use thiserror::Error;

/// Result alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced by the `neutryx-mc` binary
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration value or file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unrecognised log level
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Environment variable that could not be parsed
    #[error("Invalid value for {name}: {value:?}")]
    Env {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },

    /// File could not be read
    #[error("Failed to read {}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Request file is not a valid request document
    #[error("Invalid request file {}", path.display())]
    Request {
        /// Request file
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Async runtime could not be started
    #[error("Failed to start runtime")]
    Runtime(#[source] std::io::Error),

    /// Report serialisation failure
    #[error("Failed to serialise output")]
    Json(#[from] serde_json::Error),

    /// Engine failure
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::time::Duration;

    #[test]
    fn test_simulation_error_keeps_source_chain() {
        let err = CliError::from(SimulationError::ShardExecutionFailed {
            shard_index: 3,
            attempts: 5,
            source: Box::new(SimulationError::ShardTimeout {
                shard_index: 3,
                attempt: 5,
                timeout: Duration::from_secs(30),
            }),
        });

        assert_eq!(
            err.to_string(),
            "Shard 3 failed after 5 attempt(s) with ShardTimeout"
        );
        let cause = err.source().unwrap();
        assert_eq!(cause.to_string(), "Shard 3 attempt 5 timed out after 30s");
    }

    #[test]
    fn test_env_error_message() {
        let err = CliError::Env {
            name: "NEUTRYX_MC_WORKER_THREADS",
            value: "many".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for NEUTRYX_MC_WORKER_THREADS: \"many\""
        );
    }
}
