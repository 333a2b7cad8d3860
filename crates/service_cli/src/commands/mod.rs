//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod demo;
pub mod plan;
pub mod run;

use std::path::Path;

use pricer_sharding::SimulationRequest;
use tracing::debug;

use crate::error::{CliError, Result};

/// Reads and validates a JSON request document.
pub fn load_request(path: &Path) -> Result<SimulationRequest> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let request: SimulationRequest =
        serde_json::from_str(&content).map_err(|source| CliError::Request {
            path: path.to_path_buf(),
            source,
        })?;
    request.validate()?;

    debug!(
        path = %path.display(),
        paths = request.num_paths_total,
        payoff = %request.payoff,
        "Loaded simulation request"
    );
    Ok(request)
}
