//! Run command implementation
//!
//! Executes a request file end to end and produces the result document.

use std::path::Path;

use pricer_sharding::{Orchestrator, SimulationReport};
use tracing::info;

use super::load_request;
use crate::config::CliConfig;
use crate::Result;

/// Request overrides given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOverrides {
    /// Replaces the request's `max_concurrency`
    pub max_concurrency: Option<usize>,
    /// Replaces the request's `master_seed`
    pub seed: Option<u64>,
}

/// Run the simulation described by `request_path`
pub async fn run(
    config: &CliConfig,
    request_path: &Path,
    overrides: RunOverrides,
) -> Result<SimulationReport> {
    let mut request = load_request(request_path)?;
    if let Some(max_concurrency) = overrides.max_concurrency {
        request.max_concurrency = max_concurrency;
    }
    if let Some(seed) = overrides.seed {
        request.master_seed = seed;
    }

    info!(
        request = %request_path.display(),
        worker_threads = config.engine.resolved_worker_threads(),
        max_concurrency = request.max_concurrency,
        seed = request.master_seed,
        "Running simulation"
    );

    let orchestrator = Orchestrator::local(&config.engine)?;
    let result = orchestrator.run(&request).await?;
    Ok(SimulationReport::new(&request, &result))
}
