//! Demo command: the reference sharded run.
//!
//! Prices an at-the-money European call with 200,000 GBM paths of 128 steps,
//! split into 4 shards of 50,000, and compares the estimate with
//! Black-Scholes.
//!
//! # Expected Output
//!
//! ```text
//! [Demo] Planned 4 shards of up to 50000 paths
//! [Demo] shard 0: 10000/50000 paths
//! ...
//! Estimate         : ~10.9
//! Black-Scholes    : 8.433...
//! ```
//!
//! The drift (mu = 0.05) differs from the rate (r = 0.01), so the estimate
//! is not risk-neutral and sits above the Black-Scholes price.

use std::sync::Arc;

use pricer_sharding::orchestrator::{LocalSubstrate, MonteCarloWorker};
use pricer_sharding::planner::shard_count;
use pricer_sharding::simulator::Heartbeat;
use pricer_sharding::{Orchestrator, SimulationReport, SimulationRequest};

use crate::config::CliConfig;
use crate::Result;

/// Runs the reference request.
pub async fn run(config: &CliConfig) -> Result<SimulationReport> {
    execute(config, &SimulationRequest::default()).await
}

/// Runs `request` with progress printed to stderr.
pub async fn execute(config: &CliConfig, request: &SimulationRequest) -> Result<SimulationReport> {
    config.validate()?;

    eprintln!("========================================");
    eprintln!("Sharded Monte Carlo Demo");
    eprintln!("========================================");
    eprintln!(
        "[Demo] {} paths x {} steps, payoff {}, seed {}",
        request.num_paths_total, request.steps_per_path, request.payoff, request.master_seed
    );
    eprintln!(
        "[Demo] Planned {} shards of up to {} paths",
        shard_count(request.num_paths_total, request.paths_per_shard),
        request.paths_per_shard
    );

    let per_shard = request.paths_per_shard;
    let substrate = LocalSubstrate::with_worker(
        MonteCarloWorker::new(config.engine.path_buffer_limit_bytes),
        config.engine.resolved_worker_threads(),
    )
    .with_progress(Arc::new(move |hb: Heartbeat| {
        eprintln!(
            "[Demo] shard {}: {}/{} paths",
            hb.shard_index, hb.paths_processed, per_shard
        );
    }));

    let orchestrator = Orchestrator::new(substrate, config.engine.execution_policy());
    let result = orchestrator.run(request).await?;
    let report = SimulationReport::new(request, &result);

    eprintln!("----------------------------------------");
    eprintln!("Estimate         : {:.6}", report.estimate);
    eprintln!(
        "95% CI           : [{:.6}, {:.6}]",
        report.confidence_95[0], report.confidence_95[1]
    );
    eprintln!("Std. error       : {:.6}", report.stderr);
    if let Some(bs) = report.black_scholes_call {
        eprintln!("Black-Scholes    : {bs:.6}");
    }
    if let Some(err) = report.abs_error_vs_bs {
        eprintln!("|MC - BS|        : {err:.6}");
    }
    eprintln!("========================================");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_sharding::PayoffKind;

    #[tokio::test]
    async fn test_demo_small_run() {
        let request = SimulationRequest::builder()
            .num_paths_total(2_000)
            .paths_per_shard(500)
            .steps_per_path(8)
            .heartbeat_every_paths(250)
            .build()
            .unwrap();

        let report = execute(&CliConfig::default(), &request).await.unwrap();

        assert_eq!(report.shards, 4);
        assert_eq!(report.num_paths_total, 2_000);
        assert_eq!(report.payoff, PayoffKind::EuropeanCall);
        assert!(report.black_scholes_call.is_some());
    }
}
