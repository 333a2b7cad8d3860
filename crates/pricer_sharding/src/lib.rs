//! # Pricer Sharding (L3: Sharded Monte Carlo Engine)
//!
//! Splits a large GBM Monte Carlo simulation into independently executable
//! shards, runs each shard under a timeout/retry/heartbeat policy and
//! combines the per-shard `(count, Σx, Σx²)` triples into one estimate with
//! a 95% confidence interval. European calls are cross-checked against the
//! Black-Scholes price from `pricer_models`.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`request`] | Immutable [`SimulationRequest`] and its builder |
//! | [`planner`] | Splits the path count into [`ShardSpec`]s |
//! | [`simulator`] | Simulates one shard, emits heartbeats, honours cancellation |
//! | [`orchestrator`] | Substrate seam, local substrate, retry/timeout policy |
//! | [`aggregate`] | Order-independent reduction into an [`Estimate`] |
//! | [`validator`] | Closed-form cross-check |
//! | [`report`] | Result document |
//!
//! ## Quick Start
//!
//! ```rust
//! use pricer_sharding::{EngineConfig, Orchestrator, SimulationReport, SimulationRequest};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let request = SimulationRequest::builder()
//!     .num_paths_total(10_000)
//!     .paths_per_shard(2_500)
//!     .steps_per_path(16)
//!     .build()
//!     .unwrap();
//!
//! let orchestrator = Orchestrator::local(&EngineConfig::default()).unwrap();
//! let result = orchestrator.run(&request).await.unwrap();
//!
//! let report = SimulationReport::new(&request, &result);
//! assert_eq!(report.shards, 4);
//! assert!(report.black_scholes_call.is_some());
//! # });
//! ```
//!
//! ## Determinism
//!
//! Shard seeds derive from `(master_seed, shard_index)` only, and the
//! aggregator sorts by shard index before a fixed-shape pairwise reduction.
//! The same request therefore yields bit-identical statistics regardless of
//! concurrency, completion order or retries.

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod payoff;
pub mod planner;
pub mod report;
pub mod request;
pub mod rng;
pub mod shard;
pub mod simulator;
pub mod stats;
pub mod validator;

pub use aggregate::{AggregateResult, Estimate};
pub use config::EngineConfig;
pub use error::{Result, SimulationError};
pub use orchestrator::{ExecutionPolicy, ExecutionSubstrate, LocalSubstrate, Orchestrator};
pub use payoff::PayoffKind;
pub use report::SimulationReport;
pub use request::{MarketParams, SimulationRequest};
pub use shard::{ShardResult, ShardSpec};
pub use simulator::{simulate_shard, ShardSimulator};
pub use validator::AnalyticCheck;
