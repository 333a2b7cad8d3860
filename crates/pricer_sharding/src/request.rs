//! Simulation request model.
//!
//! [`SimulationRequest`] is the immutable input of one orchestration. It is
//! deserialised from the JSON invocation contract or built with
//! [`SimulationRequest::builder`], and validated before anything is planned.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::payoff::PayoffKind;
use crate::planner::{shard_count, MAX_SHARDS};

/// Default number of paths simulated by the reference run.
pub const DEFAULT_TOTAL_PATHS: usize = 200_000;

/// Default number of GBM steps per path.
pub const DEFAULT_STEPS_PER_PATH: usize = 128;

/// Default upper bound on shard size.
pub const DEFAULT_PATHS_PER_SHARD: usize = 50_000;

/// Default heartbeat interval in completed paths.
pub const DEFAULT_HEARTBEAT_EVERY_PATHS: usize = 10_000;

/// Default master seed.
pub const DEFAULT_MASTER_SEED: u64 = 42;

/// Market and contract parameters shared by every path.
///
/// Serialises with the short names used on the wire (`S0`, `K`, `mu`,
/// `sigma`, `r`, `T`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Initial spot price (S₀).
    #[serde(rename = "S0")]
    pub spot: f64,
    /// Strike (K).
    #[serde(rename = "K")]
    pub strike: f64,
    /// Real-world drift of the simulated asset (μ), annualised.
    #[serde(rename = "mu")]
    pub drift: f64,
    /// Volatility (σ), annualised.
    #[serde(rename = "sigma")]
    pub volatility: f64,
    /// Continuously compounded discount rate (r).
    #[serde(rename = "r")]
    pub rate: f64,
    /// Time to maturity (T) in years.
    #[serde(rename = "T")]
    pub maturity: f64,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            spot: 100.0,
            strike: 100.0,
            drift: 0.05,
            volatility: 0.2,
            rate: 0.01,
            maturity: 1.0,
        }
    }
}

impl MarketParams {
    /// Discount factor e^(-rT).
    #[inline]
    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.maturity).exp()
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `S0` is not positive, `K`, `sigma` or `T` is
    /// negative, or any value is not finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.spot.is_finite() && self.spot > 0.0) {
            return Err(SimulationError::invalid(
                "S0",
                format!("must be finite and > 0, got {}", self.spot),
            ));
        }
        if !(self.strike.is_finite() && self.strike >= 0.0) {
            return Err(SimulationError::invalid(
                "K",
                format!("must be finite and >= 0, got {}", self.strike),
            ));
        }
        if !self.drift.is_finite() {
            return Err(SimulationError::invalid("mu", "must be finite"));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(SimulationError::invalid(
                "sigma",
                format!("must be finite and >= 0, got {}", self.volatility),
            ));
        }
        if !self.rate.is_finite() {
            return Err(SimulationError::invalid("r", "must be finite"));
        }
        if !(self.maturity.is_finite() && self.maturity >= 0.0) {
            return Err(SimulationError::invalid(
                "T",
                format!("must be finite and >= 0, got {}", self.maturity),
            ));
        }
        Ok(())
    }
}

fn default_heartbeat_every_paths() -> usize {
    DEFAULT_HEARTBEAT_EVERY_PATHS
}

fn default_discount() -> bool {
    true
}

fn default_master_seed() -> u64 {
    DEFAULT_MASTER_SEED
}

/// One sharded Monte Carlo pricing request.
///
/// # Examples
///
/// ```rust
/// use pricer_sharding::{PayoffKind, SimulationRequest};
///
/// let request: SimulationRequest = serde_json::from_str(r#"{
///     "num_paths_total": 200000,
///     "steps_per_path": 128,
///     "paths_per_shard": 50000,
///     "S0": 100.0, "K": 100.0, "mu": 0.05, "sigma": 0.2, "r": 0.01, "T": 1.0,
///     "payoff": "european_call"
/// }"#).unwrap();
///
/// assert_eq!(request.payoff, PayoffKind::EuropeanCall);
/// assert_eq!(request.master_seed, 42);
/// assert!(request.discount);
/// assert!(request.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Total number of paths across all shards.
    pub num_paths_total: usize,
    /// GBM steps per path.
    pub steps_per_path: usize,
    /// Upper bound on the number of paths in one shard.
    pub paths_per_shard: usize,
    /// Maximum shards in flight; 0 submits every shard at once.
    #[serde(default)]
    pub max_concurrency: usize,
    /// Heartbeat interval in completed paths; 0 disables heartbeats.
    #[serde(default = "default_heartbeat_every_paths")]
    pub heartbeat_every_paths: usize,
    /// Market and contract parameters.
    #[serde(flatten)]
    pub market: MarketParams,
    /// Payoff evaluated on each path.
    pub payoff: PayoffKind,
    /// Multiply each payoff by e^(-rT).
    #[serde(default = "default_discount")]
    pub discount: bool,
    /// Seed from which every shard seed is derived.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Retain the full price history of every path (memory-pressure mode).
    #[serde(default)]
    pub store_full_paths: bool,
}

impl SimulationRequest {
    /// Creates a builder preloaded with the reference run parameters.
    pub fn builder() -> SimulationRequestBuilder {
        SimulationRequestBuilder::default()
    }

    /// Validates counts and market parameters.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.num_paths_total == 0 {
            return Err(SimulationError::invalid("num_paths_total", "must be > 0"));
        }
        if self.steps_per_path == 0 {
            return Err(SimulationError::invalid("steps_per_path", "must be > 0"));
        }
        if self.paths_per_shard == 0 {
            return Err(SimulationError::invalid("paths_per_shard", "must be > 0"));
        }
        let shards = shard_count(self.num_paths_total, self.paths_per_shard);
        if shards > MAX_SHARDS {
            return Err(SimulationError::invalid(
                "paths_per_shard",
                format!("request needs {shards} shards, at most {MAX_SHARDS} allowed"),
            ));
        }
        self.market.validate()
    }

    /// Total number of step evaluations across all paths.
    pub fn step_evaluations(&self) -> u128 {
        self.num_paths_total as u128 * self.steps_per_path as u128
    }
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            num_paths_total: DEFAULT_TOTAL_PATHS,
            steps_per_path: DEFAULT_STEPS_PER_PATH,
            paths_per_shard: DEFAULT_PATHS_PER_SHARD,
            max_concurrency: 0,
            heartbeat_every_paths: DEFAULT_HEARTBEAT_EVERY_PATHS,
            market: MarketParams::default(),
            payoff: PayoffKind::EuropeanCall,
            discount: true,
            master_seed: DEFAULT_MASTER_SEED,
            store_full_paths: false,
        }
    }
}

/// Builder for [`SimulationRequest`].
///
/// Starts from the reference run (200,000 paths of 128 steps in shards of
/// 50,000, ATM European call) and validates on [`build`](Self::build).
///
/// # Examples
///
/// ```rust
/// use pricer_sharding::{PayoffKind, SimulationRequest};
///
/// let request = SimulationRequest::builder()
///     .num_paths_total(1_000)
///     .paths_per_shard(250)
///     .payoff(PayoffKind::AsianCall)
///     .build()
///     .expect("valid request");
///
/// assert_eq!(request.num_paths_total, 1_000);
/// assert_eq!(request.steps_per_path, 128);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SimulationRequestBuilder {
    request: SimulationRequest,
}

impl SimulationRequestBuilder {
    /// Sets the total number of paths.
    pub fn num_paths_total(mut self, paths: usize) -> Self {
        self.request.num_paths_total = paths;
        self
    }

    /// Sets the number of steps per path.
    pub fn steps_per_path(mut self, steps: usize) -> Self {
        self.request.steps_per_path = steps;
        self
    }

    /// Sets the maximum shard size.
    pub fn paths_per_shard(mut self, paths: usize) -> Self {
        self.request.paths_per_shard = paths;
        self
    }

    /// Sets the concurrency bound (0 = unbounded).
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.request.max_concurrency = max;
        self
    }

    /// Sets the heartbeat interval (0 = disabled).
    pub fn heartbeat_every_paths(mut self, paths: usize) -> Self {
        self.request.heartbeat_every_paths = paths;
        self
    }

    /// Replaces all market parameters.
    pub fn market(mut self, market: MarketParams) -> Self {
        self.request.market = market;
        self
    }

    /// Sets S₀.
    pub fn spot(mut self, spot: f64) -> Self {
        self.request.market.spot = spot;
        self
    }

    /// Sets K.
    pub fn strike(mut self, strike: f64) -> Self {
        self.request.market.strike = strike;
        self
    }

    /// Sets μ.
    pub fn drift(mut self, drift: f64) -> Self {
        self.request.market.drift = drift;
        self
    }

    /// Sets σ.
    pub fn volatility(mut self, volatility: f64) -> Self {
        self.request.market.volatility = volatility;
        self
    }

    /// Sets r.
    pub fn rate(mut self, rate: f64) -> Self {
        self.request.market.rate = rate;
        self
    }

    /// Sets T.
    pub fn maturity(mut self, maturity: f64) -> Self {
        self.request.market.maturity = maturity;
        self
    }

    /// Sets the payoff.
    pub fn payoff(mut self, payoff: PayoffKind) -> Self {
        self.request.payoff = payoff;
        self
    }

    /// Enables or disables discounting.
    pub fn discount(mut self, discount: bool) -> Self {
        self.request.discount = discount;
        self
    }

    /// Sets the master seed.
    pub fn master_seed(mut self, seed: u64) -> Self {
        self.request.master_seed = seed;
        self
    }

    /// Enables full path retention.
    pub fn store_full_paths(mut self, store: bool) -> Self {
        self.request.store_full_paths = store;
        self
    }

    /// Validates and returns the request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for any out-of-domain value.
    pub fn build(self) -> Result<SimulationRequest> {
        self.request.validate()?;
        Ok(self.request)
    }
}
