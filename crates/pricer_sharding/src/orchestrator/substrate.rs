//! Execution substrate: runs shard work items with timeout, retry and
//! heartbeat liveness.
//!
//! [`ExecutionSubstrate`] is the seam the orchestrator talks to.
//! [`LocalSubstrate`] is the in-process implementation: every attempt runs
//! a [`ShardWorker`] on tokio's blocking pool while an async supervisor
//! races it against its deadline and heartbeat window.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinError;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info, warn};

use super::policy::SubmitOptions;
use crate::error::{Result, SimulationError};
use crate::shard::{ShardResult, ShardSpec};
use crate::simulator::{CancelFlag, Heartbeat, HeartbeatSink, ShardSimulator};

/// Callback receiving every heartbeat observed by a substrate.
pub type ProgressCallback = Arc<dyn Fn(Heartbeat) + Send + Sync>;

/// Submits a shard and resolves to its result.
///
/// Implementations own the retry loop: they apply `options.retry` to
/// classified attempt failures and surface a permanent failure as
/// [`SimulationError::ShardExecutionFailed`].
#[async_trait]
pub trait ExecutionSubstrate: Send + Sync {
    /// Executes `spec` to completion or permanent failure.
    async fn execute(&self, spec: ShardSpec, options: SubmitOptions) -> Result<ShardResult>;
}

/// Synchronous shard body run on a worker thread.
pub trait ShardWorker: Send + Sync + 'static {
    /// Runs one attempt of `spec`.
    fn run(
        &self,
        spec: &ShardSpec,
        attempt: u32,
        heartbeats: &dyn HeartbeatSink,
        cancel: &CancelFlag,
    ) -> Result<ShardResult>;
}

/// Production worker: simulates the shard's GBM paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonteCarloWorker {
    buffer_limit: Option<usize>,
}

impl MonteCarloWorker {
    /// Creates a worker with an optional cap on full-path buffers.
    pub fn new(buffer_limit: Option<usize>) -> Self {
        Self { buffer_limit }
    }
}

impl ShardWorker for MonteCarloWorker {
    fn run(
        &self,
        spec: &ShardSpec,
        attempt: u32,
        heartbeats: &dyn HeartbeatSink,
        cancel: &CancelFlag,
    ) -> Result<ShardResult> {
        let run = ShardSimulator::new(*spec)
            .with_attempt(attempt)
            .with_buffer_limit(self.buffer_limit)
            .run(heartbeats, cancel)?;

        if let Some(paths) = &run.paths {
            debug!(
                shard_index = spec.shard_index,
                bytes = paths.byte_len(),
                "Full path buffer retained for the attempt"
            );
        }
        Ok(run.result)
    }
}

/// Raises the flag when the supervising future goes away.
struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

fn crash_reason(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        err.to_string()
    }
}

/// `from + duration`, saturating at roughly thirty years out.
pub(crate) fn instant_after(from: Instant, duration: Duration) -> Instant {
    from.checked_add(duration)
        .unwrap_or_else(|| from + Duration::from_secs(86_400 * 365 * 30))
}

/// In-process substrate backed by tokio's blocking thread pool.
///
/// At most `worker_threads` attempts execute at once, across every shard
/// submitted to the same substrate.
///
/// # Examples
///
/// ```rust
/// use pricer_sharding::orchestrator::{ExecutionPolicy, ExecutionSubstrate, LocalSubstrate};
/// use pricer_sharding::planner::plan_shards;
/// use pricer_sharding::SimulationRequest;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let request = SimulationRequest::builder()
///     .num_paths_total(1_000)
///     .paths_per_shard(1_000)
///     .steps_per_path(4)
///     .build()
///     .unwrap();
/// let spec = plan_shards(&request).unwrap()[0];
///
/// let substrate = LocalSubstrate::new(2);
/// let options = ExecutionPolicy::default().submit_options(&spec);
/// let result = substrate.execute(spec, options).await.unwrap();
/// assert_eq!(result.count, 1_000);
/// # });
/// ```
pub struct LocalSubstrate<W: ShardWorker = MonteCarloWorker> {
    worker: Arc<W>,
    slots: Arc<Semaphore>,
    worker_threads: usize,
    progress: Option<ProgressCallback>,
}

impl LocalSubstrate<MonteCarloWorker> {
    /// Monte Carlo substrate with `worker_threads` slots (0 = CPU count).
    pub fn new(worker_threads: usize) -> Self {
        Self::with_worker(MonteCarloWorker::default(), worker_threads)
    }
}

impl<W: ShardWorker> LocalSubstrate<W> {
    /// Substrate running `worker` with `worker_threads` slots (0 = CPU count).
    ///
    /// Slot counts above [`Semaphore::MAX_PERMITS`] are clamped to it.
    pub fn with_worker(worker: W, worker_threads: usize) -> Self {
        let worker_threads = if worker_threads == 0 {
            num_cpus::get().max(1)
        } else {
            worker_threads.min(Semaphore::MAX_PERMITS)
        };
        Self {
            worker: Arc::new(worker),
            slots: Arc::new(Semaphore::new(worker_threads)),
            worker_threads,
            progress: None,
        }
    }

    /// Installs a callback invoked for every heartbeat.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Number of attempts that may execute concurrently.
    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    fn report(&self, heartbeat: Heartbeat) {
        debug!(
            shard_index = heartbeat.shard_index,
            attempt = heartbeat.attempt,
            paths_processed = heartbeat.paths_processed,
            "Heartbeat"
        );
        if let Some(progress) = &self.progress {
            progress(heartbeat);
        }
    }

    /// Runs and supervises a single attempt.
    async fn attempt(
        &self,
        spec: &ShardSpec,
        attempt: u32,
        options: &SubmitOptions,
    ) -> Result<ShardResult> {
        let shard_index = spec.shard_index;
        let slot = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| SimulationError::ShardCrashed {
                shard_index,
                attempt,
                reason: "worker pool closed".to_string(),
            })?;

        let cancel = CancelFlag::new();
        let _guard = CancelOnDrop(cancel.clone());
        let (heartbeat_tx, mut heartbeat_rx) = mpsc::unbounded_channel::<Heartbeat>();

        let worker = Arc::clone(&self.worker);
        let worker_spec = *spec;
        let worker_cancel = cancel.clone();
        let mut handle = tokio::task::spawn_blocking(move || {
            // The slot is held until the worker thread is actually free.
            let _slot = slot;
            worker.run(&worker_spec, attempt, &heartbeat_tx, &worker_cancel)
        });

        let started = Instant::now();
        let deadline = instant_after(started, options.timeout);
        let mut last_beat = started;
        debug!(shard_index, attempt, timeout = ?options.timeout, "Shard attempt started");

        loop {
            let stall_at = options
                .heartbeat_timeout
                .map(|window| instant_after(last_beat, window));

            tokio::select! {
                joined = &mut handle => {
                    while let Ok(heartbeat) = heartbeat_rx.try_recv() {
                        self.report(heartbeat);
                    }
                    return match joined {
                        Ok(outcome) => outcome,
                        Err(err) => Err(SimulationError::ShardCrashed {
                            shard_index,
                            attempt,
                            reason: crash_reason(err),
                        }),
                    };
                }
                Some(heartbeat) = heartbeat_rx.recv() => {
                    last_beat = Instant::now();
                    self.report(heartbeat);
                }
                _ = sleep_until(deadline) => {
                    cancel.cancel();
                    return Err(SimulationError::ShardTimeout {
                        shard_index,
                        attempt,
                        timeout: options.timeout,
                    });
                }
                _ = sleep_until(stall_at.unwrap_or(deadline)), if stall_at.is_some() => {
                    cancel.cancel();
                    return Err(SimulationError::ShardStalled {
                        shard_index,
                        attempt,
                        silent_for: last_beat.elapsed(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl<W: ShardWorker> ExecutionSubstrate for LocalSubstrate<W> {
    async fn execute(&self, spec: ShardSpec, options: SubmitOptions) -> Result<ShardResult> {
        let shard_index = spec.shard_index;
        let mut attempt = 1;

        loop {
            match self.attempt(&spec, attempt, &options).await {
                Ok(result) => {
                    if attempt > 1 {
                        info!(shard_index, attempt, "Shard succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(err) if options.retry.should_retry(&err, attempt) => {
                    let pause = options.retry.backoff(attempt);
                    warn!(
                        shard_index,
                        attempt,
                        error = %err,
                        backoff_ms = pause.as_millis() as u64,
                        "Shard attempt failed, retrying"
                    );
                    sleep(pause).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        shard_index,
                        attempts = attempt,
                        kind = err.kind(),
                        error = %err,
                        "Shard failed permanently"
                    );
                    return Err(SimulationError::ShardExecutionFailed {
                        shard_index,
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
            }
        }
    }
}
