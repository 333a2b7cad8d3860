//! Progress and cancellation plumbing between a running shard and its
//! supervisor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

/// Progress signal emitted by a running shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Heartbeat {
    /// Shard emitting the signal.
    pub shard_index: usize,
    /// 1-based attempt number of the execution.
    pub attempt: u32,
    /// Paths completed so far in this attempt.
    pub paths_processed: usize,
}

/// Receiver of heartbeats.
///
/// Delivery is best effort: implementations must not block for long and
/// have no way to fail the shard.
pub trait HeartbeatSink: Send + Sync {
    /// Records one heartbeat.
    fn beat(&self, heartbeat: Heartbeat);
}

/// Sink that drops every heartbeat.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHeartbeat;

impl HeartbeatSink for NoHeartbeat {
    #[inline]
    fn beat(&self, _heartbeat: Heartbeat) {}
}

impl HeartbeatSink for UnboundedSender<Heartbeat> {
    #[inline]
    fn beat(&self, heartbeat: Heartbeat) {
        // A closed channel means nobody is watching any more.
        let _ = self.send(heartbeat);
    }
}

impl<F> HeartbeatSink for F
where
    F: Fn(Heartbeat) + Send + Sync,
{
    #[inline]
    fn beat(&self, heartbeat: Heartbeat) {
        self(heartbeat)
    }
}

/// Cooperative cancellation flag shared between a shard and its supervisor.
///
/// Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_closed_channel_does_not_panic() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Heartbeat>();
        drop(rx);
        tx.beat(Heartbeat {
            shard_index: 0,
            attempt: 1,
            paths_processed: 10,
        });
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |hb: Heartbeat| seen.lock().unwrap().push(hb.paths_processed);
        sink.beat(Heartbeat {
            shard_index: 1,
            attempt: 2,
            paths_processed: 5,
        });
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }
}
