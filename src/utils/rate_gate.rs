//! A counting gate in front of a single upstream.
//!
//! At most `capacity` calls run at once. After each call the slot stays taken
//! for `period / capacity`, which keeps overall throughput near `capacity`
//! calls per `period` no matter how fast the upstream answers.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::debug;

#[derive(Debug)]
pub struct RateGate {
    permits: Semaphore,
    capacity: usize,
    cooldown: Duration,
}

impl RateGate {
    /// Creates a gate allowing `capacity` concurrent calls per `period`.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize, period: Duration) -> Self {
        let capacity = capacity.max(1);
        let cooldown = period / u32::try_from(capacity).unwrap_or(u32::MAX);

        Self {
            permits: Semaphore::new(capacity),
            capacity,
            cooldown,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Delay applied after every call before its slot is handed back.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Slots free right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Runs `call` inside the gate, waiting for a slot first.
    ///
    /// The cooldown is applied whatever `call` returns, and before the result
    /// is handed back to the caller.
    pub async fn run<F>(&self, call: F) -> F::Output
    where
        F: Future,
    {
        if self.permits.available_permits() == 0 {
            debug!("Rate gate full, waiting for a free slot");
        }
        // The semaphore is never closed, so this only fails if that changes.
        let permit = self.permits.acquire().await;

        let output = call.await;

        tokio::time::sleep(self.cooldown).await;
        drop(permit);

        output
    }
}
