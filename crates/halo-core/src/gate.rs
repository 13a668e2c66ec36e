//! Per-device session serialization.
//!
//! The controller accepts one authenticated session at a time, so command
//! sessions against the same device must not overlap. [`SessionGate`] is a
//! cooperative, in-process mutual exclusion flag:
//!
//! - Acquisition is a compare-and-swap on the in-session flag, so two
//!   waiters can never both observe it clear and enter together.
//! - Waiters are woken when the holder releases, and re-check at a fixed
//!   poll interval in case a wakeup is missed.
//! - The flag is cleared by dropping the [`SessionPermit`], which also
//!   happens when the future holding it is cancelled. An
//!   [`OwnedSessionPermit`] can be handed to a spawned task so the flag
//!   stays set until that task is done.
//!
//! There is no fairness guarantee between waiters.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::debug;

/// Default interval at which waiters re-check the gate.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Mutual exclusion for command sessions against one device.
///
/// # Example
///
/// ```
/// use halo_core::gate::SessionGate;
///
/// #[tokio::main]
/// async fn main() {
///     let gate = SessionGate::new();
///     let value = gate
///         .with_exclusive_access(|| async {
///             // talk to the device
///             42
///         })
///         .await;
///     assert_eq!(value, 42);
///     assert!(!gate.is_in_session());
/// }
/// ```
#[derive(Debug)]
pub struct SessionGate {
    in_session: AtomicBool,
    released: Notify,
    poll_interval: Duration,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGate {
    /// Create a gate with the default poll interval.
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Create a gate with a custom poll interval.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            in_session: AtomicBool::new(false),
            released: Notify::new(),
            poll_interval,
        }
    }

    /// The interval at which waiters re-check the gate.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Whether a session currently holds the gate.
    pub fn is_in_session(&self) -> bool {
        self.in_session.load(Ordering::Acquire)
    }

    /// Take the gate if it is free, without waiting.
    pub fn try_acquire(&self) -> Option<SessionPermit<'_>> {
        self.try_mark().then(|| SessionPermit { gate: self })
    }

    /// Wait until the gate is free and take it.
    pub async fn acquire(&self) -> SessionPermit<'_> {
        self.mark().await;
        SessionPermit { gate: self }
    }

    /// Like [`try_acquire`](Self::try_acquire), but the permit owns a
    /// handle to the gate and can be moved into a spawned task.
    pub fn try_acquire_owned(self: Arc<Self>) -> Option<OwnedSessionPermit> {
        self.try_mark().then(|| OwnedSessionPermit { gate: self })
    }

    /// Like [`acquire`](Self::acquire), but the permit owns a handle to the
    /// gate and can outlive the caller's borrow.
    pub async fn acquire_owned(self: Arc<Self>) -> OwnedSessionPermit {
        self.mark().await;
        OwnedSessionPermit { gate: self }
    }

    fn try_mark(&self) -> bool {
        self.in_session
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    async fn mark(&self) {
        loop {
            if self.try_mark() {
                return;
            }

            // Register for the wakeup before re-checking so a release in
            // between is not lost.
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            if self.try_mark() {
                return;
            }

            debug!("Session in progress, waiting");
            let _ = tokio::time::timeout(self.poll_interval, released).await;
        }
    }

    /// Run `op` while holding the gate.
    ///
    /// The gate is released when `op` completes, fails, or is cancelled.
    pub async fn with_exclusive_access<F, Fut, T>(&self, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.acquire().await;
        op().await
    }

    fn release(&self) {
        self.in_session.store(false, Ordering::Release);
        self.released.notify_waiters();
    }
}

/// Proof of holding a [`SessionGate`]. Releases the gate when dropped.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct SessionPermit<'a> {
    gate: &'a SessionGate,
}

impl Drop for SessionPermit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// A [`SessionPermit`] that owns its gate handle.
///
/// Used where the gate must stay held until work finishes in another task,
/// such as a disconnect spawned after the session future was dropped.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct OwnedSessionPermit {
    gate: Arc<SessionGate>,
}

impl Drop for OwnedSessionPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
