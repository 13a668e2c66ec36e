//! Connection guard for automatic disconnect on drop.
//!
//! This module provides RAII-style connection management so a session
//! closes its connection exactly once, even when the future driving it is
//! cancelled part-way through. A guard can also hold the session gate so
//! the gate is only released once the link is actually down.

use std::ops::Deref;

use tokio::runtime::Handle;
use tracing::warn;

use crate::error::TransportResult;
use crate::gate::OwnedSessionPermit;
use crate::transport::Connection;

/// A guard that disconnects from the device when dropped.
///
/// Call [`ConnectionGuard::close`] on the normal path to observe the
/// disconnect result. If the guard is dropped instead, the disconnect is
/// spawned onto the current runtime. A permit passed to
/// [`ConnectionGuard::holding`] is released after the disconnect completes,
/// on either path.
///
/// # Example
///
/// ```ignore
/// use halo_core::guard::ConnectionGuard;
///
/// let guard = ConnectionGuard::new(transport.connect(timeout).await?);
/// let key = guard.read_characteristic(SESSION_KEY).await;
/// guard.close().await?;
/// ```
pub struct ConnectionGuard<C: Connection + 'static> {
    connection: Option<C>,
    permit: Option<OwnedSessionPermit>,
}

impl<C: Connection + 'static> ConnectionGuard<C> {
    /// Create a new connection guard.
    pub fn new(connection: C) -> Self {
        Self {
            connection: Some(connection),
            permit: None,
        }
    }

    /// Keep `permit` until the connection has been closed.
    #[must_use]
    pub fn holding(mut self, permit: OwnedSessionPermit) -> Self {
        self.permit = Some(permit);
        self
    }

    /// Disconnect now and report the result.
    pub async fn close(mut self) -> TransportResult<()> {
        let result = match self.connection.take() {
            Some(connection) => connection.disconnect().await,
            None => Ok(()),
        };
        drop(self.permit.take());
        result
    }

    /// Take ownership of the connection, preventing automatic disconnect.
    ///
    /// Any held permit is released. Returns `None` if the connection was
    /// already closed.
    pub fn into_inner(mut self) -> Option<C> {
        drop(self.permit.take());
        self.connection.take()
    }
}

impl<C: Connection + 'static> Deref for ConnectionGuard<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        // Only `close` and `into_inner` take the connection, and both consume the guard.
        match &self.connection {
            Some(connection) => connection,
            None => unreachable!("connection taken from a live guard"),
        }
    }
}

impl<C: Connection + 'static> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let permit = self.permit.take();
        if let Some(connection) = self.connection.take() {
            if let Ok(handle) = Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = connection.disconnect().await {
                        warn!("Failed to disconnect in guard drop: {}", e);
                    }
                    drop(permit);
                });
            } else {
                warn!("No tokio runtime available for disconnect in guard drop");
            }
        }
    }
}
