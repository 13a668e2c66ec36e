//! Trait abstractions for relay control.
//!
//! [`RelayControl`] is the capability a Halo controller exposes to callers,
//! and [`StateRefresher`] is what a caller provides so the controller's
//! cached state can be refreshed after a command.

use std::sync::Arc;

use async_trait::async_trait;

use halo_types::RelayAction;

use crate::error::Result;

/// Commanding relay outputs on a device.
///
/// This trait enables writing code that works with both a real controller
/// and test doubles.
///
/// # Example
///
/// ```ignore
/// use halo_core::{RelayControl, RelayAction, Result};
///
/// async fn lights_on<D: RelayControl>(device: &D) -> Result<()> {
///     device.request_action(1, RelayAction::On).await
/// }
/// ```
#[async_trait]
pub trait RelayControl: Send + Sync {
    /// Set relay output `output` (1 to 4) to `action`.
    ///
    /// Returns once the command has been written, or with the first failure.
    async fn request_action(&self, output: u8, action: RelayAction) -> Result<()>;
}

#[async_trait]
impl<T: RelayControl + ?Sized> RelayControl for Arc<T> {
    async fn request_action(&self, output: u8, action: RelayAction) -> Result<()> {
        (**self).request_action(output, action).await
    }
}

/// The consumer of device state that must be told when it goes stale.
#[async_trait]
pub trait StateRefresher: Send + Sync {
    /// Mark cached state as stale.
    fn reset_data_age(&self);

    /// Ask for fresh state to be fetched.
    async fn request_refresh(&self);
}

#[async_trait]
impl<T: StateRefresher + ?Sized> StateRefresher for Arc<T> {
    fn reset_data_age(&self) {
        (**self).reset_data_age()
    }

    async fn request_refresh(&self) {
        (**self).request_refresh().await
    }
}
