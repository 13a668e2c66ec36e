//! Select-style control of a single relay output.
//!
//! [`RelaySelect`] presents one output as a choice between `Off`, `Auto`
//! and `On`. Choosing an option sends the command and, once it succeeds,
//! marks the device state stale and asks for a refresh after the
//! controller has had time to apply it. The current option is read back
//! from the mode the controller reports.

use std::time::Duration;

use tracing::{debug, error, warn};

use halo_types::{GpoMode, RelayAction, is_valid_output};

use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::traits::{RelayControl, StateRefresher};

/// Default delay between a successful command and the refresh request.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// A selectable relay output.
#[derive(Debug)]
pub struct RelaySelect<R, S> {
    output: u8,
    control: R,
    refresher: S,
    settle_delay: Duration,
}

impl<R: RelayControl, S: StateRefresher> RelaySelect<R, S> {
    /// Bind output `output` (1 to 4) to a controller and a state refresher.
    pub fn new(output: u8, control: R, refresher: S) -> Result<Self> {
        if !is_valid_output(output) {
            return Err(Error::InvalidOutputIndex { output });
        }
        Ok(Self {
            output,
            control,
            refresher,
            settle_delay: DEFAULT_SETTLE_DELAY,
        })
    }

    /// Bind an output, taking the settle delay from a configuration.
    pub fn from_config(
        output: u8,
        control: R,
        refresher: S,
        config: &ControllerConfig,
    ) -> Result<Self> {
        Ok(Self::new(output, control, refresher)?.with_settle_delay(config.settle_delay()))
    }

    /// Set how long to wait before requesting a refresh.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// The output this select controls.
    pub fn output(&self) -> u8 {
        self.output
    }

    /// Display name, e.g. `GPO2`.
    pub fn name(&self) -> String {
        format!("GPO{}", self.output)
    }

    /// The selectable options, in display order.
    pub fn options(&self) -> Vec<&'static str> {
        RelayAction::SELECTABLE.iter().map(|a| a.name()).collect()
    }

    /// The delay between a successful command and the refresh request.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// The option to show for a reported output mode.
    ///
    /// Unassigned and disabled outputs show as `Off`. `None` means the mode
    /// is not known yet.
    pub fn current_option(&self, mode: Option<GpoMode>) -> Option<&'static str> {
        mode.map(|mode| mode.selected_action().name())
    }

    /// Apply an option.
    ///
    /// An unrecognised option is logged and ignored. On failure the error
    /// is returned and no refresh is requested; the caller must not assume
    /// the output changed.
    pub async fn select_option(&self, option: &str) -> Result<()> {
        let action = match option.parse::<RelayAction>() {
            Ok(action) if RelayAction::SELECTABLE.contains(&action) => action,
            _ => {
                warn!("Invalid option for {}: {}", self.name(), option);
                return Ok(());
            }
        };

        if let Err(e) = self.control.request_action(self.output, action).await {
            error!("Error setting {} to {}: {}", self.name(), action, e);
            return Err(e);
        }

        self.refresher.reset_data_age();
        debug!("Waiting {:?} before refreshing", self.settle_delay);
        tokio::time::sleep(self.settle_delay).await;
        self.refresher.request_refresh().await;
        Ok(())
    }
}
