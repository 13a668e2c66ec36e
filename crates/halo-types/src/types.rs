//! Core types for Halo relay commands.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};

/// Lowest user-facing relay output number.
pub const MIN_OUTPUT: u8 = 1;

/// Highest user-facing relay output number.
pub const MAX_OUTPUT: u8 = 4;

/// Returns true when `output` names one of the controller's relay outputs.
#[must_use]
pub const fn is_valid_output(output: u8) -> bool {
    output >= MIN_OUTPUT && output <= MAX_OUTPUT
}

/// Action requested for a relay output (GPO).
///
/// The discriminant is the byte sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum RelayAction {
    /// Leave the output untouched.
    #[default]
    NoAction = 0,
    /// Force the output off.
    Off = 1,
    /// Let the controller's timers drive the output.
    Auto = 2,
    /// Force the output on.
    On = 3,
}

impl RelayAction {
    /// Actions offered to users when selecting an output mode.
    pub const SELECTABLE: [RelayAction; 3] = [RelayAction::Off, RelayAction::Auto, RelayAction::On];

    /// The single-byte wire code of this action.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable name, also used as the select option label.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RelayAction::NoAction => "NoAction",
            RelayAction::Off => "Off",
            RelayAction::Auto => "Auto",
            RelayAction::On => "On",
        }
    }
}

impl fmt::Display for RelayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for RelayAction {
    type Error = FrameError;

    /// Convert a wire code to a `RelayAction`.
    ///
    /// # Examples
    ///
    /// ```
    /// use halo_types::RelayAction;
    ///
    /// assert_eq!(RelayAction::try_from(2), Ok(RelayAction::Auto));
    /// assert!(RelayAction::try_from(4).is_err());
    /// ```
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RelayAction::NoAction),
            1 => Ok(RelayAction::Off),
            2 => Ok(RelayAction::Auto),
            3 => Ok(RelayAction::On),
            _ => Err(FrameError::UnknownAction(value)),
        }
    }
}

impl FromStr for RelayAction {
    type Err = FrameError;

    /// Parse a select option label (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use halo_types::RelayAction;
    ///
    /// assert_eq!("auto".parse::<RelayAction>(), Ok(RelayAction::Auto));
    /// assert_eq!("On".parse::<RelayAction>(), Ok(RelayAction::On));
    /// assert!("Low".parse::<RelayAction>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(RelayAction::Off),
            "auto" => Ok(RelayAction::Auto),
            "on" => Ok(RelayAction::On),
            "noaction" | "no_action" | "none" => Ok(RelayAction::NoAction),
            _ => Err(FrameError::UnknownOption(s.to_string())),
        }
    }
}

/// A request to put one relay output into a given mode.
///
/// `output` is the user-facing 1-based slot (GPO1 to GPO4). Construct with
/// [`RelayCommand::new`] to validate up front; the encoder validates again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelayCommand {
    /// Requested action.
    pub action: RelayAction,
    /// 1-based relay output number.
    pub output: u8,
}

impl RelayCommand {
    /// Create a validated command.
    pub fn new(action: RelayAction, output: u8) -> FrameResult<Self> {
        let command = Self { action, output };
        command.validate()?;
        Ok(command)
    }

    /// Check that the output number is in `1..=4`.
    pub fn validate(&self) -> FrameResult<()> {
        if is_valid_output(self.output) {
            Ok(())
        } else {
            Err(FrameError::InvalidOutputIndex(self.output))
        }
    }

    /// Zero-based output index as sent on the wire.
    pub fn wire_index(&self) -> FrameResult<u8> {
        self.validate()?;
        Ok(self.output - MIN_OUTPUT)
    }
}

impl fmt::Display for RelayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPO{} -> {}", self.output, self.action)
    }
}

/// The mode an output reports in the controller's state.
///
/// This is the read side of [`RelayAction`]: the controller also reports
/// outputs that have no function assigned or are disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GpoMode {
    /// Forced off.
    Off,
    /// Driven by the controller's timers.
    Auto,
    /// Forced on.
    On,
    /// No function assigned to the output.
    NotAssigned,
    /// The output is disabled.
    NotEnabled,
}

impl GpoMode {
    /// The selectable action that best describes this mode.
    ///
    /// Unassigned and disabled outputs never switch on, so they read as
    /// [`RelayAction::Off`].
    #[must_use]
    pub const fn selected_action(self) -> RelayAction {
        match self {
            GpoMode::Off | GpoMode::NotAssigned | GpoMode::NotEnabled => RelayAction::Off,
            GpoMode::Auto => RelayAction::Auto,
            GpoMode::On => RelayAction::On,
        }
    }
}

impl fmt::Display for GpoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GpoMode::Off => "Off",
            GpoMode::Auto => "Auto",
            GpoMode::On => "On",
            GpoMode::NotAssigned => "NotAssigned",
            GpoMode::NotEnabled => "NotEnabled",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_codes() {
        assert_eq!(RelayAction::NoAction.code(), 0);
        assert_eq!(RelayAction::Off.code(), 1);
        assert_eq!(RelayAction::Auto.code(), 2);
        assert_eq!(RelayAction::On.code(), 3);
    }

    #[test]
    fn test_action_try_from_all_codes() {
        for code in 0u8..=3 {
            let action = RelayAction::try_from(code).unwrap();
            assert_eq!(action.code(), code);
        }
        assert_eq!(RelayAction::try_from(4), Err(FrameError::UnknownAction(4)));
        assert_eq!(
            RelayAction::try_from(0xFF),
            Err(FrameError::UnknownAction(0xFF))
        );
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("Off".parse::<RelayAction>(), Ok(RelayAction::Off));
        assert_eq!("AUTO".parse::<RelayAction>(), Ok(RelayAction::Auto));
        assert_eq!(" on ".parse::<RelayAction>(), Ok(RelayAction::On));
        assert_eq!("NoAction".parse::<RelayAction>(), Ok(RelayAction::NoAction));
        assert_eq!(
            "Medium".parse::<RelayAction>(),
            Err(FrameError::UnknownOption("Medium".to_string()))
        );
        assert!("".parse::<RelayAction>().is_err());
    }

    #[test]
    fn test_action_display_round_trips_through_from_str() {
        for action in RelayAction::SELECTABLE {
            assert_eq!(action.to_string().parse::<RelayAction>(), Ok(action));
        }
    }

    #[test]
    fn test_action_default_is_no_action() {
        assert_eq!(RelayAction::default(), RelayAction::NoAction);
    }

    #[test]
    fn test_selectable_excludes_no_action() {
        assert!(!RelayAction::SELECTABLE.contains(&RelayAction::NoAction));
        let labels: Vec<_> = RelayAction::SELECTABLE.iter().map(|a| a.name()).collect();
        assert_eq!(labels, ["Off", "Auto", "On"]);
    }

    #[test]
    fn test_is_valid_output() {
        assert!(!is_valid_output(0));
        assert!(is_valid_output(1));
        assert!(is_valid_output(4));
        assert!(!is_valid_output(5));
        assert!(!is_valid_output(u8::MAX));
    }

    #[test]
    fn test_command_new_validates() {
        assert!(RelayCommand::new(RelayAction::On, 1).is_ok());
        assert!(RelayCommand::new(RelayAction::On, 4).is_ok());
        assert_eq!(
            RelayCommand::new(RelayAction::On, 0),
            Err(FrameError::InvalidOutputIndex(0))
        );
        assert_eq!(
            RelayCommand::new(RelayAction::Off, 5),
            Err(FrameError::InvalidOutputIndex(5))
        );
    }

    #[test]
    fn test_command_wire_index() {
        let cmd = RelayCommand::new(RelayAction::Auto, 2).unwrap();
        assert_eq!(cmd.wire_index(), Ok(1));

        let unchecked = RelayCommand {
            action: RelayAction::Auto,
            output: 9,
        };
        assert_eq!(
            unchecked.wire_index(),
            Err(FrameError::InvalidOutputIndex(9))
        );
    }

    #[test]
    fn test_command_display() {
        let cmd = RelayCommand::new(RelayAction::Auto, 3).unwrap();
        assert_eq!(cmd.to_string(), "GPO3 -> Auto");
    }

    #[test]
    fn test_gpo_mode_selected_action() {
        assert_eq!(GpoMode::Off.selected_action(), RelayAction::Off);
        assert_eq!(GpoMode::Auto.selected_action(), RelayAction::Auto);
        assert_eq!(GpoMode::On.selected_action(), RelayAction::On);
        assert_eq!(GpoMode::NotAssigned.selected_action(), RelayAction::Off);
        assert_eq!(GpoMode::NotEnabled.selected_action(), RelayAction::Off);
        assert_eq!(GpoMode::NotAssigned.to_string(), "NotAssigned");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_command_serde() {
        let cmd = RelayCommand::new(RelayAction::On, 2).unwrap();
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"action":"On","output":2}"#);
        let back: RelayCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
