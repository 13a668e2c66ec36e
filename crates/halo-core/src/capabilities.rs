//! Optional equipment reported by the controller.
//!
//! The controller advertises which optional equipment is fitted through
//! flags such as `HeaterEnabled` or `GPO2Enabled`. Front ends create one
//! control per capability the first time its flag is seen;
//! [`CapabilityRegistry`] records which ones already exist so repeated
//! telemetry updates do not create duplicates.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use halo_types::is_valid_output;

/// A piece of optional equipment that can be controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Pool heater.
    Heater,
    /// Solar heating.
    Solar,
    /// Pool lighting.
    Lighting,
    /// Relay output 1 to 4.
    RelayOutput(u8),
}

impl Capability {
    /// Parse a device enable flag such as `SolarEnabled` or `GPO3Enabled`.
    ///
    /// Returns `None` for unknown flags and relay outputs outside `1..=4`.
    pub fn from_flag(flag: &str) -> Option<Self> {
        let name = flag.trim().strip_suffix("Enabled")?;
        match name {
            "Heater" => Some(Self::Heater),
            "Solar" => Some(Self::Solar),
            "Lighting" => Some(Self::Lighting),
            _ => {
                let output: u8 = name.strip_prefix("GPO")?.parse().ok()?;
                is_valid_output(output).then_some(Self::RelayOutput(output))
            }
        }
    }

    /// The enable flag for this capability.
    pub fn flag(&self) -> String {
        format!("{}Enabled", self)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heater => write!(f, "Heater"),
            Self::Solar => write!(f, "Solar"),
            Self::Lighting => write!(f, "Lighting"),
            Self::RelayOutput(n) => write!(f, "GPO{}", n),
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_flag(s).ok_or_else(|| format!("unknown capability flag: {}", s))
    }
}

/// The set of capabilities that have already been registered.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    registered: BTreeSet<Capability>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a capability. Returns `true` only the first time.
    pub fn register(&mut self, capability: Capability) -> bool {
        self.registered.insert(capability)
    }

    /// Register every enabled flag, returning the newly added capabilities.
    ///
    /// Unknown flags are skipped.
    pub fn register_flags<'a, I>(&mut self, flags: I) -> Vec<Capability>
    where
        I: IntoIterator<Item = &'a str>,
    {
        flags
            .into_iter()
            .filter_map(Capability::from_flag)
            .filter(|cap| self.register(*cap))
            .collect()
    }

    /// Whether a capability has been registered.
    pub fn contains(&self, capability: Capability) -> bool {
        self.registered.contains(&capability)
    }

    /// Registered relay outputs, ascending.
    pub fn relay_outputs(&self) -> impl Iterator<Item = u8> + '_ {
        self.registered.iter().filter_map(|cap| match cap {
            Capability::RelayOutput(n) => Some(*n),
            _ => None,
        })
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flag() {
        assert_eq!(Capability::from_flag("HeaterEnabled"), Some(Capability::Heater));
        assert_eq!(Capability::from_flag("SolarEnabled"), Some(Capability::Solar));
        assert_eq!(
            Capability::from_flag("LightingEnabled"),
            Some(Capability::Lighting)
        );
        assert_eq!(
            Capability::from_flag("GPO2Enabled"),
            Some(Capability::RelayOutput(2))
        );
    }

    #[test]
    fn test_from_flag_rejects_unknown() {
        assert_eq!(Capability::from_flag("GPO0Enabled"), None);
        assert_eq!(Capability::from_flag("GPO5Enabled"), None);
        assert_eq!(Capability::from_flag("GPOEnabled"), None);
        assert_eq!(Capability::from_flag("Heater"), None);
        assert_eq!(Capability::from_flag("PumpEnabled"), None);
        assert!("ValveEnabled".parse::<Capability>().is_err());
    }

    #[test]
    fn test_flag_round_trip() {
        for cap in [
            Capability::Heater,
            Capability::Solar,
            Capability::Lighting,
            Capability::RelayOutput(4),
        ] {
            assert_eq!(Capability::from_flag(&cap.flag()), Some(cap));
        }
    }

    #[test]
    fn test_register_only_once() {
        let mut registry = CapabilityRegistry::new();
        assert!(registry.register(Capability::RelayOutput(1)));
        assert!(!registry.register(Capability::RelayOutput(1)));
        assert!(registry.contains(Capability::RelayOutput(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_flags_returns_new_only() {
        let mut registry = CapabilityRegistry::new();
        let added = registry.register_flags(["GPO3Enabled", "HeaterEnabled", "Bogus"]);
        assert_eq!(added, vec![Capability::RelayOutput(3), Capability::Heater]);

        let added = registry.register_flags(["GPO3Enabled", "GPO1Enabled"]);
        assert_eq!(added, vec![Capability::RelayOutput(1)]);

        assert_eq!(registry.relay_outputs().collect::<Vec<_>>(), vec![1, 3]);
    }
}
