//! Bluetooth UUIDs for AstralPool Halo controllers.
//!
//! This module contains the GATT identifiers used by the relay command
//! protocol. The characteristic family is shared with the other Halo
//! control commands (chlorinator mode, heater, solar, lighting).

use uuid::{Uuid, uuid};

// --- AstralPool Service UUIDs ---

/// AstralPool custom service exposed by Halo controllers.
pub const ASTRALPOOL_SERVICE: Uuid = uuid!("45000001-98b7-4e29-a03f-160174643001");

// --- Session Characteristic UUIDs ---

/// Per-connection session key issued by the controller (read).
pub const SESSION_KEY: Uuid = uuid!("45000001-98b7-4e29-a03f-160174643002");

/// Master authentication payload derived from the session key (write).
pub const MASTER_AUTHENTICATION: Uuid = uuid!("45000001-98b7-4e29-a03f-160174643003");

// --- Command Characteristic UUIDs ---

/// Encrypted command input of the controller (write).
pub const RX_COMMAND: Uuid = uuid!("45000001-98b7-4e29-a03f-160174643004");

/// Advertised-name prefixes of Halo controllers.
pub const DEVICE_NAME_PREFIXES: &[&str] = &["HCHLOR", "Halo"];
