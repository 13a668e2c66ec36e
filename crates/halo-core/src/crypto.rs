//! Session secrets and the cipher seam.
//!
//! The controller's key derivation and payload encryption are vendor
//! primitives. This crate does not implement them; it consumes them through
//! [`SessionCipher`] and only manages which key is used when.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Per-connection key issued by the controller.
///
/// A session key is valid for exactly one connection. It deliberately does
/// not implement `Clone` so it cannot be stashed and reused across sessions.
#[derive(PartialEq, Eq)]
pub struct SessionKey(Vec<u8>);

impl SessionKey {
    /// Wrap bytes read from the session key characteristic.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the device returned an empty key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({} bytes)", self.0.len())
    }
}

/// The device access code shared between the controller and this client.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCode(String);

impl AccessCode {
    /// Create an access code from its printed form.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// UTF-8 bytes fed to the key derivation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Whether no access code has been configured.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The access code as text.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("AccessCode(<unset>)")
        } else {
            f.write_str("AccessCode(<redacted>)")
        }
    }
}

impl From<&str> for AccessCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Vendor key derivation and payload encryption.
///
/// Implementations must be deterministic for a given key and input; this
/// crate assumes their output is whatever the controller expects.
pub trait SessionCipher: Send + Sync {
    /// Derive the authentication payload from the session key and access code.
    fn derive_auth_key(&self, session_key: &SessionKey, access_code: &AccessCode) -> Vec<u8>;

    /// Encrypt a command frame under the session key.
    fn encrypt(&self, plaintext: &[u8], session_key: &SessionKey) -> Vec<u8>;
}

impl<C: SessionCipher + ?Sized> SessionCipher for Arc<C> {
    fn derive_auth_key(&self, session_key: &SessionKey, access_code: &AccessCode) -> Vec<u8> {
        (**self).derive_auth_key(session_key, access_code)
    }

    fn encrypt(&self, plaintext: &[u8], session_key: &SessionKey) -> Vec<u8> {
        (**self).encrypt(plaintext, session_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_debug_hides_bytes() {
        let key = SessionKey::new(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(format!("{:?}", key), "SessionKey(4 bytes)");
        assert_eq!(key.len(), 4);
        assert!(!key.is_empty());
    }

    #[test]
    fn test_access_code_debug_is_redacted() {
        let code = AccessCode::new("1234");
        assert_eq!(format!("{:?}", code), "AccessCode(<redacted>)");
        assert_eq!(format!("{:?}", AccessCode::default()), "AccessCode(<unset>)");
        assert_eq!(code.as_bytes(), b"1234");
    }

    #[test]
    fn test_access_code_empty() {
        assert!(AccessCode::new("").is_empty());
        assert!(AccessCode::new("   ").is_empty());
        assert!(!AccessCode::from("0000").is_empty());
    }

    #[test]
    fn test_access_code_serializes_transparently() {
        let code = AccessCode::new("4821");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"4821\"");
        let back: AccessCode = serde_json::from_str("\"4821\"").unwrap();
        assert_eq!(back, code);
    }
}
