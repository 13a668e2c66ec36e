//! Session authentication.
//!
//! Every connection starts with a handshake before the controller accepts
//! commands:
//!
//! 1. Read the session key the controller issued for this connection.
//! 2. Derive the authentication payload from the session key and access code.
//! 3. Write the payload to the authentication characteristic.
//!
//! The returned [`SessionKey`] is only valid on the connection it was read
//! from. Nothing here is retried.

use tracing::debug;

use crate::config::CharacteristicMap;
use crate::crypto::{AccessCode, SessionCipher, SessionKey};
use crate::error::{AuthStage, Error, Result, TransportError};
use crate::transport::Connection;

/// Performs the session handshake on an open connection.
#[derive(Debug)]
pub struct SessionAuthenticator<'a, C: ?Sized> {
    cipher: &'a C,
    characteristics: CharacteristicMap,
}

impl<'a, C: SessionCipher + ?Sized> SessionAuthenticator<'a, C> {
    /// Create an authenticator using the given cipher and characteristics.
    pub fn new(cipher: &'a C, characteristics: CharacteristicMap) -> Self {
        Self {
            cipher,
            characteristics,
        }
    }

    /// Authenticate the connection and return this session's key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] with
    /// [`AuthStage::SessionKeyRead`] if the key cannot be read or is empty,
    /// and with [`AuthStage::AuthenticationWrite`] if the payload write fails.
    pub async fn authenticate<N>(
        &self,
        connection: &N,
        access_code: &AccessCode,
    ) -> Result<SessionKey>
    where
        N: Connection + ?Sized,
    {
        let bytes = connection
            .read_characteristic(self.characteristics.session_key)
            .await
            .map_err(|e| Error::authentication_failed(AuthStage::SessionKeyRead, e))?;

        if bytes.is_empty() {
            return Err(Error::authentication_failed(
                AuthStage::SessionKeyRead,
                TransportError::InvalidData("device returned an empty session key".into()),
            ));
        }

        let session_key = SessionKey::new(bytes);
        debug!("Read session key ({} bytes)", session_key.len());

        let payload = self.cipher.derive_auth_key(&session_key, access_code);
        connection
            .write_characteristic(self.characteristics.authentication, &payload)
            .await
            .map_err(|e| Error::authentication_failed(AuthStage::AuthenticationWrite, e))?;

        debug!("Authentication payload accepted");
        Ok(session_key)
    }
}
