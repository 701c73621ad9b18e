//! Post-login sessions bound to the reconstructed master key.

use zkauth_crypto::{current_timestamp_millis, EncryptionResult, MasterKey};

use crate::error::{AuthError, Result};

/// Default session lifetime: 24 hours.
pub const DEFAULT_SESSION_TTL_MS: u64 = 86_400_000;

/// A login session owning the reconstructed master key.
///
/// The key is destroyed with the session; encrypt/decrypt refuse to operate
/// once the expiry deadline has passed.
pub struct Session {
    user_id: String,
    master_key: MasterKey,
    expires_at: u64,
}

impl Session {
    pub(crate) fn new(user_id: String, master_key: MasterKey, ttl_ms: u64) -> Self {
        Self {
            user_id,
            master_key,
            expires_at: current_timestamp_millis() + ttl_ms,
        }
    }

    /// The derived user identifier this session authenticates.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The session's master key.
    pub fn master_key(&self) -> &MasterKey {
        &self.master_key
    }

    /// Expiry deadline, milliseconds since the epoch.
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Whether the deadline has passed at `now_ms`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_millis())
    }

    fn ensure_active(&self, now_ms: u64) -> Result<()> {
        if self.is_expired_at(now_ms) {
            Err(AuthError::SessionExpired)
        } else {
            Ok(())
        }
    }

    /// Encrypt application data under the session's master key.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptionResult> {
        self.encrypt_at(plaintext, current_timestamp_millis())
    }

    /// Decrypt application data under the session's master key.
    pub fn decrypt(&self, envelope: &EncryptionResult) -> Result<Vec<u8>> {
        self.decrypt_at(envelope, current_timestamp_millis())
    }

    /// [`Session::encrypt`] with an explicit clock, for deterministic tests.
    pub fn encrypt_at(&self, plaintext: &[u8], now_ms: u64) -> Result<EncryptionResult> {
        self.ensure_active(now_ms)?;
        Ok(self.master_key.encrypt_data(plaintext)?)
    }

    /// [`Session::decrypt`] with an explicit clock, for deterministic tests.
    pub fn decrypt_at(&self, envelope: &EncryptionResult, now_ms: u64) -> Result<Vec<u8>> {
        self.ensure_active(now_ms)?;
        Ok(self.master_key.decrypt_data(envelope)?)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
