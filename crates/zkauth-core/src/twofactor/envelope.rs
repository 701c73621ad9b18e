//! Encrypted envelope for the second-factor state.
//!
//! The state is sealed under the master key before it ever reaches the
//! commit log. The key schedule is forgiving about the hex input: exactly
//! 32 decoded bytes are used directly, anything else is hashed down to 32.

use zkauth_crypto::{encryption, sha256, CryptoError, EncryptionResult};

use crate::error::{AuthError, Result};

use super::TwoFaState;

/// Encrypt an arbitrary cleartext under a master-key hex string.
pub fn encrypt_with_master_key(data: &str, master_key_hex: &str) -> Result<EncryptionResult> {
    let key = envelope_key(master_key_hex)?;
    Ok(encryption::encrypt(&key, data.as_bytes())?)
}

/// Decrypt an envelope produced by [`encrypt_with_master_key`].
pub fn decrypt_with_master_key(
    envelope: &EncryptionResult,
    master_key_hex: &str,
) -> Result<String> {
    let key = envelope_key(master_key_hex)?;
    let plaintext = encryption::decrypt(&key, envelope)?;
    String::from_utf8(plaintext).map_err(|_| {
        AuthError::Crypto(CryptoError::AuthenticationFailure(
            "decrypted state is not valid UTF-8".to_string(),
        ))
    })
}

/// Seal a [`TwoFaState`] as its canonical JSON.
pub fn encrypt_state(state: &TwoFaState, master_key_hex: &str) -> Result<EncryptionResult> {
    let json = serde_json::to_string(state).map_err(|e| {
        AuthError::Crypto(CryptoError::InvalidInput(format!(
            "state serialization failed: {e}"
        )))
    })?;
    encrypt_with_master_key(&json, master_key_hex)
}

/// Open a sealed [`TwoFaState`].
pub fn decrypt_state(envelope: &EncryptionResult, master_key_hex: &str) -> Result<TwoFaState> {
    let json = decrypt_with_master_key(envelope, master_key_hex)?;
    serde_json::from_str(&json).map_err(|_| {
        AuthError::Crypto(CryptoError::AuthenticationFailure(
            "decrypted state is not valid 2FA state JSON".to_string(),
        ))
    })
}

fn envelope_key(master_key_hex: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(master_key_hex).map_err(|_| {
        AuthError::Crypto(CryptoError::InvalidInput(
            "master key is not valid hex".to_string(),
        ))
    })?;
    if bytes.is_empty() {
        return Err(AuthError::Crypto(CryptoError::InvalidInput(
            "master key cannot be empty".to_string(),
        )));
    }
    if bytes.len() == 32 {
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(key)
    } else {
        Ok(sha256(&bytes))
    }
}
