//! AES-256-GCM authenticated encryption with detached tags.
//!
//! Every ciphertext in the system travels as an [`EncryptionResult`]: the
//! ciphertext, the 12-byte IV, and the 16-byte tag held separately in
//! lowercase hex. Additional data is always empty.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use serde::{Deserialize, Serialize};

use crate::constants::{IV_SIZE, TAG_SIZE};
use crate::errors::{CryptoError, Result};
use crate::utils::generate_random_bytes;

/// The canonical AEAD envelope: ciphertext, IV and tag as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionResult {
    /// Ciphertext bytes, hex-encoded (tag detached).
    pub ciphertext: String,
    /// 12-byte initialization vector, hex-encoded.
    pub iv: String,
    /// 16-byte authentication tag, hex-encoded.
    pub tag: String,
}

/// Encrypt `plaintext` under a 32-byte key with a fresh random IV.
pub fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<EncryptionResult> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidInput(format!("bad AES-256 key: {e}")))?;

    let iv: [u8; IV_SIZE] = generate_random_bytes()?;
    let nonce = Nonce::from_slice(&iv);

    let mut sealed = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::InvalidInput("AES-GCM encryption failed".to_string()))?;

    // aes-gcm appends the tag; the envelope carries it detached.
    let tag = sealed.split_off(sealed.len() - TAG_SIZE);

    Ok(EncryptionResult {
        ciphertext: hex::encode(sealed),
        iv: hex::encode(iv),
        tag: hex::encode(tag),
    })
}

/// Decrypt an [`EncryptionResult`] under a 32-byte key.
///
/// Any malformed field, truncation, or tag mismatch is reported as
/// [`CryptoError::AuthenticationFailure`]; the error does not reveal which
/// part of the envelope was wrong.
pub fn decrypt(key: &[u8; 32], envelope: &EncryptionResult) -> Result<Vec<u8>> {
    let iv = decode_exact(&envelope.iv, IV_SIZE)?;
    let tag = decode_exact(&envelope.tag, TAG_SIZE)?;
    let ciphertext = hex::decode(&envelope.ciphertext)
        .map_err(|_| auth_failure("envelope ciphertext is not valid hex"))?;

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidInput(format!("bad AES-256 key: {e}")))?;

    let mut sealed = ciphertext;
    sealed.extend_from_slice(&tag);

    cipher
        .decrypt(Nonce::from_slice(&iv), sealed.as_ref())
        .map_err(|_| auth_failure("AES-GCM tag verification failed"))
}

fn decode_exact(hex_str: &str, expected_len: usize) -> Result<Vec<u8>> {
    let bytes =
        hex::decode(hex_str).map_err(|_| auth_failure("envelope field is not valid hex"))?;
    if bytes.len() != expected_len {
        return Err(auth_failure("envelope field has wrong length"));
    }
    Ok(bytes)
}

fn auth_failure(message: &str) -> CryptoError {
    CryptoError::AuthenticationFailure(message.to_string())
}
