//! Master-key lifecycle: generation, hashing, AEAD helpers, derived wrappers.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{
    DOMAIN_WRAPPING_KEY, MASTER_KEY_SIZE, USER_ID_DIGEST_CHARS, USER_ID_PREFIX,
};
use crate::encryption::{self, EncryptionResult};
use crate::errors::{CryptoError, Result};
use crate::hashing::{constant_time_compare, sha256, sha256_hex};
use crate::utils::{current_timestamp, generate_random_bytes};

/// The 256-bit per-user master key.
///
/// Born in registration, reconstructed from threshold shares at login, and
/// destroyed with the session that owns it. The raw bytes are zeroized on
/// drop; the hex form is derived on demand so it never outlives its use.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    raw: [u8; MASTER_KEY_SIZE],
    created_at: u64,
}

impl MasterKey {
    /// Generate a fresh master key from the system CSPRNG.
    ///
    /// The top two bits are cleared so the key value always lies below the
    /// 254-bit sharing modulus and the threshold split is invertible.
    pub fn generate() -> Result<Self> {
        let mut raw: [u8; MASTER_KEY_SIZE] = generate_random_bytes()?;
        raw[0] &= 0x3f;
        Ok(Self {
            raw,
            created_at: current_timestamp(),
        })
    }

    /// Rebuild a master key from its lowercase-hex form.
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let bytes = hex::decode(key_hex)
            .map_err(|_| CryptoError::InvalidInput("master key is not valid hex".to_string()))?;
        if bytes.len() != MASTER_KEY_SIZE {
            return Err(CryptoError::InvalidInput(format!(
                "master key must be {MASTER_KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut raw = [0u8; MASTER_KEY_SIZE];
        raw.copy_from_slice(&bytes);
        Ok(Self::from_bytes(raw))
    }

    /// Rebuild a master key from raw bytes (e.g. after share reconstruction).
    ///
    /// The input array is zeroized after being copied in.
    pub fn from_bytes(mut bytes: [u8; MASTER_KEY_SIZE]) -> Self {
        let key = Self {
            raw: bytes,
            created_at: current_timestamp(),
        };
        bytes.zeroize();
        key
    }

    /// The raw key bytes. Never log or persist these.
    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_SIZE] {
        &self.raw
    }

    /// Lowercase-hex form of the key.
    pub fn key(&self) -> String {
        hex::encode(self.raw)
    }

    /// Creation timestamp, seconds since the epoch.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// SHA-256 of the raw key, hex. Safe to store alongside shares.
    pub fn hash(&self) -> String {
        sha256_hex(&self.raw)
    }

    /// Verify this key against a stored hash in constant time.
    ///
    /// Callers that stored `masterKeyHash` at registration use this to
    /// detect reconstruction of a wrong key from forged shares.
    pub fn verify_hash(&self, expected_hex: &str) -> Result<()> {
        if constant_time_compare(self.hash().as_bytes(), expected_hex.as_bytes()) {
            Ok(())
        } else {
            Err(CryptoError::AuthenticationFailure(
                "master key does not match the stored hash".to_string(),
            ))
        }
    }

    /// Reject obviously degenerate key material.
    pub fn validate_entropy(&self) -> Result<()> {
        if self.raw.iter().all(|&b| b == 0) {
            return Err(CryptoError::InvalidInput(
                "master key cannot be all zeros".to_string(),
            ));
        }
        let first = self.raw[0];
        if self.raw.iter().all(|&b| b == first) {
            return Err(CryptoError::InvalidInput(
                "master key has insufficient entropy".to_string(),
            ));
        }
        Ok(())
    }

    /// Encrypt application data under the raw master key.
    pub fn encrypt_data(&self, plaintext: &[u8]) -> Result<EncryptionResult> {
        encryption::encrypt(&self.raw, plaintext)
    }

    /// Decrypt application data encrypted with [`MasterKey::encrypt_data`].
    pub fn decrypt_data(&self, envelope: &EncryptionResult) -> Result<Vec<u8>> {
        encryption::decrypt(&self.raw, envelope)
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("raw", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Derive the share-envelope AEAD key from a hex public key:
/// `sha256(unhex(pk))`.
pub fn derive_aead_key(pk_hex: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(pk_hex)
        .map_err(|_| CryptoError::InvalidInput("public key is not valid hex".to_string()))?;
    if bytes.is_empty() {
        return Err(CryptoError::InvalidInput(
            "public key cannot be empty".to_string(),
        ));
    }
    Ok(sha256(&bytes))
}

/// Encrypt under the AEAD key derived from `pk_hex`.
pub fn encrypt_with_pk(pk_hex: &str, plaintext: &[u8]) -> Result<EncryptionResult> {
    let key = derive_aead_key(pk_hex)?;
    encryption::encrypt(&key, plaintext)
}

/// Decrypt an envelope produced by [`encrypt_with_pk`].
pub fn decrypt_with_pk(pk_hex: &str, envelope: &EncryptionResult) -> Result<Vec<u8>> {
    let key = derive_aead_key(pk_hex)?;
    encryption::decrypt(&key, envelope)
}

/// Derive the credential-only share wrapping key:
/// `sha256("zkauth-wrap-v1:" + userId + ":" + lower(trim(email)))`.
///
/// Lets shares be rewrapped so login needs only stable identity, not the
/// user's secret phrase.
pub fn derive_wrapping_key(user_id: &str, email: &str) -> [u8; 32] {
    let normalized = email.trim().to_lowercase();
    sha256(format!("{DOMAIN_WRAPPING_KEY}:{user_id}:{normalized}").as_bytes())
}

/// Derive the stable user identifier from a hex public key:
/// `"zkauth:" + sha256(unhex(pk))[0..16]`.
pub fn user_id_from_pk(pk_hex: &str) -> Result<String> {
    let bytes = hex::decode(pk_hex)
        .map_err(|_| CryptoError::InvalidInput("public key is not valid hex".to_string()))?;
    if bytes.is_empty() {
        return Err(CryptoError::InvalidInput(
            "public key cannot be empty".to_string(),
        ));
    }
    let digest = sha256_hex(&bytes);
    Ok(format!("{USER_ID_PREFIX}{}", &digest[..USER_ID_DIGEST_CHARS]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_clears_top_two_bits() {
        for _ in 0..16 {
            let key = MasterKey::generate().unwrap();
            assert_eq!(key.as_bytes()[0] & 0xc0, 0);
        }
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = MasterKey::generate().unwrap();
        let b = MasterKey::generate().unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_hex_roundtrip() {
        let key = MasterKey::generate().unwrap();
        let rebuilt = MasterKey::from_hex(&key.key()).unwrap();
        assert_eq!(key.as_bytes(), rebuilt.as_bytes());
        assert_eq!(key.key().len(), 64);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(MasterKey::from_hex("zz").is_err());
        assert!(MasterKey::from_hex("0011").is_err());
        let long = "00".repeat(33);
        assert!(MasterKey::from_hex(&long).is_err());
    }

    #[test]
    fn test_hash_depends_only_on_raw_bytes() {
        let key = MasterKey::generate().unwrap();
        let rebuilt = MasterKey::from_hex(&key.key()).unwrap();
        assert_eq!(key.hash(), rebuilt.hash());
        assert_eq!(key.hash().len(), 64);
    }

    #[test]
    fn test_verify_hash() {
        let key = MasterKey::generate().unwrap();
        assert!(key.verify_hash(&key.hash()).is_ok());
        let other = MasterKey::generate().unwrap();
        assert!(matches!(
            key.verify_hash(&other.hash()),
            Err(CryptoError::AuthenticationFailure(_))
        ));
    }

    #[test]
    fn test_validate_entropy() {
        assert!(MasterKey::generate().unwrap().validate_entropy().is_ok());
        assert!(MasterKey::from_bytes([0u8; 32]).validate_entropy().is_err());
        assert!(MasterKey::from_bytes([7u8; 32]).validate_entropy().is_err());
    }

    #[test]
    fn test_encrypt_data_roundtrip() {
        let key = MasterKey::generate().unwrap();
        let envelope = key.encrypt_data(b"Hello").unwrap();
        assert_eq!(key.decrypt_data(&envelope).unwrap(), b"Hello");
    }

    #[test]
    fn test_pk_envelope_roundtrip() {
        let pk = "11".repeat(32);
        let envelope = encrypt_with_pk(&pk, b"share payload").unwrap();
        assert_eq!(decrypt_with_pk(&pk, &envelope).unwrap(), b"share payload");
        assert!(decrypt_with_pk(&"22".repeat(32), &envelope).is_err());
    }

    #[test]
    fn test_user_id_from_pk_shape() {
        let pk = "11".repeat(32);
        let uid = user_id_from_pk(&pk).unwrap();
        assert!(uid.starts_with("zkauth:"));
        assert_eq!(uid.len(), "zkauth:".len() + 16);
        // Deterministic
        assert_eq!(uid, user_id_from_pk(&pk).unwrap());
    }

    #[test]
    fn test_user_id_rejects_bad_pk() {
        assert!(user_id_from_pk("not hex").is_err());
        assert!(user_id_from_pk("").is_err());
    }

    #[test]
    fn test_wrapping_key_normalizes_email() {
        let a = derive_wrapping_key("user-1", "Alice@Example.COM ");
        let b = derive_wrapping_key("user-1", "alice@example.com");
        assert_eq!(a, b);
        let c = derive_wrapping_key("user-2", "alice@example.com");
        assert_ne!(a, c);
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let key = MasterKey::generate().unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains(&key.key()));
    }
}
