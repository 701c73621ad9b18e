//! Deterministic identity derivations: lookup identifiers and opaque keys.
//!
//! All derivations are pure functions of the stable identity
//! `(userId, email)`. The provider user id supplies the entropy (it is the
//! HMAC key), so lookup identifiers cannot be enumerated from an email
//! alone; the purpose string gives domain separation between consumers.

use crate::constants::{
    DOMAIN_LOOKUP, TWOFA_LOOKUP_PREFIX, USER_ID_DIGEST_CHARS, USER_ID_PREFIX,
};
use crate::errors::{CryptoError, Result};
use crate::hashing::hmac_sha256;

/// A per-share field whose storage key is derived independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareField {
    /// The ciphertext field.
    Data,
    /// The initialization vector field.
    Iv,
    /// The authentication tag field.
    Tag,
    /// The ownership-proof field.
    Proof,
}

impl ShareField {
    /// The purpose suffix used in the derivation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Iv => "iv",
            Self::Tag => "tag",
            Self::Proof => "proof",
        }
    }
}

/// The stable identity a derivation is anchored to.
///
/// Holds the opaque identity-provider user id and the normalized
/// (lowercased, trimmed) email.
#[derive(Debug, Clone)]
pub struct Identity {
    user_id: String,
    email: String,
}

impl Identity {
    /// Build an identity, validating both attributes are non-empty and
    /// normalizing the email.
    pub fn new(user_id: &str, email: &str) -> Result<Self> {
        if user_id.is_empty() {
            return Err(CryptoError::InvalidInput(
                "identity user id cannot be empty".to_string(),
            ));
        }
        let normalized = normalize_email(email);
        if normalized.is_empty() {
            return Err(CryptoError::InvalidInput(
                "identity email cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            user_id: user_id.to_string(),
            email: normalized,
        })
    }

    /// The identity-provider user id.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The normalized email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Core derivation:
    /// `hex(HMAC-SHA-256(key = userId, msg = "zkauth-lookup-v3-decentralized:" + email + ":" + purpose))`.
    pub fn derive(&self, purpose: &str) -> String {
        let message = format!("{DOMAIN_LOOKUP}:{}:{purpose}", self.email);
        hex::encode(hmac_sha256(self.user_id.as_bytes(), message.as_bytes()))
    }

    /// The user-facing identifier: `"zkauth:" + derive("base")[0..16]`.
    pub fn user_identifier(&self) -> String {
        let digest = self.derive("base");
        format!("{USER_ID_PREFIX}{}", &digest[..USER_ID_DIGEST_CHARS])
    }

    /// The lookup identifier for a storage backend, e.g. `derive("zcash:lookup")`.
    pub fn backend_lookup(&self, backend_tag: &str) -> String {
        self.derive(&format!("{backend_tag}:lookup"))
    }

    /// An opaque per-share storage key, shaped as a v4 UUID.
    ///
    /// The first 16 bytes of `derive("share:<index>:<field>")` are stamped
    /// with the version-4 and RFC 4122 variant nibbles.
    pub fn share_field_key(&self, index: u8, field: ShareField) -> String {
        let digest = hmac_sha256(
            self.user_id.as_bytes(),
            format!("{DOMAIN_LOOKUP}:{}:share:{index}:{}", self.email, field.as_str()).as_bytes(),
        );
        let mut head = [0u8; 16];
        head.copy_from_slice(&digest[..16]);
        uuid::Builder::from_random_bytes(head).into_uuid().to_string()
    }

    /// The second-factor lookup identifier:
    /// `"zkauth_2fa:" + derive("2fa:lookup")`.
    pub fn two_factor_lookup(&self) -> String {
        format!("{TWOFA_LOOKUP_PREFIX}{}", self.derive("2fa:lookup"))
    }
}

/// Lowercase and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
