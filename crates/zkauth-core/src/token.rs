//! Stateless Ed25519-signed session tokens.
//!
//! The token is base64url(JSON) of `{ payload, signature, publicKey }`; the
//! signature covers the UTF-8 JSON bytes of the payload alone. Verification
//! needs no server state: the public key travels with the token, and a
//! caller may additionally pin it to an external commitment.

use serde::{Deserialize, Serialize};
use zkauth_crypto::{
    base64_url_decode, base64_url_encode, current_timestamp, verify_signature, CryptoError,
    Ed25519KeyPair, PUBLIC_KEY_SIZE, SIGNATURE_SIZE,
};

use crate::error::{AuthError, Result};

/// Default token lifetime: 30 days.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// The signed claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// The derived zkAuth user identifier.
    pub zk_id: String,
    /// The user's email.
    pub email: String,
    /// The identity-provider user id.
    pub google_user_id: String,
    /// Issued-at, seconds since the epoch.
    pub iat: u64,
    /// Expiry, seconds since the epoch. Always greater than `iat`.
    pub exp: u64,
}

/// The full token as carried on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    /// The signed claims.
    pub payload: SessionPayload,
    /// Ed25519 signature over the payload JSON, hex.
    pub signature: String,
    /// The signer's public key, hex.
    pub public_key: String,
}

/// Create and encode a token for the given claims, valid from now.
pub fn create_token(
    zk_id: &str,
    email: &str,
    google_user_id: &str,
    keypair: &Ed25519KeyPair,
    ttl_seconds: Option<u64>,
) -> Result<String> {
    create_token_at(
        zk_id,
        email,
        google_user_id,
        keypair,
        current_timestamp(),
        ttl_seconds,
    )
}

/// Create and encode a token issued at an explicit timestamp.
pub fn create_token_at(
    zk_id: &str,
    email: &str,
    google_user_id: &str,
    keypair: &Ed25519KeyPair,
    iat: u64,
    ttl_seconds: Option<u64>,
) -> Result<String> {
    let payload = SessionPayload {
        zk_id: zk_id.to_string(),
        email: email.to_string(),
        google_user_id: google_user_id.to_string(),
        iat,
        exp: iat + ttl_seconds.unwrap_or(DEFAULT_TOKEN_TTL_SECONDS),
    };

    let message = payload_bytes(&payload)?;
    let signature = keypair.sign(&message);

    let token = SessionToken {
        payload,
        signature: hex::encode(signature),
        public_key: hex::encode(keypair.public_key_bytes()),
    };
    let json = serde_json::to_vec(&token).map_err(|e| {
        AuthError::Crypto(CryptoError::InvalidInput(format!(
            "token serialization failed: {e}"
        )))
    })?;
    Ok(base64_url_encode(&json))
}

/// Decode a token without verifying it.
pub fn decode_token(encoded: &str) -> Result<SessionToken> {
    let json = base64_url_decode(encoded)
        .map_err(|_| invalid_token("token is not valid base64url"))?;
    serde_json::from_slice(&json).map_err(|_| invalid_token("token is not valid token JSON"))
}

/// Verify a token against the current clock, returning its claims.
pub fn verify_token(encoded: &str) -> Result<SessionPayload> {
    verify_token_at(encoded, current_timestamp())
}

/// Verify a token against an explicit clock, returning its claims.
///
/// Fails with `AuthenticationFailure` on any parse or signature problem and
/// with `SessionExpired` once `exp` has passed.
pub fn verify_token_at(encoded: &str, now: u64) -> Result<SessionPayload> {
    let token = decode_token(encoded)?;

    if token.payload.exp <= token.payload.iat {
        return Err(invalid_token("token expiry does not follow issuance"));
    }
    if token.payload.exp < now {
        return Err(AuthError::SessionExpired);
    }

    let message = payload_bytes(&token.payload)?;
    let signature: [u8; SIGNATURE_SIZE] = hex::decode(&token.signature)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| invalid_token("token signature is not 64 hex-encoded bytes"))?;
    let public_key: [u8; PUBLIC_KEY_SIZE] = hex::decode(&token.public_key)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| invalid_token("token public key is not 32 hex-encoded bytes"))?;

    verify_signature(&public_key, &message, &signature)?;
    Ok(token.payload)
}

fn payload_bytes(payload: &SessionPayload) -> Result<Vec<u8>> {
    serde_json::to_vec(payload).map_err(|e| {
        AuthError::Crypto(CryptoError::InvalidInput(format!(
            "payload serialization failed: {e}"
        )))
    })
}

fn invalid_token(message: &str) -> AuthError {
    AuthError::Crypto(CryptoError::AuthenticationFailure(message.to_string()))
}
