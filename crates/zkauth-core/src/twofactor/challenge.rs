//! Client-verifiable signed email-OTP challenge.
//!
//! The server issues a signature binding `(email, userId, code)` to the
//! user's master-key hash. A client that knows all four can verify the
//! code locally on the happy path; on mismatch or expiry it falls back to
//! the server's verify endpoint. The binding of `masterKeyHash` to the
//! session is the server's responsibility.

use serde::{Deserialize, Serialize};
use zkauth_crypto::{constant_time_compare, sha256_hex};

/// Default challenge lifetime: 10 minutes.
pub const DEFAULT_CHALLENGE_TTL_SECONDS: u64 = 600;

/// A server-issued OTP challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOtpChallenge {
    /// `sha256(sha256(email ":" userId ":" code) ":" masterKeyHash)`, hex.
    pub signature: String,
    /// Expiry, seconds since the epoch.
    pub expires_at: u64,
}

/// Compute the challenge signature for a code.
pub fn compute_signature(email: &str, user_id: &str, code: &str, master_key_hash: &str) -> String {
    let normalized = normalize_code(code);
    let inner = sha256_hex(format!("{email}:{user_id}:{normalized}").as_bytes());
    sha256_hex(format!("{inner}:{master_key_hash}").as_bytes())
}

/// Issue a challenge for a freshly generated code.
pub fn issue_challenge(
    email: &str,
    user_id: &str,
    code: &str,
    master_key_hash: &str,
    now: u64,
    ttl_seconds: Option<u64>,
) -> SignedOtpChallenge {
    SignedOtpChallenge {
        signature: compute_signature(email, user_id, code, master_key_hash),
        expires_at: now + ttl_seconds.unwrap_or(DEFAULT_CHALLENGE_TTL_SECONDS),
    }
}

/// Client-side check of a submitted code against a challenge.
///
/// Constant-time on the signature; returns false on expiry or mismatch, in
/// which case the caller falls back to the server verify endpoint.
pub fn verify_challenge_at(
    challenge: &SignedOtpChallenge,
    email: &str,
    user_id: &str,
    code: &str,
    master_key_hash: &str,
    now: u64,
) -> bool {
    if now > challenge.expires_at {
        return false;
    }
    let expected = compute_signature(email, user_id, code, master_key_hash);
    constant_time_compare(expected.as_bytes(), challenge.signature.as_bytes())
}

fn normalize_code(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}
