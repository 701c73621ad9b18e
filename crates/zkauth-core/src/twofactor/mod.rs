//! Second-factor state: TOTP enrollment, backup codes, encrypted envelope,
//! commit-log pointers, and the client-verifiable OTP challenge.

mod challenge;
mod envelope;
mod pointer;

pub use challenge::{issue_challenge, verify_challenge_at, SignedOtpChallenge};
pub use envelope::{
    decrypt_state, decrypt_with_master_key, encrypt_state, encrypt_with_master_key,
};
pub use pointer::{parse_pointer, resolve_state, resolve_state_with_key, TwoFaPointer};

use serde::{Deserialize, Serialize};
use zkauth_crypto::{current_timestamp, totp};

use crate::error::{AuthError, Result};

/// The second-factor state as stored (encrypted) on the commit log.
///
/// The canonical JSON form of this struct is the cleartext of its envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFaState {
    /// Base32 TOTP secret, present once setup has begun.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp_secret: Option<String>,
    /// Whether TOTP is active for this user.
    pub totp_enabled: bool,
    /// SHA-256 hashes of the unused backup codes.
    #[serde(default)]
    pub totp_backup_codes: Vec<String>,
    /// When TOTP was enabled, seconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp_enabled_at: Option<u64>,
    /// Whether email OTP is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_otp_enabled: Option<bool>,
    /// When email OTP was enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_otp_enabled_at: Option<u64>,
    /// The address email OTPs are delivered to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_email: Option<String>,
}

/// Everything the UI needs to finish TOTP enrollment.
#[derive(Debug, Clone)]
pub struct TotpSetup {
    /// The base32 secret, for manual entry.
    pub secret: String,
    /// The provisioning URI to render as a QR code.
    pub otpauth_uri: String,
    /// The one-shot backup codes, display-formatted. Shown exactly once.
    pub backup_codes: Vec<String>,
    /// The pending state (secret and code hashes set, not yet enabled).
    pub state: TwoFaState,
}

/// Start TOTP enrollment: mint a secret and backup codes.
///
/// The returned state is not yet enabled; the caller must confirm with
/// [`enable_totp`] after the user proves possession of the secret.
pub fn begin_totp_setup(account: &str) -> Result<TotpSetup> {
    let secret = totp::generate_secret()?;
    let backup_codes = totp::generate_backup_codes();
    let hashes = backup_codes
        .iter()
        .map(|code| totp::hash_backup_code(code))
        .collect();

    let state = TwoFaState {
        totp_secret: Some(secret.clone()),
        totp_enabled: false,
        totp_backup_codes: hashes,
        ..TwoFaState::default()
    };

    Ok(TotpSetup {
        otpauth_uri: totp::generate_uri(&secret, account),
        secret,
        backup_codes,
        state,
    })
}

/// Activate TOTP after the user submits a valid code, stamping the
/// activation time.
pub fn enable_totp(state: &mut TwoFaState, code: &str) -> Result<()> {
    enable_totp_at(state, code, current_timestamp())
}

/// [`enable_totp`] with an explicit clock, for deterministic tests.
pub fn enable_totp_at(state: &mut TwoFaState, code: &str, now: u64) -> Result<()> {
    let secret = state.totp_secret.as_deref().ok_or_else(|| {
        AuthError::Config("TOTP setup has not been started for this state".to_string())
    })?;
    if !totp::verify_at(code, secret, now) {
        return Err(AuthError::Crypto(
            zkauth_crypto::CryptoError::AuthenticationFailure(
                "TOTP confirmation code did not verify".to_string(),
            ),
        ));
    }
    state.totp_enabled = true;
    state.totp_enabled_at = Some(now);
    Ok(())
}

/// Check a TOTP code against an enabled state.
pub fn verify_totp_at(state: &TwoFaState, code: &str, now: u64) -> bool {
    if !state.totp_enabled {
        return false;
    }
    match state.totp_secret.as_deref() {
        Some(secret) => totp::verify_at(code, secret, now),
        None => false,
    }
}

/// Redeem a backup code, removing its hash so it can never be used again.
///
/// Returns false (and changes nothing) when the code matches no stored hash.
pub fn redeem_backup_code(state: &mut TwoFaState, code: &str) -> bool {
    let candidate = totp::hash_backup_code(code);
    // Scan the whole list without short-circuiting; remember the match.
    let mut found: Option<usize> = None;
    for (i, stored) in state.totp_backup_codes.iter().enumerate() {
        if zkauth_crypto::constant_time_compare(candidate.as_bytes(), stored.as_bytes()) {
            found = Some(i);
        }
    }
    match found {
        Some(i) => {
            state.totp_backup_codes.remove(i);
            true
        }
        None => false,
    }
}
