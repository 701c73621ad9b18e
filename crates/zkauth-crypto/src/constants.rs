//! Protocol constants and domain separation strings.
//!
//! All values here are normative: changing a domain string or iteration
//! count silently changes every derived identifier and key in the system.

/// Size of the master key in bytes (256 bits).
pub const MASTER_KEY_SIZE: usize = 32;

/// Size of AES-256-GCM initialization vectors in bytes.
pub const IV_SIZE: usize = 12;

/// Size of AES-256-GCM authentication tags in bytes.
pub const TAG_SIZE: usize = 16;

/// Size of Ed25519 public keys in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of Ed25519 signatures in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// PBKDF2-SHA-256 iteration count for the signature seed.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Smallest permitted share-reconstruction threshold.
pub const MIN_THRESHOLD: u8 = 2;

/// Largest permitted number of shares (the field evaluation points are 1..=255).
pub const MAX_SHARES: u8 = 255;

/// Prefix of derived user identifiers.
pub const USER_ID_PREFIX: &str = "zkauth:";

/// Number of hex characters of the identity digest kept in a user identifier.
pub const USER_ID_DIGEST_CHARS: usize = 16;

/// Prefix of the derived second-factor lookup identifier.
pub const TWOFA_LOOKUP_PREFIX: &str = "zkauth_2fa:";

/// Domain separation for the credential-derived share wrapping key.
pub const DOMAIN_WRAPPING_KEY: &str = "zkauth-wrap-v1";

/// Domain separation for all lookup-identifier derivations.
pub const DOMAIN_LOOKUP: &str = "zkauth-lookup-v3-decentralized";

/// PBKDF2 salt for the Ed25519 signature seed.
pub const SIGNATURE_SEED_SALT: &str = "zkAuth-v1.9-ed25519-seed";

/// Size of generated TOTP secrets in bytes (before base32 encoding).
pub const TOTP_SECRET_SIZE: usize = 20;

/// Number of digits in a TOTP code.
pub const TOTP_DIGITS: u32 = 6;

/// TOTP time step in seconds.
pub const TOTP_STEP_SECONDS: u64 = 30;

/// TOTP verification window in steps on either side of the current one.
pub const TOTP_WINDOW: i64 = 1;

/// Issuer label embedded in provisioning URIs.
pub const TOTP_ISSUER: &str = "zkAuth";

/// Number of backup codes issued at 2FA setup.
pub const BACKUP_CODE_COUNT: usize = 8;

/// Length of a backup code in characters (before display formatting).
pub const BACKUP_CODE_LENGTH: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_sizes_match_aes_gcm() {
        assert_eq!(MASTER_KEY_SIZE, 32);
        assert_eq!(IV_SIZE, 12);
        assert_eq!(TAG_SIZE, 16);
    }

    #[test]
    fn test_domain_strings_are_versioned() {
        assert!(DOMAIN_WRAPPING_KEY.contains("-v1"));
        assert!(DOMAIN_LOOKUP.contains("-v3"));
        assert!(SIGNATURE_SEED_SALT.contains("v1.9"));
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(MIN_THRESHOLD >= 2);
        assert_eq!(MAX_SHARES, u8::MAX);
    }
}
