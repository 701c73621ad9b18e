//! RFC 6238 time-based one-time passwords and backup codes.
//!
//! HMAC-SHA-1, six digits, 30-second steps, a verification window of one
//! step on either side. Secrets are 20 random bytes carried as unpadded
//! RFC 4648 base32.

use base32::Alphabet;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;

use crate::constants::{
    BACKUP_CODE_COUNT, BACKUP_CODE_LENGTH, TOTP_DIGITS, TOTP_ISSUER, TOTP_SECRET_SIZE,
    TOTP_STEP_SECONDS, TOTP_WINDOW,
};
use crate::errors::{CryptoError, Result};
use crate::hashing::{constant_time_compare, sha256_hex};
use crate::utils::{current_timestamp, generate_random_bytes};

type HmacSha1 = Hmac<Sha1>;

const BASE32: Alphabet = Alphabet::Rfc4648 { padding: false };

/// Generate a fresh base32-encoded TOTP secret.
pub fn generate_secret() -> Result<String> {
    let bytes: [u8; TOTP_SECRET_SIZE] = generate_random_bytes()?;
    Ok(base32::encode(BASE32, &bytes))
}

/// The provisioning URI rendered into a QR code by the UI layer.
pub fn generate_uri(secret: &str, account: &str) -> String {
    format!(
        "otpauth://totp/{TOTP_ISSUER}:{account}?secret={secret}&issuer={TOTP_ISSUER}\
         &algorithm=SHA1&digits={TOTP_DIGITS}&period={TOTP_STEP_SECONDS}"
    )
}

/// Generate the code for an explicit Unix timestamp.
pub fn generate_at(secret: &str, timestamp: u64) -> Result<String> {
    let key = decode_secret(secret)?;
    Ok(hotp(&key, timestamp / TOTP_STEP_SECONDS))
}

/// Generate the code for the current time.
pub fn generate(secret: &str) -> Result<String> {
    generate_at(secret, current_timestamp())
}

/// Verify a code against an explicit Unix timestamp, accepting one step of
/// clock skew on either side.
///
/// Whitespace in the submitted code is ignored; anything that is not
/// exactly six decimal digits is rejected without touching the secret.
pub fn verify_at(code: &str, secret: &str, timestamp: u64) -> bool {
    let normalized: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    if normalized.len() != TOTP_DIGITS as usize || !normalized.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let key = match decode_secret(secret) {
        Ok(key) => key,
        Err(_) => return false,
    };

    let current_step = (timestamp / TOTP_STEP_SECONDS) as i64;
    let mut matched = false;
    for offset in -TOTP_WINDOW..=TOTP_WINDOW {
        let step = current_step + offset;
        if step < 0 {
            continue;
        }
        let candidate = hotp(&key, step as u64);
        // No short-circuit: every window position is always evaluated.
        matched |= constant_time_compare(candidate.as_bytes(), normalized.as_bytes());
    }
    matched
}

/// Verify a code against the current time.
pub fn verify(code: &str, secret: &str) -> bool {
    verify_at(code, secret, current_timestamp())
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let cleaned: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .collect::<String>()
        .to_uppercase();
    base32::decode(BASE32, &cleaned)
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| CryptoError::InvalidInput("TOTP secret is not valid base32".to_string()))
}

fn hotp(key: &[u8], counter: u64) -> String {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC-SHA-1 accepts keys of any length");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // RFC 4226 dynamic truncation.
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    format!("{:06}", binary % 1_000_000)
}

// ---------------------------------------------------------------------------
// Backup codes
// ---------------------------------------------------------------------------

const BACKUP_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate the set of one-shot backup codes, formatted for display
/// (`XXXX-XXXX`).
pub fn generate_backup_codes() -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..BACKUP_CODE_COUNT)
        .map(|_| {
            let raw: String = (0..BACKUP_CODE_LENGTH)
                .map(|_| BACKUP_CODE_CHARSET[rng.gen_range(0..BACKUP_CODE_CHARSET.len())] as char)
                .collect();
            format!("{}-{}", &raw[..4], &raw[4..])
        })
        .collect()
}

/// Canonical form of a backup code: alphanumerics only, uppercased.
pub fn normalize_backup_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// The stored form of a backup code: SHA-256 of its canonical form, hex.
pub fn hash_backup_code(code: &str) -> String {
    sha256_hex(normalize_backup_code(code).as_bytes())
}

/// Check a submitted code against the stored hash list in constant time.
pub fn verify_backup_code(code: &str, hashes: &[String]) -> bool {
    let candidate = hash_backup_code(code);
    hashes.iter().fold(false, |matched, stored| {
        matched | constant_time_compare(candidate.as_bytes(), stored.as_bytes())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RFC 6238 appendix B secret ("12345678901234567890") in base32.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_rfc6238_sha1_vectors() {
        assert_eq!(generate_at(RFC_SECRET, 59).unwrap(), "287082");
        assert_eq!(generate_at(RFC_SECRET, 1_111_111_109).unwrap(), "081804");
        assert_eq!(generate_at(RFC_SECRET, 1_111_111_111).unwrap(), "050471");
        assert_eq!(generate_at(RFC_SECRET, 1_234_567_890).unwrap(), "005924");
        assert_eq!(generate_at(RFC_SECRET, 2_000_000_000).unwrap(), "279037");
    }

    #[test]
    fn test_verify_accepts_rfc_vector() {
        assert!(verify_at("081804", RFC_SECRET, 1_111_111_109));
    }

    #[test]
    fn test_verify_window() {
        let t = 1_111_111_109u64;
        let current = generate_at(RFC_SECRET, t).unwrap();
        let previous = generate_at(RFC_SECRET, t - 30).unwrap();
        let stale = generate_at(RFC_SECRET, t - 60).unwrap();

        assert!(verify_at(&current, RFC_SECRET, t));
        assert!(verify_at(&previous, RFC_SECRET, t), "one step back is in window");
        assert!(!verify_at(&stale, RFC_SECRET, t), "two steps back is out of window");
    }

    #[test]
    fn test_verify_tolerates_whitespace() {
        assert!(verify_at(" 081 804 ", RFC_SECRET, 1_111_111_109));
    }

    #[test]
    fn test_verify_rejects_malformed_codes() {
        assert!(!verify_at("81804", RFC_SECRET, 1_111_111_109));
        assert!(!verify_at("0818041", RFC_SECRET, 1_111_111_109));
        assert!(!verify_at("08180a", RFC_SECRET, 1_111_111_109));
        assert!(!verify_at("", RFC_SECRET, 1_111_111_109));
    }

    #[test]
    fn test_verify_rejects_bad_secret() {
        assert!(!verify_at("081804", "&&&not-base32&&&", 1_111_111_109));
    }

    #[test]
    fn test_generate_secret_roundtrips_through_base32() {
        let secret = generate_secret().unwrap();
        let decoded = base32::decode(BASE32, &secret).unwrap();
        assert_eq!(decoded.len(), TOTP_SECRET_SIZE);
        assert_ne!(secret, generate_secret().unwrap());
    }

    #[test]
    fn test_uri_shape() {
        let uri = generate_uri("JBSWY3DPEHPK3PXP", "alice@example.com");
        assert!(uri.starts_with("otpauth://totp/zkAuth:alice@example.com?"));
        assert!(uri.contains("secret=JBSWY3DPEHPK3PXP"));
        assert!(uri.contains("issuer=zkAuth"));
        assert!(uri.contains("algorithm=SHA1"));
        assert!(uri.contains("digits=6"));
        assert!(uri.contains("period=30"));
    }

    #[test]
    fn test_backup_code_shape() {
        let codes = generate_backup_codes();
        assert_eq!(codes.len(), BACKUP_CODE_COUNT);
        for code in &codes {
            assert_eq!(code.len(), BACKUP_CODE_LENGTH + 1);
            assert_eq!(code.chars().nth(4), Some('-'));
            assert!(normalize_backup_code(code)
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_backup_code_normalization() {
        assert_eq!(normalize_backup_code("ab12-CD34"), "AB12CD34");
        assert_eq!(normalize_backup_code(" ab 12 cd 34 "), "AB12CD34");
        assert_eq!(hash_backup_code("AB12-CD34"), hash_backup_code("ab12cd34"));
    }

    #[test]
    fn test_backup_code_verification() {
        let codes = generate_backup_codes();
        let hashes: Vec<String> = codes.iter().map(|c| hash_backup_code(c)).collect();

        for code in &codes {
            assert!(verify_backup_code(code, &hashes));
            assert!(verify_backup_code(&code.to_lowercase(), &hashes));
        }
        assert!(!verify_backup_code("ZZZZ-ZZZZ", &hashes));
        assert!(!verify_backup_code("", &hashes));
    }
}
