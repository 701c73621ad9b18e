//! SHA-256, HMAC-SHA-256, PBKDF2 and constant-time comparison.

use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 digest of `data` as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// HMAC-SHA-256 of `message` under `key`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA-256 accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// PBKDF2-HMAC-SHA-256 with a 32-byte output.
///
/// Used only for the Ed25519 signature seed; interactive key wrapping goes
/// through the cheaper SHA-256 derivations instead.
pub fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut output = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut output);
    output
}

/// Constant-time equality of two byte strings.
///
/// Every comparison that gates an authentication decision (tag equality,
/// backup-code hashes, challenge signatures) must go through here.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256("abc") from FIPS 180-2
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hmac_sha256_known_vector() {
        // RFC 4231 test case 2
        let digest = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(digest),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_pbkdf2_is_deterministic_and_salt_sensitive() {
        let a = pbkdf2_sha256(b"password", b"salt-a", 1_000);
        let b = pbkdf2_sha256(b"password", b"salt-a", 1_000);
        let c = pbkdf2_sha256(b"password", b"salt-b", 1_000);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"same", b"same"));
        assert!(!constant_time_compare(b"same", b"diff"));
        assert!(!constant_time_compare(b"short", b"longer input"));
    }
}
