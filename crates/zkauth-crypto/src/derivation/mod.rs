//! Deterministic derivations: HKDF core, identity lookups, signature seed.

mod identity;
mod seed;

pub use identity::{Identity, ShareField};
pub use seed::{derive_signature_seed, derive_signing_keypair};

use hkdf::Hkdf;
use sha2::Sha256;

use crate::errors::{CryptoError, Result};

/// Derive key material with HKDF-SHA-256.
pub fn hkdf_derive(ikm: &[u8], salt: Option<&[u8]>, info: &[u8], output_len: usize) -> Result<Vec<u8>> {
    let hkdf = Hkdf::<Sha256>::new(salt, ikm);
    let mut output = vec![0u8; output_len];
    hkdf.expand(info, &mut output)
        .map_err(|_| CryptoError::HkdfError)?;
    Ok(output)
}

/// Derive a 32-byte key with HKDF-SHA-256 (the common case).
pub fn hkdf_derive_32(ikm: &[u8], info: &[u8]) -> Result<[u8; 32]> {
    let output = hkdf_derive(ikm, None, info, 32)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&output);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hkdf_is_deterministic() {
        let a = hkdf_derive_32(b"input key material", b"zkauth:test:v1").unwrap();
        let b = hkdf_derive_32(b"input key material", b"zkauth:test:v1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hkdf_info_separates_domains() {
        let a = hkdf_derive_32(b"ikm", b"zkauth:a:v1").unwrap();
        let b = hkdf_derive_32(b"ikm", b"zkauth:b:v1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hkdf_rejects_oversized_output() {
        // HKDF-SHA-256 caps output at 255 * 32 bytes.
        assert!(hkdf_derive(b"ikm", None, b"info", 256 * 32).is_err());
    }
}
