//! Ed25519 signing key pair for session tokens.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::constants::{PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::errors::{CryptoError, Result};

/// Ed25519 signing key pair derived from the 32-byte signature seed.
///
/// `ed25519-dalek` zeroizes the private half on drop.
#[derive(Clone)]
pub struct Ed25519KeyPair {
    private_key: SigningKey,
    public_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Build a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let private_key = SigningKey::from_bytes(seed);
        let public_key = private_key.verifying_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// The public key bytes.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.to_bytes()
    }

    /// Sign a message, returning the detached 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.private_key.sign(message).to_bytes()
    }
}

/// Verify a detached Ed25519 signature.
///
/// Fails with [`CryptoError::AuthenticationFailure`] on an invalid public
/// key or a signature that does not cover `message`.
pub fn verify_signature(
    public_key: &[u8; PUBLIC_KEY_SIZE],
    message: &[u8],
    signature: &[u8; SIGNATURE_SIZE],
) -> Result<()> {
    let key = VerifyingKey::from_bytes(public_key).map_err(|_| {
        CryptoError::AuthenticationFailure("invalid Ed25519 public key".to_string())
    })?;
    key.verify(message, &Signature::from_bytes(signature))
        .map_err(|_| {
            CryptoError::AuthenticationFailure("Ed25519 signature verification failed".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let keypair = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let signature = keypair.sign(b"token payload");
        assert!(verify_signature(&keypair.public_key_bytes(), b"token payload", &signature).is_ok());
    }

    #[test]
    fn test_keypair_is_deterministic_from_seed() {
        let a = Ed25519KeyPair::from_seed(&[9u8; 32]);
        let b = Ed25519KeyPair::from_seed(&[9u8; 32]);
        assert_eq!(a.public_key_bytes(), b.public_key_bytes());
        assert_eq!(a.sign(b"msg"), b.sign(b"msg"));
    }

    #[test]
    fn test_tampered_message_fails() {
        let keypair = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let signature = keypair.sign(b"token payload");
        let result = verify_signature(&keypair.public_key_bytes(), b"token payloaD", &signature);
        assert!(matches!(
            result,
            Err(CryptoError::AuthenticationFailure(_))
        ));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let keypair = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let mut signature = keypair.sign(b"token payload");
        signature[0] ^= 0x01;
        assert!(
            verify_signature(&keypair.public_key_bytes(), b"token payload", &signature).is_err()
        );
    }

    #[test]
    fn test_wrong_public_key_fails() {
        let keypair = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let other = Ed25519KeyPair::from_seed(&[8u8; 32]);
        let signature = keypair.sign(b"token payload");
        assert!(verify_signature(&other.public_key_bytes(), b"token payload", &signature).is_err());
    }
}
