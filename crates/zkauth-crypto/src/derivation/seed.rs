//! Session-token signature seed derivation.

use zeroize::Zeroizing;

use crate::constants::{PBKDF2_ITERATIONS, SIGNATURE_SEED_SALT};
use crate::hashing::pbkdf2_sha256;
use crate::keys::Ed25519KeyPair;

/// Derive the 32-byte Ed25519 signature seed from the identity-provider
/// user id and the user's secret phrase.
///
/// `pbkdf2(salt = "zkAuth-v1.9-ed25519-seed", password = userId + secretPhrase, 100 000, SHA-256)`,
/// then the classic Ed25519 clamp.
pub fn derive_signature_seed(user_id: &str, secret_phrase: &str) -> Zeroizing<[u8; 32]> {
    let password = Zeroizing::new(format!("{user_id}{secret_phrase}"));
    let mut seed = pbkdf2_sha256(
        password.as_bytes(),
        SIGNATURE_SEED_SALT.as_bytes(),
        PBKDF2_ITERATIONS,
    );
    seed[0] &= 0xf8;
    seed[31] = (seed[31] & 0x7f) | 0x40;
    Zeroizing::new(seed)
}

/// Derive the full token-signing key pair from identity and secret phrase.
pub fn derive_signing_keypair(user_id: &str, secret_phrase: &str) -> Ed25519KeyPair {
    let seed = derive_signature_seed(user_id, secret_phrase);
    Ed25519KeyPair::from_seed(&seed)
}
