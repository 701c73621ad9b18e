//! # zkauth-crypto
//!
//! Cryptographic primitives for the zkAuth passwordless authentication
//! core: prime-field arithmetic and threshold secret sharing, the
//! AES-256-GCM envelope, SHA-256/HMAC/PBKDF2/HKDF derivations, master-key
//! lifecycle, deterministic identity lookups, RFC 6238 TOTP with backup
//! codes, and the Ed25519 token-signing pair.
//!
//! Everything here is synchronous and free of I/O; orchestration across
//! storage backends lives in `zkauth-core`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod derivation;
pub mod encryption;
pub mod errors;
pub mod field;
pub mod hashing;
pub mod keys;
pub mod sharing;
pub mod totp;
pub mod utils;

pub use constants::*;
pub use derivation::{
    derive_signature_seed, derive_signing_keypair, hkdf_derive, hkdf_derive_32, Identity,
    ShareField,
};
pub use encryption::{decrypt, encrypt, EncryptionResult};
pub use errors::CryptoError;
pub use field::FieldElement;
pub use hashing::{constant_time_compare, hmac_sha256, pbkdf2_sha256, sha256, sha256_hex};
pub use keys::{
    decrypt_with_pk, derive_aead_key, derive_wrapping_key, encrypt_with_pk, user_id_from_pk,
    Ed25519KeyPair, MasterKey,
};
pub use keys::verify_signature;
pub use sharing::{
    combine, decrypt_share, decrypt_share_with_key, encrypt_share, encrypt_share_with_key, split,
    EncryptedShare, ShareData, SplitResult,
};
pub use utils::{
    base64_url_decode, base64_url_encode, current_timestamp, current_timestamp_millis,
    generate_random_bytes,
};
