//! Key material: the master key and the Ed25519 token-signing pair.

mod master;
mod signing;

pub use master::{
    derive_aead_key, derive_wrapping_key, encrypt_with_pk, decrypt_with_pk, user_id_from_pk,
    MasterKey,
};
pub use signing::{verify_signature, Ed25519KeyPair};
