//! # zkauth-core
//!
//! Orchestration layer of the zkAuth passwordless authentication system:
//! the storage-backend capability and its in-memory reference, threshold
//! registration and login, post-login sessions, stateless Ed25519 session
//! tokens, and the second-factor state machinery.
//!
//! Registration splits a fresh master key into N encrypted shares placed on
//! independent backends; login collects any T of them, reconstructs the
//! key, and opens a session. The cryptographic primitives live in
//! [`zkauth_crypto`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod session;
pub mod token;
pub mod twofactor;

pub use auth::{AuthCore, LoginResult, RegisterResult};
pub use backend::{chain_for_index, BackendTag, MemoryBackend, ShareBackend};
pub use config::{AuthConfig, ChainConfig};
pub use error::AuthError;
pub use session::{Session, DEFAULT_SESSION_TTL_MS};
pub use token::{
    create_token, create_token_at, decode_token, verify_token, verify_token_at, SessionPayload,
    SessionToken, DEFAULT_TOKEN_TTL_SECONDS,
};
pub use twofactor::{TotpSetup, TwoFaPointer, TwoFaState};
