//! Error taxonomy of the authentication core.

use thiserror::Error;
use zkauth_crypto::CryptoError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors surfaced by registration, login, sessions, tokens and the
/// second-factor machinery.
///
/// Per-backend `BackendUnavailable` and `AuthenticationFailure` are demoted
/// to per-share failures during login; every other variant propagates.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The configuration cannot support the requested threshold policy.
    #[error("configuration error: {0}")]
    Config(String),

    /// `register` was called for a user that already holds shares.
    #[error("user {0} is already registered")]
    AlreadyRegistered(String),

    /// `login` was called for a user with no registered shares.
    #[error("user {0} is not registered")]
    NotRegistered(String),

    /// Login could not collect enough valid, distinct shares.
    #[error("insufficient shares: need {required}, collected {collected}")]
    InsufficientShares {
        /// The reconstruction threshold.
        required: usize,
        /// How many shares decrypted successfully.
        collected: usize,
    },

    /// A session or token operation ran past its expiry.
    #[error("session expired")]
    SessionExpired,

    /// A storage backend failed transiently or timed out.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A cryptographic primitive failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl AuthError {
    /// Stable kind string used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::AlreadyRegistered(_) => "AlreadyRegistered",
            Self::NotRegistered(_) => "NotRegistered",
            Self::InsufficientShares { .. } => "InsufficientShares",
            Self::SessionExpired => "SessionExpired",
            Self::BackendUnavailable(_) => "BackendUnavailable",
            Self::Crypto(inner) => inner.kind(),
        }
    }

    /// Whether login may skip the failing backend and keep polling.
    ///
    /// Only transient unavailability and failed share authentication are
    /// recoverable; everything else aborts the flow.
    pub fn is_recoverable_during_login(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::Crypto(CryptoError::AuthenticationFailure(_))
        )
    }
}
