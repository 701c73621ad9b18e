//! Error types for zkauth cryptographic operations.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors raised by cryptographic primitives and derivations.
///
/// Each variant is a stable kind: callers match on the variant, never on the
/// message text.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// An input violated a declared precondition.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A tag or signature failed to verify, or an authenticated payload
    /// decoded to an invalid shape.
    #[error("authentication failure: {0}")]
    AuthenticationFailure(String),

    /// The system CSPRNG failed to produce bytes.
    #[error("random generation failed: {0}")]
    RandomGenerationFailed(String),

    /// HKDF expansion failed (requested output too long).
    #[error("HKDF expansion failed")]
    HkdfError,

    /// Fewer distinct shares were supplied than the reconstruction threshold.
    #[error("insufficient shares: need {required}, got {provided}")]
    InsufficientShares {
        /// The reconstruction threshold.
        required: usize,
        /// How many shares were actually supplied.
        provided: usize,
    },
}

impl CryptoError {
    /// Stable kind string used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "InvalidInput",
            Self::AuthenticationFailure(_) => "AuthenticationFailure",
            Self::RandomGenerationFailed(_) => "RandomGenerationFailed",
            Self::HkdfError => "HkdfError",
            Self::InsufficientShares { .. } => "InsufficientShares",
        }
    }
}
