//! The storage-backend capability.
//!
//! A backend durably holds exactly one encrypted share per user and is
//! addressed by its tag. `AuthCore` never learns how a backend stores its
//! record; it sees only `put`/`get`/`has` and an opaque receipt.

mod memory;

pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zkauth_crypto::EncryptedShare;

use crate::error::Result;

/// The closed set of supported backend tags.
///
/// The declaration order is the stable ordering used everywhere: share `i`
/// goes to the `i`-th enabled backend, and login polls in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendTag {
    /// Zcash shielded-memo storage.
    Zcash,
    /// Starknet contract storage.
    Starknet,
    /// Solana account storage.
    Solana,
}

impl BackendTag {
    /// Every tag, in stable order.
    pub const ALL: [BackendTag; 3] = [BackendTag::Zcash, BackendTag::Starknet, BackendTag::Solana];

    /// The lowercase string form used in lookup derivations and share
    /// envelopes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zcash => "zcash",
            Self::Starknet => "starknet",
            Self::Solana => "solana",
        }
    }
}

impl std::fmt::Display for BackendTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability exposed by every share store.
///
/// All three operations suspend; everything cryptographic stays synchronous
/// on the caller's side. Implementations fail with
/// [`AuthError::BackendUnavailable`](crate::AuthError::BackendUnavailable)
/// on transient faults.
#[async_trait]
pub trait ShareBackend: Send + Sync {
    /// The tag this backend serves.
    fn tag(&self) -> BackendTag;

    /// Durably associate `share` with this user, returning an opaque
    /// receipt. Idempotent under the same share.
    async fn put(&self, user_id: &str, share: EncryptedShare) -> Result<String>;

    /// Fetch the share previously stored for this user, if any.
    async fn get(&self, user_id: &str) -> Result<Option<EncryptedShare>>;

    /// Presence check; must agree with `get` returning `Some`.
    async fn has(&self, user_id: &str) -> Result<bool>;
}

/// Map a share index to its owning backend, cycling when there are more
/// shares than enabled backends.
pub fn chain_for_index(index: u8, enabled: &[BackendTag]) -> Option<BackendTag> {
    if index == 0 || enabled.is_empty() {
        return None;
    }
    Some(enabled[(index as usize - 1) % enabled.len()])
}
