//! Runtime configuration for the authentication core.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::backend::BackendTag;

/// Default reconstruction threshold.
pub const DEFAULT_THRESHOLD: u8 = 2;

/// Default number of emitted shares.
pub const DEFAULT_TOTAL_SHARES: u8 = 3;

/// Default deadline for a single backend operation, in milliseconds.
pub const DEFAULT_OP_TIMEOUT_MS: u64 = 10_000;

/// Per-chain settings injected by out-of-scope callers.
///
/// The core itself only cares which tags are present; RPC endpoints and
/// credentials are passed through to the concrete backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// RPC endpoint for the chain, if the backend needs one.
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Provider API key, if the backend needs one.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Top-level configuration record.
///
/// Deserializes from the caller-facing JSON shape
/// `{ "chains": { "zcash": { "rpcUrl": ... } }, "threshold": 2, "totalShares": 3 }`.
/// A chain entry enables its backend; the map is ordered by [`BackendTag`],
/// which fixes the share-placement and polling order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// Enabled backends, keyed by tag.
    pub chains: BTreeMap<BackendTag, ChainConfig>,
    /// How many shares reconstruct the master key.
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// How many shares are emitted at registration.
    #[serde(default = "default_total_shares")]
    pub total_shares: u8,
    /// Deadline for each backend call, in milliseconds.
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

fn default_threshold() -> u8 {
    DEFAULT_THRESHOLD
}

fn default_total_shares() -> u8 {
    DEFAULT_TOTAL_SHARES
}

fn default_op_timeout_ms() -> u64 {
    DEFAULT_OP_TIMEOUT_MS
}

impl Default for AuthConfig {
    /// All three backends enabled with the default 2-of-3 policy.
    fn default() -> Self {
        Self {
            chains: BackendTag::ALL
                .iter()
                .map(|tag| (*tag, ChainConfig::default()))
                .collect(),
            threshold: DEFAULT_THRESHOLD,
            total_shares: DEFAULT_TOTAL_SHARES,
            op_timeout_ms: DEFAULT_OP_TIMEOUT_MS,
        }
    }
}

impl AuthConfig {
    /// The enabled backend tags in stable order.
    pub fn enabled_tags(&self) -> Vec<BackendTag> {
        self.chains.keys().copied().collect()
    }
}
