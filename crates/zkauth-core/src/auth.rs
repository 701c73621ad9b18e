//! Registration and login orchestration across storage backends.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use zkauth_crypto::{
    sharing, user_id_from_pk, EncryptedShare, MasterKey, ShareData, MIN_THRESHOLD,
};

use crate::backend::{BackendTag, ShareBackend};
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::session::{Session, DEFAULT_SESSION_TTL_MS};

/// Outcome of a successful registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResult {
    /// Always true on the success path.
    pub success: bool,
    /// The derived user identifier.
    pub user_id: String,
    /// The stored share envelopes, receipts attached.
    pub shares: Vec<EncryptedShare>,
    /// SHA-256 of the raw master key, for later reconstruction checks.
    pub master_key_hash: String,
}

/// Outcome of a successful login.
#[derive(Debug)]
pub struct LoginResult {
    /// Always true on the success path.
    pub success: bool,
    /// The derived user identifier.
    pub user_id: String,
    /// The reconstructed master key.
    pub master_key: MasterKey,
    /// How many shares contributed to the reconstruction.
    pub shares_used: usize,
}

/// Coordinates the threshold policy over a set of enabled backends.
///
/// Holds no per-user state: every flow owns its transient key material for
/// its whole duration and nothing is shared between invocations.
pub struct AuthCore {
    threshold: u8,
    total_shares: u8,
    op_timeout: Duration,
    backends: Vec<Arc<dyn ShareBackend>>,
}

impl AuthCore {
    /// Build the core from a configuration and the concrete backends.
    ///
    /// Backends whose tag is not enabled in `config.chains` are dropped.
    /// Fails with [`AuthError::Config`] when the threshold policy is
    /// malformed or fewer backends remain than the threshold requires.
    pub fn new(config: &AuthConfig, backends: Vec<Arc<dyn ShareBackend>>) -> Result<Self> {
        if config.threshold < MIN_THRESHOLD {
            return Err(AuthError::Config(format!(
                "threshold must be at least {MIN_THRESHOLD}, got {}",
                config.threshold
            )));
        }
        if config.total_shares < config.threshold {
            return Err(AuthError::Config(format!(
                "totalShares ({}) must be at least the threshold ({})",
                config.total_shares, config.threshold
            )));
        }

        let enabled = config.enabled_tags();
        let mut selected: Vec<Arc<dyn ShareBackend>> = backends
            .into_iter()
            .filter(|backend| enabled.contains(&backend.tag()))
            .collect();
        selected.sort_by_key(|backend| backend.tag());
        selected.dedup_by_key(|backend| backend.tag());

        if selected.len() < config.threshold as usize {
            return Err(AuthError::Config(format!(
                "{} enabled backend(s) cannot satisfy a threshold of {}",
                selected.len(),
                config.threshold
            )));
        }

        Ok(Self {
            threshold: config.threshold,
            total_shares: config.total_shares,
            op_timeout: Duration::from_millis(config.op_timeout_ms),
            backends: selected,
        })
    }

    /// The enabled backend tags in polling order.
    pub fn enabled_backends(&self) -> Vec<BackendTag> {
        self.backends.iter().map(|backend| backend.tag()).collect()
    }

    /// The reconstruction threshold.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    fn backend_for_index(&self, index: u8) -> &Arc<dyn ShareBackend> {
        // Index is 1-based; cycles when total_shares exceeds the backend
        // count, matching chain_for_index.
        &self.backends[(index as usize - 1) % self.backends.len()]
    }

    /// Whether at least `threshold` backends hold a share for this user.
    ///
    /// Unreachable backends count as absent.
    pub async fn is_registered(&self, user_id: &str) -> bool {
        let mut present = 0usize;
        for backend in &self.backends {
            match self.has_with_deadline(backend, user_id).await {
                Ok(true) => present += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        backend = %backend.tag(),
                        kind = e.kind(),
                        error = %e,
                        "presence check failed, counting backend as absent"
                    );
                }
            }
            if present >= self.threshold as usize {
                return true;
            }
        }
        false
    }

    /// Register a new user keyed by the hex public key.
    ///
    /// Generates a master key, splits it, and places one encrypted share on
    /// each backend in stable order. A failed `put` aborts the whole
    /// registration: the caller must treat the user as unregistered until
    /// this returns successfully.
    pub async fn register(&self, pk_hex: &str) -> Result<RegisterResult> {
        let user_id = user_id_from_pk(pk_hex)?;
        if self.is_registered(&user_id).await {
            return Err(AuthError::AlreadyRegistered(user_id));
        }

        let master_key = MasterKey::generate()?;
        let split = sharing::split(&master_key, self.threshold, self.total_shares)?;

        let mut stored = Vec::with_capacity(split.shares.len());
        for (offset, share) in split.shares.iter().enumerate() {
            let index = (offset + 1) as u8;
            let backend = self.backend_for_index(index);
            let mut envelope =
                sharing::encrypt_share(share, index, backend.tag().as_str(), pk_hex)?;

            let receipt = self
                .put_with_deadline(backend, &user_id, envelope.clone())
                .await?;
            tracing::debug!(
                backend = %backend.tag(),
                share_index = index,
                receipt = %receipt,
                "stored encrypted share"
            );
            envelope.receipt = Some(receipt);
            stored.push(envelope);
        }

        tracing::info!(
            user_id = %user_id,
            shares = stored.len(),
            threshold = self.threshold,
            "registration complete"
        );

        Ok(RegisterResult {
            success: true,
            user_id,
            shares: stored,
            master_key_hash: master_key.hash(),
        })
    }

    /// Log a user in by collecting and decrypting threshold-many shares.
    ///
    /// Backends are polled in stable order until enough shares decrypt.
    /// A backend that is down, empty, or holds a share that fails
    /// authentication is skipped with a warning; any other failure aborts.
    pub async fn login(&self, pk_hex: &str) -> Result<LoginResult> {
        let user_id = user_id_from_pk(pk_hex)?;
        if !self.is_registered(&user_id).await {
            return Err(AuthError::NotRegistered(user_id));
        }

        let mut collected: Vec<ShareData> = Vec::new();
        for backend in &self.backends {
            if collected.len() >= self.threshold as usize {
                break;
            }
            match self.fetch_share(backend, &user_id, pk_hex).await {
                Ok(Some(share)) => collected.push(share),
                Ok(None) => {
                    tracing::debug!(backend = %backend.tag(), "no share stored");
                }
                Err(e) if e.is_recoverable_during_login() => {
                    tracing::warn!(
                        backend = %backend.tag(),
                        kind = e.kind(),
                        error = %e,
                        "skipping backend during login"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        if collected.len() < self.threshold as usize {
            return Err(AuthError::InsufficientShares {
                required: self.threshold as usize,
                collected: collected.len(),
            });
        }

        let key_hex = sharing::combine(&collected, self.threshold)?;
        let master_key = MasterKey::from_hex(&key_hex)?;

        tracing::info!(
            user_id = %user_id,
            shares_used = collected.len(),
            "login complete"
        );

        Ok(LoginResult {
            success: true,
            user_id,
            master_key,
            shares_used: collected.len(),
        })
    }

    /// Open a session around a completed login.
    pub fn create_session(&self, login: &LoginResult, ttl_ms: Option<u64>) -> Session {
        Session::new(
            login.user_id.clone(),
            login.master_key.clone(),
            ttl_ms.unwrap_or(DEFAULT_SESSION_TTL_MS),
        )
    }

    async fn fetch_share(
        &self,
        backend: &Arc<dyn ShareBackend>,
        user_id: &str,
        pk_hex: &str,
    ) -> Result<Option<ShareData>> {
        let envelope = match self.get_with_deadline(backend, user_id).await? {
            Some(envelope) => envelope,
            None => return Ok(None),
        };
        let share = sharing::decrypt_share(&envelope, pk_hex)?;
        Ok(Some(share))
    }

    async fn put_with_deadline(
        &self,
        backend: &Arc<dyn ShareBackend>,
        user_id: &str,
        share: EncryptedShare,
    ) -> Result<String> {
        tokio::time::timeout(self.op_timeout, backend.put(user_id, share))
            .await
            .unwrap_or_else(|_| {
                Err(AuthError::BackendUnavailable(format!(
                    "put on {} timed out",
                    backend.tag()
                )))
            })
    }

    async fn get_with_deadline(
        &self,
        backend: &Arc<dyn ShareBackend>,
        user_id: &str,
    ) -> Result<Option<EncryptedShare>> {
        tokio::time::timeout(self.op_timeout, backend.get(user_id))
            .await
            .unwrap_or_else(|_| {
                Err(AuthError::BackendUnavailable(format!(
                    "get on {} timed out",
                    backend.tag()
                )))
            })
    }

    async fn has_with_deadline(
        &self,
        backend: &Arc<dyn ShareBackend>,
        user_id: &str,
    ) -> Result<bool> {
        tokio::time::timeout(self.op_timeout, backend.has(user_id))
            .await
            .unwrap_or_else(|_| {
                Err(AuthError::BackendUnavailable(format!(
                    "has on {} timed out",
                    backend.tag()
                )))
            })
    }
}
