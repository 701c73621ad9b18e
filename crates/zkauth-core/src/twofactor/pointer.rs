//! Commit-log pointer records for second-factor state discovery.
//!
//! The commit log is read-only from here: callers hand over the raw records
//! they fetched under the derived lookup identifier, and this module picks
//! the youngest one whose content is a plausible state. By convention the
//! `encryptedData` field carries either the state JSON directly or a sealed
//! envelope to be opened with the master key.

use serde::{Deserialize, Serialize};
use zkauth_crypto::EncryptionResult;

use super::{envelope, TwoFaState};

/// The record type this parser accepts.
pub const POINTER_TYPE: &str = "2fa_secret";

/// A parsed commit-log record locating second-factor state.
///
/// Unknown fields (memo transport, block-time and the like) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFaPointer {
    /// Record discriminator; always `"2fa_secret"`.
    #[serde(rename = "type")]
    pub record_type: String,
    /// The derived lookup identifier this record belongs to.
    pub lookup_key: String,
    /// State payload: plaintext state JSON or a sealed envelope, by
    /// convention.
    pub encrypted_data: String,
    /// Signature of the publishing transaction. Opaque.
    #[serde(default)]
    pub tx_signature: Option<String>,
    /// Publication time, seconds since the epoch.
    #[serde(default)]
    pub timestamp: u64,
}

/// Parse one raw record, returning `None` unless it is a well-formed
/// pointer of the right type.
pub fn parse_pointer(raw: &str) -> Option<TwoFaPointer> {
    let pointer: TwoFaPointer = serde_json::from_str(raw).ok()?;
    if pointer.record_type != POINTER_TYPE {
        return None;
    }
    Some(pointer)
}

/// Resolve the current state from a list of raw records.
///
/// Records that fail to parse, belong to another lookup key, or whose
/// content is not a plausible state (the `totpEnabled` flag must be a JSON
/// boolean) are skipped. The youngest surviving record wins. A missing
/// pointer is `None`, never an error.
pub fn resolve_state(records: &[String], lookup_key: &str) -> Option<TwoFaState> {
    candidates(records, lookup_key)
        .into_iter()
        .find_map(|pointer| parse_plain_state(&pointer.encrypted_data))
}

/// Like [`resolve_state`], additionally opening sealed envelopes with the
/// supplied master key.
pub fn resolve_state_with_key(
    records: &[String],
    lookup_key: &str,
    master_key_hex: &str,
) -> Option<TwoFaState> {
    candidates(records, lookup_key).into_iter().find_map(|pointer| {
        parse_plain_state(&pointer.encrypted_data).or_else(|| {
            let sealed: EncryptionResult =
                serde_json::from_str(&pointer.encrypted_data).ok()?;
            envelope::decrypt_state(&sealed, master_key_hex).ok()
        })
    })
}

/// Matching pointers, youngest first.
fn candidates(records: &[String], lookup_key: &str) -> Vec<TwoFaPointer> {
    let mut matching: Vec<TwoFaPointer> = records
        .iter()
        .filter_map(|raw| parse_pointer(raw))
        .filter(|pointer| pointer.lookup_key == lookup_key)
        .collect();
    matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    matching
}

fn parse_plain_state(data: &str) -> Option<TwoFaState> {
    // The typed parse enforces that totpEnabled is a boolean; any other
    // shape (including a ciphertext blob) falls through.
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    value.get("totpEnabled")?.as_bool()?;
    serde_json::from_value(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkauth_crypto::MasterKey;

    fn record(lookup_key: &str, timestamp: u64, data: &str) -> String {
        serde_json::json!({
            "type": "2fa_secret",
            "lookupKey": lookup_key,
            "encryptedData": data,
            "txSignature": "5K3x...sig",
            "timestamp": timestamp,
        })
        .to_string()
    }

    fn state_json(enabled: bool, secret: &str) -> String {
        serde_json::json!({ "totpEnabled": enabled, "totpSecret": secret }).to_string()
    }

    #[test]
    fn test_parse_pointer() {
        let raw = record("zkauth_2fa:abc", 100, "payload");
        let pointer = parse_pointer(&raw).unwrap();
        assert_eq!(pointer.lookup_key, "zkauth_2fa:abc");
        assert_eq!(pointer.timestamp, 100);
    }

    #[test]
    fn test_parse_rejects_wrong_type_and_garbage() {
        let wrong = serde_json::json!({
            "type": "other_record",
            "lookupKey": "zkauth_2fa:abc",
            "encryptedData": "x",
        })
        .to_string();
        assert!(parse_pointer(&wrong).is_none());
        assert!(parse_pointer("not json at all").is_none());
        assert!(parse_pointer("{}").is_none());
    }

    #[test]
    fn test_resolve_picks_youngest_valid_record() {
        let records = vec![
            record("zkauth_2fa:abc", 100, &state_json(false, "OLD")),
            record("zkauth_2fa:abc", 300, &state_json(true, "NEW")),
            record("zkauth_2fa:abc", 200, &state_json(true, "MID")),
        ];
        let state = resolve_state(&records, "zkauth_2fa:abc").unwrap();
        assert_eq!(state.totp_secret.as_deref(), Some("NEW"));
        assert!(state.totp_enabled);
    }

    #[test]
    fn test_resolve_filters_by_lookup_key() {
        let records = vec![
            record("zkauth_2fa:other", 300, &state_json(true, "THEIRS")),
            record("zkauth_2fa:abc", 100, &state_json(true, "MINE")),
        ];
        let state = resolve_state(&records, "zkauth_2fa:abc").unwrap();
        assert_eq!(state.totp_secret.as_deref(), Some("MINE"));
    }

    #[test]
    fn test_resolve_skips_implausible_content() {
        let records = vec![
            // totpEnabled is a string, not a bool: not a state.
            record(
                "zkauth_2fa:abc",
                300,
                &serde_json::json!({ "totpEnabled": "yes" }).to_string(),
            ),
            record("zkauth_2fa:abc", 100, &state_json(true, "GOOD")),
        ];
        let state = resolve_state(&records, "zkauth_2fa:abc").unwrap();
        assert_eq!(state.totp_secret.as_deref(), Some("GOOD"));
    }

    #[test]
    fn test_missing_pointer_is_none() {
        assert!(resolve_state(&[], "zkauth_2fa:abc").is_none());
        let records = vec![record("zkauth_2fa:abc", 100, "ciphertext-blob")];
        assert!(resolve_state(&records, "zkauth_2fa:abc").is_none());
    }

    #[test]
    fn test_resolve_with_key_opens_sealed_records() {
        let key = MasterKey::generate().unwrap();
        let state = TwoFaState {
            totp_enabled: true,
            totp_secret: Some("SEALED".to_string()),
            ..TwoFaState::default()
        };
        let sealed = envelope::encrypt_state(&state, &key.key()).unwrap();
        let records = vec![record(
            "zkauth_2fa:abc",
            100,
            &serde_json::to_string(&sealed).unwrap(),
        )];

        let resolved = resolve_state_with_key(&records, "zkauth_2fa:abc", &key.key()).unwrap();
        assert_eq!(resolved, state);

        // The wrong key cannot open it, and the plain resolver skips it.
        let other = MasterKey::generate().unwrap();
        assert!(resolve_state_with_key(&records, "zkauth_2fa:abc", &other.key()).is_none());
        assert!(resolve_state(&records, "zkauth_2fa:abc").is_none());
    }
}
