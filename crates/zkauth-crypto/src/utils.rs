//! Common utilities: timestamps, random bytes, base64url encoding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::{CryptoError, Result};

/// Returns the current Unix timestamp in seconds.
///
/// # Panics
///
/// Panics if the system clock is set before the Unix epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time is before the Unix epoch")
        .as_secs()
}

/// Returns the current Unix timestamp in milliseconds.
///
/// Session expiry deadlines are tracked at millisecond granularity.
pub fn current_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time is before the Unix epoch")
        .as_millis() as u64
}

/// Fill a fixed-size array with cryptographically secure random bytes.
pub fn generate_random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    rand::thread_rng()
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;
    Ok(bytes)
}

/// Base64url encode data without padding.
pub fn base64_url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Base64url decode data (unpadded).
pub fn base64_url_decode(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|e| CryptoError::InvalidInput(format!("invalid base64url: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_are_monotone_and_consistent() {
        let secs = current_timestamp();
        let millis = current_timestamp_millis();
        assert!(secs > 1_600_000_000, "clock should be after Sep 2020");
        assert!(millis / 1000 >= secs);
    }

    #[test]
    fn test_random_bytes_differ() {
        let a: [u8; 32] = generate_random_bytes().unwrap();
        let b: [u8; 32] = generate_random_bytes().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_base64_url_roundtrip() {
        let original = b"hello zkauth";
        let encoded = base64_url_encode(original);
        assert!(!encoded.contains('='));
        assert_eq!(base64_url_decode(&encoded).unwrap(), original);
    }

    #[test]
    fn test_base64_url_decode_rejects_garbage() {
        assert!(base64_url_decode("!!not base64!!").is_err());
    }
}
