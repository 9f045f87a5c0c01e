//! Outbound request signing and inbound callback verification for the
//! VNPay gateway. Both sides share the same canonical encoding: sort
//! parameters lexicographically, percent-encode values with spaces as
//! `+`, join as `k=v&…`, then HMAC-SHA512 the exact byte string.

pub mod callback;
pub mod request_builder;

pub use callback::{CallbackVerifier, VerifiedCallback, RESPONSE_CODE_SUCCESS};
pub use request_builder::{PaymentRequest, PaymentRequestBuilder};

use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::collections::BTreeMap;

use crate::error::{AppError, Result};

/// Parameter carrying the signature; excluded from the signed string.
pub const SECURE_HASH_PARAM: &str = "vnp_SecureHash";
/// Optional hash-type hint some gateway versions echo back.
pub const SECURE_HASH_TYPE_PARAM: &str = "vnp_SecureHashType";

/// Percent-encodes a value with the space-as-`+` convention the
/// gateway signs with.
pub(crate) fn encode_value(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Builds the canonical signed string from already-sorted parameters.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, encode_value(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex-encoded HMAC-SHA512 of `data` under the shared secret.
pub fn hmac_sha512_hex(secret: &str, data: &str) -> Result<String> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC key setup: {e}")))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_value_space_as_plus() {
        assert_eq!(encode_value("Thanh toan don hang"), "Thanh+toan+don+hang");
    }

    #[test]
    fn test_encode_value_reserved_characters() {
        assert_eq!(encode_value("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_value("http://x/y"), "http%3A%2F%2Fx%2Fy");
    }

    #[test]
    fn test_canonical_query_is_sorted() {
        let mut params = BTreeMap::new();
        params.insert("b".to_string(), "2".to_string());
        params.insert("a".to_string(), "1 1".to_string());
        assert_eq!(canonical_query(&params), "a=1+1&b=2");
    }

    #[test]
    fn test_hmac_is_deterministic() {
        let a = hmac_sha512_hex("secret", "a=1&b=2").unwrap();
        let b = hmac_sha512_hex("secret", "a=1&b=2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);

        let c = hmac_sha512_hex("secret", "a=1&b=3").unwrap();
        assert_ne!(a, c);
    }
}
