use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

use crate::config::GatewaySettings;
use crate::error::{AppError, Result};
use crate::gateway::{canonical_query, hmac_sha512_hex, SECURE_HASH_PARAM, SECURE_HASH_TYPE_PARAM};

/// Gateway response code meaning the payment succeeded.
pub const RESPONSE_CODE_SUCCESS: &str = "00";

/// A callback whose signature checked out. `gateway_success` reflects
/// the gateway's own verdict, not ours.
#[derive(Debug, Clone)]
pub struct VerifiedCallback {
    pub txn_ref: String,
    pub response_code: String,
    pub transaction_no: Option<String>,
}

impl VerifiedCallback {
    /// True when the gateway confirmed the payment.
    pub fn gateway_success(&self) -> bool {
        self.response_code == RESPONSE_CODE_SUCCESS
    }
}

/// Verifies inbound gateway callbacks against the shared secret.
#[derive(Debug, Clone)]
pub struct CallbackVerifier {
    settings: GatewaySettings,
}

impl CallbackVerifier {
    pub fn new(settings: GatewaySettings) -> Self {
        Self { settings }
    }

    /// Recomputes the HMAC over every parameter except the hash fields
    /// and compares it to the received hash in constant time.
    pub fn verify(&self, params: &BTreeMap<String, String>) -> Result<VerifiedCallback> {
        let received_hash = params
            .get(SECURE_HASH_PARAM)
            .map(|h| h.to_lowercase())
            .ok_or(AppError::SignatureInvalid)?;

        let mut signed: BTreeMap<String, String> = params.clone();
        signed.remove(SECURE_HASH_PARAM);
        signed.remove(SECURE_HASH_TYPE_PARAM);

        let expected = hmac_sha512_hex(&self.settings.hash_secret, &canonical_query(&signed))?;

        if expected.as_bytes().ct_eq(received_hash.as_bytes()).unwrap_u8() != 1 {
            return Err(AppError::SignatureInvalid);
        }

        let txn_ref = signed
            .get("vnp_TxnRef")
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or(AppError::SignatureInvalid)?;

        let response_code = signed
            .get("vnp_ResponseCode")
            .cloned()
            .unwrap_or_default();

        Ok(VerifiedCallback {
            txn_ref,
            response_code,
            transaction_no: signed.get("vnp_TransactionNo").cloned(),
        })
    }
}
