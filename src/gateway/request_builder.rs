use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::config::GatewaySettings;
use crate::error::{AppError, Result};
use crate::gateway::{canonical_query, hmac_sha512_hex, SECURE_HASH_PARAM};

const VNP_VERSION: &str = "2.1.0";
const VNP_COMMAND: &str = "pay";
const VNP_CURRENCY: &str = "VND";
const VNP_ORDER_TYPE: &str = "other";
const VNP_LOCALE: &str = "vn";

/// Inputs for one outbound payment redirect.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Gross amount in whole currency units.
    pub amount: Decimal,
    /// Globally unique transaction reference.
    pub txn_ref: String,
    pub order_info: String,
    /// Client IP forwarded to the gateway.
    pub client_ip: String,
    /// Request creation time; callers pass `Utc::now()` outside tests.
    pub created_at: DateTime<Utc>,
}

/// Builds the signed redirect URL for the payment gateway. Pure URL
/// construction; no network call is made here.
#[derive(Debug, Clone)]
pub struct PaymentRequestBuilder {
    settings: GatewaySettings,
}

impl PaymentRequestBuilder {
    pub fn new(settings: GatewaySettings) -> Self {
        Self { settings }
    }

    /// Assembles, signs and returns the full redirect URL.
    pub fn build(&self, request: &PaymentRequest) -> Result<String> {
        if request.amount <= Decimal::ZERO {
            return Err(AppError::InvalidRequest(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }
        if request.txn_ref.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "transaction ref must not be empty".to_string(),
            ));
        }

        // The gateway expects the amount in minor units (x100).
        let minor_units = (request.amount * Decimal::from(100))
            .trunc()
            .to_i64()
            .ok_or_else(|| {
                AppError::InvalidRequest(format!("amount {} out of range", request.amount))
            })?;

        let mut params = BTreeMap::new();
        params.insert("vnp_Version".to_string(), VNP_VERSION.to_string());
        params.insert("vnp_Command".to_string(), VNP_COMMAND.to_string());
        params.insert("vnp_TmnCode".to_string(), self.settings.tmn_code.clone());
        params.insert("vnp_Amount".to_string(), minor_units.to_string());
        params.insert("vnp_CurrCode".to_string(), VNP_CURRENCY.to_string());
        params.insert("vnp_TxnRef".to_string(), request.txn_ref.clone());
        params.insert("vnp_OrderInfo".to_string(), request.order_info.clone());
        params.insert("vnp_OrderType".to_string(), VNP_ORDER_TYPE.to_string());
        params.insert("vnp_Locale".to_string(), VNP_LOCALE.to_string());
        params.insert(
            "vnp_ReturnUrl".to_string(),
            self.settings.return_url.clone(),
        );
        params.insert("vnp_IpAddr".to_string(), request.client_ip.clone());
        params.insert(
            "vnp_CreateDate".to_string(),
            request.created_at.format("%Y%m%d%H%M%S").to_string(),
        );

        // The hash covers the canonical string without the hash itself.
        let hash_data = canonical_query(&params);
        let secure_hash = hmac_sha512_hex(&self.settings.hash_secret, &hash_data)?;

        Ok(format!(
            "{}?{}&{}={}",
            self.settings.payment_url, hash_data, SECURE_HASH_PARAM, secure_hash
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn settings() -> GatewaySettings {
        GatewaySettings {
            tmn_code: "Q2FNEKGM".to_string(),
            hash_secret: "0TCYX8WBOXJIRXHOTYJFD65650S06J6I".to_string(),
            payment_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
            return_url: "http://localhost:8080/payments/vnpay_return".to_string(),
        }
    }

    fn request(amount: Decimal) -> PaymentRequest {
        PaymentRequest {
            amount,
            txn_ref: "TXN-0001".to_string(),
            order_info: "Thanh toan don hang".to_string(),
            client_ip: "127.0.0.1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_build_rejects_non_positive_amount() {
        let builder = PaymentRequestBuilder::new(settings());
        assert!(matches!(
            builder.build(&request(dec!(0))),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            builder.build(&request(dec!(-5))),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_build_rejects_empty_txn_ref() {
        let builder = PaymentRequestBuilder::new(settings());
        let mut req = request(dec!(110));
        req.txn_ref = "  ".to_string();
        assert!(matches!(
            builder.build(&req),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_amount_is_scaled_to_minor_units() {
        let builder = PaymentRequestBuilder::new(settings());
        let url = builder.build(&request(dec!(110_000))).unwrap();
        assert!(url.contains("vnp_Amount=11000000"));
    }

    #[test]
    fn test_url_parameters_are_sorted_with_hash_last() {
        let builder = PaymentRequestBuilder::new(settings());
        let url = builder.build(&request(dec!(110))).unwrap();

        let query = url.split('?').nth(1).unwrap();
        let keys: Vec<&str> = query.split('&').map(|kv| kv.split('=').next().unwrap()).collect();

        let mut sorted = keys[..keys.len() - 1].to_vec();
        sorted.sort();
        assert_eq!(keys[..keys.len() - 1], sorted[..]);
        assert_eq!(*keys.last().unwrap(), "vnp_SecureHash");
    }

    #[test]
    fn test_order_info_spaces_encoded_as_plus() {
        let builder = PaymentRequestBuilder::new(settings());
        let url = builder.build(&request(dec!(110))).unwrap();
        assert!(url.contains("vnp_OrderInfo=Thanh+toan+don+hang"));
    }

    #[test]
    fn test_create_date_format() {
        let builder = PaymentRequestBuilder::new(settings());
        let url = builder.build(&request(dec!(110))).unwrap();
        assert!(url.contains("vnp_CreateDate=20240315103000"));
    }

    #[test]
    fn test_hash_is_stable_for_identical_input() {
        let builder = PaymentRequestBuilder::new(settings());
        let a = builder.build(&request(dec!(110))).unwrap();
        let b = builder.build(&request(dec!(110))).unwrap();
        assert_eq!(a, b);
    }
}
