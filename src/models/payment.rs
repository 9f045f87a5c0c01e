use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// What a payment settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// A spare-part cart purchase.
    Buy,
    /// A completed repair order.
    Repair,
}

/// Status of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    /// Terminal payments only ever replay their stored outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed)
    }
}

/// One cart entry frozen onto a BUY payment at request time, so later
/// cart mutation cannot affect settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub spare_part_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// One attempt to settle a cart purchase or a repair order through the
/// payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub vat_rate: Decimal,
    /// Globally unique transaction reference sent to the gateway.
    pub txn_ref: String,
    /// Transaction number reported back by the gateway.
    pub vnp_transaction_no: Option<String>,
    pub status: PaymentStatus,
    /// Cart snapshot for BUY payments, serialized `Vec<CartEntry>`.
    pub cart_snapshot: Option<serde_json::Value>,
    /// Session key of the originating cart, cleared on BUY success.
    pub cart_session: Option<String>,
    pub repair_order_id: Option<Uuid>,
    /// Set as the last step of settlement.
    pub receipt_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Creates a BUY payment with a frozen cart snapshot.
    pub fn buy(
        amount: Decimal,
        vat_rate: Decimal,
        txn_ref: String,
        cart_session: String,
        snapshot: &[CartEntry],
    ) -> Result<Self> {
        let cart_snapshot = serde_json::to_value(snapshot)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("cart snapshot serialization: {e}")))?;

        Ok(Self {
            id: Uuid::new_v4(),
            payment_type: PaymentType::Buy,
            amount,
            vat_rate,
            txn_ref,
            vnp_transaction_no: None,
            status: PaymentStatus::Pending,
            cart_snapshot: Some(cart_snapshot),
            cart_session: Some(cart_session),
            repair_order_id: None,
            receipt_id: None,
            created_at: Utc::now(),
            settled_at: None,
        })
    }

    /// Creates a REPAIR payment for a completed repair order.
    pub fn repair(
        amount: Decimal,
        vat_rate: Decimal,
        txn_ref: String,
        repair_order_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_type: PaymentType::Repair,
            amount,
            vat_rate,
            txn_ref,
            vnp_transaction_no: None,
            status: PaymentStatus::Pending,
            cart_snapshot: None,
            cart_session: None,
            repair_order_id: Some(repair_order_id),
            receipt_id: None,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    /// Deserializes the frozen cart snapshot of a BUY payment.
    pub fn cart_entries(&self) -> Result<Vec<CartEntry>> {
        let snapshot = self.cart_snapshot.clone().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "BUY payment '{}' has no cart snapshot",
                self.txn_ref
            ))
        })?;
        serde_json::from_value(snapshot)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("cart snapshot deserialization: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_terminal_statuses() {
        assert!(PaymentStatus::Success.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
    }

    #[test]
    fn test_buy_payment_freezes_cart() {
        let entry = CartEntry {
            spare_part_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: dec!(50),
        };
        let payment = Payment::buy(
            dec!(110),
            dec!(0.1),
            "TXN-1".to_string(),
            "session-1".to_string(),
            &[entry.clone()],
        )
        .unwrap();

        assert_eq!(payment.payment_type, PaymentType::Buy);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.cart_entries().unwrap(), vec![entry]);
    }

    #[test]
    fn test_repair_payment_links_order() {
        let order_id = Uuid::new_v4();
        let payment = Payment::repair(dec!(110), dec!(0.1), "TXN-2".to_string(), order_id);
        assert_eq!(payment.repair_order_id, Some(order_id));
        assert!(payment.cart_snapshot.is_none());
        assert!(payment.cart_entries().is_err());
    }
}
