use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::PaymentType;

/// How the receipt was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Vnpay,
    Cash,
}

/// Classification of a receipt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "receipt_item_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptItemType {
    Service,
    SparePart,
}

/// The durable settlement record. At most one receipt exists per
/// settled payment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Receipt {
    pub id: Uuid,
    /// Owning payment; unique, enforcing the at-most-once invariant.
    pub payment_id: Uuid,
    pub receipt_type: PaymentType,
    pub subtotal: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_paid: Decimal,
    pub payment_method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(
        payment_id: Uuid,
        receipt_type: PaymentType,
        subtotal: Decimal,
        vat_rate: Decimal,
        total_paid: Decimal,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_id,
            receipt_type,
            subtotal,
            vat_rate,
            vat_amount: total_paid - subtotal,
            total_paid,
            payment_method,
            paid_at: Utc::now(),
        }
    }
}

/// One line of a receipt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReceiptItem {
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub item_type: ReceiptItemType,
    pub service_id: Option<Uuid>,
    pub spare_part_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl ReceiptItem {
    /// A labor item, always quantity 1 at the snapshot service price.
    pub fn service(receipt_id: Uuid, service_id: Option<Uuid>, unit_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            receipt_id,
            item_type: ReceiptItemType::Service,
            service_id,
            spare_part_id: None,
            quantity: 1,
            unit_price,
            total_price: unit_price,
        }
    }

    /// A spare-part item at the snapshot unit price.
    pub fn spare_part(
        receipt_id: Uuid,
        spare_part_id: Option<Uuid>,
        quantity: i32,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            receipt_id,
            item_type: ReceiptItemType::SparePart,
            service_id: None,
            spare_part_id,
            quantity,
            unit_price,
            total_price: unit_price * Decimal::from(quantity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_receipt_vat_amount() {
        let r = Receipt::new(
            Uuid::new_v4(),
            PaymentType::Repair,
            dec!(100),
            dec!(0.1),
            dec!(110),
            PaymentMethod::Vnpay,
        );
        assert_eq!(r.vat_amount, dec!(10));
    }

    #[test]
    fn test_service_item_is_quantity_one() {
        let item = ReceiptItem::service(Uuid::new_v4(), Some(Uuid::new_v4()), dec!(200));
        assert_eq!(item.quantity, 1);
        assert_eq!(item.total_price, dec!(200));
        assert_eq!(item.item_type, ReceiptItemType::Service);
    }

    #[test]
    fn test_spare_part_item_total() {
        let item = ReceiptItem::spare_part(Uuid::new_v4(), Some(Uuid::new_v4()), 2, dec!(50));
        assert_eq!(item.total_price, dec!(100));
        assert_eq!(item.item_type, ReceiptItemType::SparePart);
    }
}
