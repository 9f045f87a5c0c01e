use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gateway::{PaymentRequest, PaymentRequestBuilder};
use crate::ledger;
use crate::models::{
    Payment, PaymentMethod, PaymentStatus, PaymentType, Receipt, ReceiptItem,
};
use crate::observability::mask_sensitive;
use crate::repositories::{PaymentRepository, RepairOrderRepository};
use crate::services::cart::CartStore;

/// A created payment together with the gateway redirect URL.
#[derive(Debug, Clone)]
pub struct CheckoutRedirect {
    pub payment: Payment,
    pub redirect_url: String,
}

/// Creates payments and their signed gateway redirects, and settles
/// cash cart sales directly.
pub struct CheckoutService {
    pool: PgPool,
    payment_repo: PaymentRepository,
    repair_order_repo: RepairOrderRepository,
    cart: Arc<dyn CartStore>,
    builder: PaymentRequestBuilder,
    vat_rate: Decimal,
}

impl CheckoutService {
    pub fn new(
        pool: PgPool,
        cart: Arc<dyn CartStore>,
        builder: PaymentRequestBuilder,
        vat_rate: Decimal,
    ) -> Self {
        Self {
            payment_repo: PaymentRepository::new(pool.clone()),
            repair_order_repo: RepairOrderRepository::new(pool.clone()),
            pool,
            cart,
            builder,
            vat_rate,
        }
    }

    /// Creates a BUY payment from the session cart. The cart contents
    /// are frozen onto the payment; later cart edits cannot affect
    /// settlement.
    pub async fn create_cart_payment(
        &self,
        session: &str,
        client_ip: &str,
    ) -> Result<CheckoutRedirect> {
        let snapshot = self.cart.snapshot(session).await?;
        if snapshot.is_empty() {
            return Err(AppError::Validation(format!(
                "cart for session '{session}' is empty"
            )));
        }

        let subtotal = ledger::cart_subtotal(&snapshot);
        let amount = ledger::apply_vat(subtotal, self.vat_rate);
        let txn_ref = new_txn_ref();

        let payment = Payment::buy(
            amount,
            self.vat_rate,
            txn_ref,
            session.to_string(),
            &snapshot,
        )?;
        let payment = self.payment_repo.create(&payment).await?;

        let redirect_url = self.builder.build(&PaymentRequest {
            amount: payment.amount,
            txn_ref: payment.txn_ref.clone(),
            order_info: format!("Cart purchase {}", payment.txn_ref),
            client_ip: client_ip.to_string(),
            created_at: Utc::now(),
        })?;

        tracing::info!(txn_ref = %mask_sensitive(&payment.txn_ref, 4), amount = %payment.amount, "cart payment created");
        Ok(CheckoutRedirect { payment, redirect_url })
    }

    /// Creates a REPAIR payment for a completed repair order. The
    /// amount is derived from the order's snapshot lines plus VAT.
    pub async fn create_repair_payment(
        &self,
        repair_order_id: Uuid,
        client_ip: &str,
    ) -> Result<CheckoutRedirect> {
        let order = self
            .repair_order_repo
            .find_by_id(repair_order_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Repair order '{repair_order_id}' not found"))
            })?;

        if order.status.is_locked() {
            return Err(AppError::OrderLocked);
        }
        if !order.status.is_settleable() {
            return Err(AppError::Validation(format!(
                "repair order '{}' is {:?}, only DONE orders can be paid",
                order.id, order.status
            )));
        }

        let lines = self.repair_order_repo.find_lines(order.id).await?;
        let subtotal = ledger::order_subtotal(&lines);
        let amount = ledger::apply_vat(subtotal, self.vat_rate);

        let payment = Payment::repair(amount, self.vat_rate, new_txn_ref(), order.id);
        let payment = self.payment_repo.create(&payment).await?;

        let redirect_url = self.builder.build(&PaymentRequest {
            amount: payment.amount,
            txn_ref: payment.txn_ref.clone(),
            order_info: format!("Repair order {}", order.id),
            client_ip: client_ip.to_string(),
            created_at: Utc::now(),
        })?;

        tracing::info!(txn_ref = %mask_sensitive(&payment.txn_ref, 4), order_id = %order.id, "repair payment created");
        Ok(CheckoutRedirect { payment, redirect_url })
    }

    /// Settles a cart sale paid in cash at the counter: the payment is
    /// born settled and its receipt materializes in the same
    /// transaction.
    pub async fn settle_cart_cash(&self, session: &str) -> Result<(Receipt, Vec<ReceiptItem>)> {
        let snapshot = self.cart.snapshot(session).await?;
        if snapshot.is_empty() {
            return Err(AppError::Validation(format!(
                "cart for session '{session}' is empty"
            )));
        }

        let subtotal = ledger::cart_subtotal(&snapshot);
        let total = ledger::apply_vat(subtotal, self.vat_rate);

        let mut payment = Payment::buy(
            total,
            self.vat_rate,
            new_txn_ref(),
            session.to_string(),
            &snapshot,
        )?;
        payment.status = PaymentStatus::Success;
        payment.settled_at = Some(Utc::now());

        let receipt = Receipt::new(
            payment.id,
            PaymentType::Buy,
            subtotal,
            self.vat_rate,
            total,
            PaymentMethod::Cash,
        );
        let items: Vec<ReceiptItem> = snapshot
            .iter()
            .map(|entry| {
                ReceiptItem::spare_part(
                    receipt.id,
                    Some(entry.spare_part_id),
                    entry.quantity,
                    entry.unit_price,
                )
            })
            .collect();

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, payment_type, amount, vat_rate, txn_ref, vnp_transaction_no, status, cart_snapshot, cart_session, repair_order_id, receipt_id, created_at, settled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(payment.id)
        .bind(payment.payment_type)
        .bind(payment.amount)
        .bind(payment.vat_rate)
        .bind(&payment.txn_ref)
        .bind(&payment.vnp_transaction_no)
        .bind(payment.status)
        .bind(&payment.cart_snapshot)
        .bind(&payment.cart_session)
        .bind(payment.repair_order_id)
        .bind(Option::<Uuid>::None)
        .bind(payment.created_at)
        .bind(payment.settled_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let receipt = sqlx::query_as::<_, Receipt>(
            r#"
            INSERT INTO receipts (id, payment_id, receipt_type, subtotal, vat_rate, vat_amount, total_paid, payment_method, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, payment_id, receipt_type, subtotal, vat_rate, vat_amount, total_paid, payment_method, paid_at
            "#,
        )
        .bind(receipt.id)
        .bind(receipt.payment_id)
        .bind(receipt.receipt_type)
        .bind(receipt.subtotal)
        .bind(receipt.vat_rate)
        .bind(receipt.vat_amount)
        .bind(receipt.total_paid)
        .bind(receipt.payment_method)
        .bind(receipt.paid_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO receipt_items (id, receipt_id, item_type, service_id, spare_part_id, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id)
            .bind(item.receipt_id)
            .bind(item.item_type)
            .bind(item.service_id)
            .bind(item.spare_part_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        }

        sqlx::query("UPDATE payments SET receipt_id = $2 WHERE id = $1")
            .bind(payment.id)
            .bind(receipt.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        // Post-commit: the sale is durable, a leftover cart is harmless.
        if let Err(e) = self.cart.clear(session).await {
            tracing::warn!(session = %session, error = %e, "failed to clear cart");
        }

        tracing::info!(receipt_id = %receipt.id, total = %receipt.total_paid, "cash sale settled");
        Ok((receipt, items))
    }
}

/// Unique gateway transaction reference.
fn new_txn_ref() -> String {
    format!("GS{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txn_refs_are_unique_and_non_empty() {
        let a = new_txn_ref();
        let b = new_txn_ref();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }
}
