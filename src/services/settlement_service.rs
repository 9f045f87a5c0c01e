use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gateway::{CallbackVerifier, VerifiedCallback};
use crate::ledger;
use crate::lifecycle::{repair_order_transition, vehicle_cascade, RepairOrderEvent};
use crate::models::{
    Payment, PaymentMethod, PaymentStatus, PaymentType, Receipt, ReceiptItem, RepairLine,
    RepairOrder, Vehicle,
};
use crate::observability::mask_sensitive;
use crate::repositories::{PaymentRepository, ReceiptRepository};
use crate::services::cart::CartStore;

/// A settled payment with its materialized receipt.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub payment: Payment,
    pub receipt: Receipt,
    pub items: Vec<ReceiptItem>,
}

/// Outcome of reconciling one gateway callback.
#[derive(Debug, Clone)]
pub enum ReconciliationResult {
    /// Payment settled and receipt created on this call.
    Settled(SettlementOutcome),
    /// Gateway reported failure; the payment is now FAILED.
    Failed(Payment),
    /// Replay of a callback for an already-settled payment; the
    /// stored outcome is returned without reprocessing.
    AlreadySettled(SettlementOutcome),
    /// Replay for an already-failed payment.
    AlreadyFailed(Payment),
}

impl ReconciliationResult {
    pub fn is_replay(&self) -> bool {
        matches!(
            self,
            ReconciliationResult::AlreadySettled(_) | ReconciliationResult::AlreadyFailed(_)
        )
    }
}

/// Reconciles verified gateway callbacks against pending payments.
///
/// All mutation happens in one database transaction holding a row
/// lock on the payment, so concurrent callbacks for the same txn ref
/// serialize: one transitions the payment, the other observes the
/// terminal state and replays the stored outcome.
pub struct SettlementService {
    pool: PgPool,
    verifier: CallbackVerifier,
    cart: Arc<dyn CartStore>,
    payment_repo: PaymentRepository,
    receipt_repo: ReceiptRepository,
}

impl SettlementService {
    pub fn new(pool: PgPool, verifier: CallbackVerifier, cart: Arc<dyn CartStore>) -> Self {
        Self {
            payment_repo: PaymentRepository::new(pool.clone()),
            receipt_repo: ReceiptRepository::new(pool.clone()),
            pool,
            verifier,
            cart,
        }
    }

    /// Verifies and reconciles a raw callback. Verification failures
    /// surface before any state is touched; a persistence conflict is
    /// retried once for the same callback.
    pub async fn reconcile(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<ReconciliationResult> {
        let verified = self.verifier.verify(params).map_err(|e| {
            tracing::warn!(error = %e, "dropping unverifiable callback");
            e
        })?;

        match self.reconcile_verified(&verified).await {
            Err(AppError::Database(e)) => {
                tracing::warn!(
                    txn_ref = %mask_sensitive(&verified.txn_ref, 4),
                    error = %e,
                    "settlement transaction failed, retrying once"
                );
                self.reconcile_verified(&verified).await
            }
            other => other,
        }
    }

    /// Payments stuck in PENDING longer than the staleness window.
    pub async fn find_stale_pending(&self, older_than: DateTime<Utc>) -> Result<Vec<Payment>> {
        self.payment_repo.find_stale_pending(older_than).await
    }

    async fn reconcile_verified(
        &self,
        verified: &VerifiedCallback,
    ) -> Result<ReconciliationResult> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let payment = self
            .payment_repo
            .lock_by_txn_ref(&mut tx, &verified.txn_ref)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(verified.txn_ref.clone()))?;

        if payment.status.is_terminal() {
            // Replay: nothing to write, return what the first callback
            // produced.
            tx.commit().await.map_err(AppError::Database)?;
            return self.stored_outcome(payment).await;
        }

        if !verified.gateway_success() {
            let payment = mark_failed(&mut tx, &payment, verified).await?;
            tx.commit().await.map_err(AppError::Database)?;

            tracing::info!(
                txn_ref = %mask_sensitive(&payment.txn_ref, 4),
                response_code = %verified.response_code,
                "gateway reported failure, payment marked FAILED"
            );
            return Ok(ReconciliationResult::Failed(payment));
        }

        let outcome = self.settle(&mut tx, payment, verified).await?;
        tx.commit().await.map_err(AppError::Database)?;

        // Post-commit: the cart clear is not part of the settlement
        // invariant, a leftover cart is harmless.
        if outcome.payment.payment_type == PaymentType::Buy {
            if let Some(session) = &outcome.payment.cart_session {
                if let Err(e) = self.cart.clear(session).await {
                    tracing::warn!(session = %session, error = %e, "failed to clear cart");
                }
            }
        }

        tracing::info!(
            txn_ref = %mask_sensitive(&outcome.payment.txn_ref, 4),
            receipt_id = %outcome.receipt.id,
            total_paid = %outcome.receipt.total_paid,
            "payment settled"
        );
        Ok(ReconciliationResult::Settled(outcome))
    }

    /// Settles a PENDING payment: receipt, items, lifecycle cascade
    /// and the payment update all commit atomically with the caller's
    /// transaction.
    async fn settle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: Payment,
        verified: &VerifiedCallback,
    ) -> Result<SettlementOutcome> {
        let subtotal = ledger::subtotal_before_vat(payment.amount, payment.vat_rate);

        let receipt = Receipt::new(
            payment.id,
            payment.payment_type,
            subtotal,
            payment.vat_rate,
            payment.amount,
            PaymentMethod::Vnpay,
        );
        let receipt = insert_receipt(tx, &receipt).await?;

        let items = match payment.payment_type {
            PaymentType::Buy => self.buy_items(&payment, receipt.id)?,
            PaymentType::Repair => self.repair_items(tx, &payment, receipt.id).await?,
        };
        for item in &items {
            insert_item(tx, item).await?;
        }

        // Linking the receipt is the last step; afterwards the pair is
        // durably settled.
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = $2, vnp_transaction_no = $3, settled_at = $4, receipt_id = $5
            WHERE id = $1
            RETURNING id, payment_type, amount, vat_rate, txn_ref, vnp_transaction_no, status, cart_snapshot, cart_session, repair_order_id, receipt_id, created_at, settled_at
            "#,
        )
        .bind(payment.id)
        .bind(PaymentStatus::Success)
        .bind(&verified.transaction_no)
        .bind(Utc::now())
        .bind(receipt.id)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(SettlementOutcome { payment, receipt, items })
    }

    /// Receipt items for a BUY payment come from the frozen cart
    /// snapshot, never the live cart or catalog.
    fn buy_items(&self, payment: &Payment, receipt_id: Uuid) -> Result<Vec<ReceiptItem>> {
        let entries = payment.cart_entries()?;
        Ok(entries
            .iter()
            .map(|entry| {
                ReceiptItem::spare_part(
                    receipt_id,
                    Some(entry.spare_part_id),
                    entry.quantity,
                    entry.unit_price,
                )
            })
            .collect())
    }

    /// Receipt items for a REPAIR payment come from the order's
    /// snapshot lines; the order is driven to PAID and the vehicle
    /// cascades to DELIVERED inside the same transaction.
    async fn repair_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: &Payment,
        receipt_id: Uuid,
    ) -> Result<Vec<ReceiptItem>> {
        let order_id = payment.repair_order_id.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "REPAIR payment '{}' has no repair order",
                payment.txn_ref
            ))
        })?;

        let order = lock_order(tx, order_id).await?;
        let next = repair_order_transition(order.status, RepairOrderEvent::Settle)?;

        let lines = sqlx::query_as::<_, RepairLine>(
            r#"
            SELECT id, repair_order_id, task, service_id, spare_part_id, quantity, service_price, spare_part_price, created_at
            FROM repair_lines
            WHERE repair_order_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(order.id)
        .fetch_all(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        let mut items = Vec::new();
        for line in &lines {
            if line.has_service() {
                items.push(ReceiptItem::service(
                    receipt_id,
                    line.service_id,
                    line.service_price.unwrap_or_default(),
                ));
            }
            if line.has_spare_part() {
                items.push(ReceiptItem::spare_part(
                    receipt_id,
                    line.spare_part_id,
                    line.quantity,
                    line.spare_part_price.unwrap_or_default(),
                ));
            }
        }

        sqlx::query("UPDATE repair_orders SET status = $2 WHERE id = $1")
            .bind(order.id)
            .bind(next)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, license_plate, vehicle_type, customer_id, status, active, created_at
            FROM vehicles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(order.vehicle_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        if let Some(target) = vehicle_cascade(vehicle.status, next) {
            sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
                .bind(vehicle.id)
                .bind(target)
                .execute(&mut **tx)
                .await
                .map_err(AppError::Database)?;
        }

        Ok(items)
    }

    /// Loads the outcome stored by the callback that first settled or
    /// failed this payment.
    async fn stored_outcome(&self, payment: Payment) -> Result<ReconciliationResult> {
        match payment.status {
            PaymentStatus::Failed => Ok(ReconciliationResult::AlreadyFailed(payment)),
            PaymentStatus::Success => {
                let receipt = self
                    .receipt_repo
                    .find_by_payment(payment.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(
                            "settled payment '{}' has no receipt",
                            payment.txn_ref
                        ))
                    })?;
                let items = self.receipt_repo.find_items(receipt.id).await?;

                tracing::info!(txn_ref = %mask_sensitive(&payment.txn_ref, 4), "replayed callback, returning stored outcome");
                Ok(ReconciliationResult::AlreadySettled(SettlementOutcome {
                    payment,
                    receipt,
                    items,
                }))
            }
            PaymentStatus::Pending => Err(AppError::Internal(anyhow::anyhow!(
                "stored_outcome called on pending payment '{}'",
                payment.txn_ref
            ))),
        }
    }
}

async fn mark_failed(
    tx: &mut Transaction<'_, Postgres>,
    payment: &Payment,
    verified: &VerifiedCallback,
) -> Result<Payment> {
    let row = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET status = $2, vnp_transaction_no = $3, settled_at = $4
        WHERE id = $1
        RETURNING id, payment_type, amount, vat_rate, txn_ref, vnp_transaction_no, status, cart_snapshot, cart_session, repair_order_id, receipt_id, created_at, settled_at
        "#,
    )
    .bind(payment.id)
    .bind(PaymentStatus::Failed)
    .bind(&verified.transaction_no)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(row)
}

async fn lock_order(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<RepairOrder> {
    sqlx::query_as::<_, RepairOrder>(
        r#"
        SELECT id, reception_form_id, vehicle_id, employee_id, status, created_at
        FROM repair_orders
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::NotFound(format!("Repair order '{id}' not found")))
}

async fn insert_receipt(
    tx: &mut Transaction<'_, Postgres>,
    receipt: &Receipt,
) -> Result<Receipt> {
    let row = sqlx::query_as::<_, Receipt>(
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
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(row)
}

async fn insert_item(tx: &mut Transaction<'_, Postgres>, item: &ReceiptItem) -> Result<()> {
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
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(())
}
