use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Payment, PaymentStatus};

const PAYMENT_COLUMNS: &str = "id, payment_type, amount, vat_rate, txn_ref, vnp_transaction_no, status, cart_snapshot, cart_session, repair_order_id, receipt_id, created_at, settled_at";

/// Repository for Payment records.
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payment: &Payment) -> Result<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (id, payment_type, amount, vat_rate, txn_ref, vnp_transaction_no, status, cart_snapshot, cart_session, repair_order_id, receipt_id, created_at, settled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, payment_type, amount, vat_rate, txn_ref, vnp_transaction_no, status, cart_snapshot, cart_session, repair_order_id, receipt_id, created_at, settled_at
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
        .bind(payment.receipt_id)
        .bind(payment.created_at)
        .bind(payment.settled_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_by_txn_ref(&self, txn_ref: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE txn_ref = $1"
        ))
        .bind(txn_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Locks the payment row for the duration of the transaction so
    /// concurrent callbacks for the same txn ref serialize.
    pub async fn lock_by_txn_ref(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        txn_ref: &str,
    ) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE txn_ref = $1 FOR UPDATE"
        ))
        .bind(txn_ref)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Payments stuck in PENDING past the staleness window. Reported
    /// for operator attention, never auto-expired.
    pub async fn find_stale_pending(&self, older_than: DateTime<Utc>) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE status = $1 AND created_at < $2 ORDER BY created_at"
        ))
        .bind(PaymentStatus::Pending)
        .bind(older_than)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }
}
