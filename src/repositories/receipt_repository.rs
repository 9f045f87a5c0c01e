use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Receipt, ReceiptItem};

/// Repository for Receipt records and their items. Receipts are only
/// ever created inside the settlement transaction; this repository
/// serves reads.
pub struct ReceiptRepository {
    pool: PgPool,
}

impl ReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_payment(&self, payment_id: Uuid) -> Result<Option<Receipt>> {
        let row = sqlx::query_as::<_, Receipt>(
            r#"
            SELECT id, payment_id, receipt_type, subtotal, vat_rate, vat_amount, total_paid, payment_method, paid_at
            FROM receipts
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_items(&self, receipt_id: Uuid) -> Result<Vec<ReceiptItem>> {
        let rows = sqlx::query_as::<_, ReceiptItem>(
            r#"
            SELECT id, receipt_id, item_type, service_id, spare_part_id, quantity, unit_price, total_price
            FROM receipt_items
            WHERE receipt_id = $1
            ORDER BY id
            "#,
        )
        .bind(receipt_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    pub async fn count_by_payment(&self, payment_id: Uuid) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM receipts
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }
}
