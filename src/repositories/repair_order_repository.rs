use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{RepairLine, RepairOrder};

/// Repository for RepairOrder records and their lines.
pub struct RepairOrderRepository {
    pool: PgPool,
}

impl RepairOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RepairOrder>> {
        let row = sqlx::query_as::<_, RepairOrder>(
            r#"
            SELECT id, reception_form_id, vehicle_id, employee_id, status, created_at
            FROM repair_orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_by_reception_form(
        &self,
        reception_form_id: Uuid,
    ) -> Result<Option<RepairOrder>> {
        let row = sqlx::query_as::<_, RepairOrder>(
            r#"
            SELECT id, reception_form_id, vehicle_id, employee_id, status, created_at
            FROM repair_orders
            WHERE reception_form_id = $1
            "#,
        )
        .bind(reception_form_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Returns the order's lines in creation order.
    pub async fn find_lines(&self, repair_order_id: Uuid) -> Result<Vec<RepairLine>> {
        let rows = sqlx::query_as::<_, RepairLine>(
            r#"
            SELECT id, repair_order_id, task, service_id, spare_part_id, quantity, service_price, spare_part_price, created_at
            FROM repair_lines
            WHERE repair_order_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(repair_order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }
}
