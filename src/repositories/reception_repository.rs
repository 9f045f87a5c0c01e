use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::ReceptionForm;

/// Repository for ReceptionForm records.
pub struct ReceptionRepository {
    pool: PgPool,
}

impl ReceptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReceptionForm>> {
        let row = sqlx::query_as::<_, ReceptionForm>(
            r#"
            SELECT id, employee_id, vehicle_id, appointment_id, error_description, receive_type, active, created_at
            FROM reception_forms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Soft-deactivates a form. Reception forms are otherwise immutable.
    pub async fn deactivate(&self, id: Uuid) -> Result<Option<ReceptionForm>> {
        let row = sqlx::query_as::<_, ReceptionForm>(
            r#"
            UPDATE reception_forms
            SET active = FALSE
            WHERE id = $1
            RETURNING id, employee_id, vehicle_id, appointment_id, error_description, receive_type, active, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }
}
