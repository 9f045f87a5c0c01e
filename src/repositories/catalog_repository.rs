use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Service, SparePart};

/// Repository for the service and spare-part catalog. Consulted only
/// when repair lines are created to take the price snapshot; never
/// during settlement.
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_service(&self, id: Uuid) -> Result<Option<Service>> {
        let row = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, name, description, price, active, created_at
            FROM services
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_spare_part(&self, id: Uuid) -> Result<Option<SparePart>> {
        let row = sqlx::query_as::<_, SparePart>(
            r#"
            SELECT id, name, unit_price, unit, supplier, inventory, active, created_at
            FROM spare_parts
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn update_service_price(&self, id: Uuid, price: Decimal) -> Result<Option<Service>> {
        let row = sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET price = $2
            WHERE id = $1
            RETURNING id, name, description, price, active, created_at
            "#,
        )
        .bind(id)
        .bind(price)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn update_spare_part_price(
        &self,
        id: Uuid,
        unit_price: Decimal,
    ) -> Result<Option<SparePart>> {
        let row = sqlx::query_as::<_, SparePart>(
            r#"
            UPDATE spare_parts
            SET unit_price = $2
            WHERE id = $1
            RETURNING id, name, unit_price, unit, supplier, inventory, active, created_at
            "#,
        )
        .bind(id)
        .bind(unit_price)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }
}
