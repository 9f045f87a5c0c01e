use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Customer;

/// Repository for Customer records.
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, customer: &Customer) -> Result<Customer> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, full_name, phone, address, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, full_name, phone, address, active, created_at
            "#,
        )
        .bind(customer.id)
        .bind(&customer.full_name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.active)
        .bind(customer.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, full_name, phone, address, active, created_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Finds a customer by phone number, used to deduplicate walk-ins.
    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, full_name, phone, address, active, created_at
            FROM customers
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }
}
