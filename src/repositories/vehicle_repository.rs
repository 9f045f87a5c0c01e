use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Vehicle, VehicleStatus};

/// Repository for Vehicle records.
pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, vehicle: &Vehicle) -> Result<Vehicle> {
        let row = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, license_plate, vehicle_type, customer_id, status, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, license_plate, vehicle_type, customer_id, status, active, created_at
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.vehicle_type)
        .bind(vehicle.customer_id)
        .bind(vehicle.status)
        .bind(vehicle.active)
        .bind(vehicle.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>> {
        let row = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, license_plate, vehicle_type, customer_id, status, active, created_at
            FROM vehicles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_by_plate(&self, license_plate: &str) -> Result<Option<Vehicle>> {
        let row = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, license_plate, vehicle_type, customer_id, status, active, created_at
            FROM vehicles
            WHERE license_plate = $1
            "#,
        )
        .bind(license_plate)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn update_status(&self, id: Uuid, status: VehicleStatus) -> Result<Option<Vehicle>> {
        let row = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET status = $2
            WHERE id = $1
            RETURNING id, license_plate, vehicle_type, customer_id, status, active, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }
}
