use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Appointment, AppointmentStatus};

/// Repository for Appointment records.
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, appointment: &Appointment) -> Result<Appointment> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (id, customer_id, vehicle_id, schedule_time, note, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, customer_id, vehicle_id, schedule_time, note, status, created_at
            "#,
        )
        .bind(appointment.id)
        .bind(appointment.customer_id)
        .bind(appointment.vehicle_id)
        .bind(appointment.schedule_time)
        .bind(&appointment.note)
        .bind(appointment.status)
        .bind(appointment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, customer_id, vehicle_id, schedule_time, note, status, created_at
            FROM appointments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>> {
        let row = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = $2
            WHERE id = $1
            RETURNING id, customer_id, vehicle_id, schedule_time, note, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Counts non-cancelled bookings scheduled for a calendar day,
    /// used to enforce the daily slot capacity.
    pub async fn count_for_day(&self, day: NaiveDate) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM appointments
            WHERE schedule_time::date = $1
              AND status <> 'CANCELLED'
            "#,
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.0)
    }
}
