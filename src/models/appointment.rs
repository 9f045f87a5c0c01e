use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Status of a booked appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Booked,
    Confirmed,
    Cancelled,
    /// Consumed by a reception form at drop-off.
    Completed,
}

impl AppointmentStatus {
    /// Terminal appointments are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed
        )
    }
}

/// A customer booking for a vehicle drop-off slot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub schedule_time: DateTime<Utc>,
    pub note: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(
        customer_id: Uuid,
        vehicle_id: Uuid,
        schedule_time: DateTime<Utc>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            vehicle_id,
            schedule_time,
            note,
            status: AppointmentStatus::Booked,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_appointment_is_booked() {
        let a = Appointment::new(Uuid::new_v4(), Uuid::new_v4(), Utc::now(), None);
        assert_eq!(a.status, AppointmentStatus::Booked);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(!AppointmentStatus::Booked.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
    }
}
