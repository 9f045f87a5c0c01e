use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How the vehicle arrived at the garage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "receive_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiveType {
    /// Drop-off fulfilling a booked appointment.
    FromAppointment,
    /// Unannounced drop-off.
    WalkIn,
}

/// Record of a physical vehicle drop-off. Created exactly once per
/// drop-off and immutable afterwards apart from soft deactivation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReceptionForm {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub vehicle_id: Uuid,
    /// The appointment this drop-off fulfils, if any.
    pub appointment_id: Option<Uuid>,
    pub error_description: String,
    pub receive_type: ReceiveType,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl ReceptionForm {
    pub fn from_appointment(
        employee_id: Uuid,
        vehicle_id: Uuid,
        appointment_id: Uuid,
        error_description: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            vehicle_id,
            appointment_id: Some(appointment_id),
            error_description,
            receive_type: ReceiveType::FromAppointment,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn walk_in(employee_id: Uuid, vehicle_id: Uuid, error_description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            vehicle_id,
            appointment_id: None,
            error_description,
            receive_type: ReceiveType::WalkIn,
            active: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_appointment_links_appointment() {
        let appointment_id = Uuid::new_v4();
        let form = ReceptionForm::from_appointment(
            Uuid::new_v4(),
            Uuid::new_v4(),
            appointment_id,
            "engine noise".to_string(),
        );
        assert_eq!(form.receive_type, ReceiveType::FromAppointment);
        assert_eq!(form.appointment_id, Some(appointment_id));
    }

    #[test]
    fn test_walk_in_has_no_appointment() {
        let form = ReceptionForm::walk_in(Uuid::new_v4(), Uuid::new_v4(), "flat tire".to_string());
        assert_eq!(form.receive_type, ReceiveType::WalkIn);
        assert!(form.appointment_id.is_none());
    }
}
