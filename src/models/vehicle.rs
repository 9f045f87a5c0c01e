use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Position of a vehicle in the repair lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vehicle_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    /// Booked an appointment but not yet dropped off.
    PendingAppointment,
    /// Physically received at the garage.
    Received,
    /// Repair quote issued, waiting for the customer to approve.
    WaitingApproval,
    /// Repair work in progress.
    Repairing,
    /// Repair finished, waiting for settlement.
    Done,
    /// Settled and handed back to the customer.
    Delivered,
    Cancelled,
}

impl VehicleStatus {
    /// Returns true once the vehicle has left the active lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VehicleStatus::Delivered | VehicleStatus::Cancelled)
    }
}

/// A customer vehicle, identified by its license plate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub license_plate: String,
    pub vehicle_type: String,
    pub customer_id: Uuid,
    pub status: VehicleStatus,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Creates a vehicle first seen through an appointment booking.
    pub fn booked(license_plate: String, vehicle_type: String, customer_id: Uuid) -> Self {
        Self::new(
            license_plate,
            vehicle_type,
            customer_id,
            VehicleStatus::PendingAppointment,
        )
    }

    /// Creates a vehicle first seen at a walk-in drop-off.
    pub fn walk_in(license_plate: String, vehicle_type: String, customer_id: Uuid) -> Self {
        Self::new(
            license_plate,
            vehicle_type,
            customer_id,
            VehicleStatus::Received,
        )
    }

    fn new(
        license_plate: String,
        vehicle_type: String,
        customer_id: Uuid,
        status: VehicleStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            license_plate,
            vehicle_type,
            customer_id,
            status,
            active: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(VehicleStatus::Delivered.is_terminal());
        assert!(VehicleStatus::Cancelled.is_terminal());
        assert!(!VehicleStatus::Repairing.is_terminal());
        assert!(!VehicleStatus::PendingAppointment.is_terminal());
    }

    #[test]
    fn test_booked_vehicle_starts_pending() {
        let v = Vehicle::booked("51A-123.45".to_string(), "sedan".to_string(), Uuid::new_v4());
        assert_eq!(v.status, VehicleStatus::PendingAppointment);
        assert!(v.active);
    }

    #[test]
    fn test_walk_in_vehicle_starts_received() {
        let v = Vehicle::walk_in("51A-123.45".to_string(), "sedan".to_string(), Uuid::new_v4());
        assert_eq!(v.status, VehicleStatus::Received);
    }
}
