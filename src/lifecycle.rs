//! Transition tables for the vehicle repair lifecycle.
//!
//! These functions are the only code path allowed to change entity
//! statuses. Services apply the returned status inside their own
//! database transactions; nothing here performs I/O.

use crate::error::{AppError, Result};
use crate::models::{AppointmentStatus, RepairOrderStatus, VehicleStatus};

/// Events that move an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentEvent {
    Confirm,
    Cancel,
    /// Fired when a reception form consumes the appointment.
    ConsumedByReception,
}

impl AppointmentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppointmentEvent::Confirm => "confirm",
            AppointmentEvent::Cancel => "cancel",
            AppointmentEvent::ConsumedByReception => "consumed_by_reception",
        }
    }
}

/// Events that move a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleEvent {
    Receive,
    Quote,
    StartRepair,
    FinishRepair,
    Settle,
}

impl VehicleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            VehicleEvent::Receive => "receive",
            VehicleEvent::Quote => "quote",
            VehicleEvent::StartRepair => "start_repair",
            VehicleEvent::FinishRepair => "finish_repair",
            VehicleEvent::Settle => "settle",
        }
    }
}

/// Events that move a repair order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOrderEvent {
    Approve,
    Start,
    Complete,
    Settle,
}

impl RepairOrderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RepairOrderEvent::Approve => "approve",
            RepairOrderEvent::Start => "start",
            RepairOrderEvent::Complete => "complete",
            RepairOrderEvent::Settle => "settle",
        }
    }
}

/// Applies an event to an appointment status.
pub fn appointment_transition(
    current: AppointmentStatus,
    event: AppointmentEvent,
) -> Result<AppointmentStatus> {
    use AppointmentEvent::*;
    use AppointmentStatus::*;

    match (current, event) {
        (Booked, Confirm) => Ok(Confirmed),
        (Booked | Confirmed, Cancel) => Ok(Cancelled),
        (Booked | Confirmed, ConsumedByReception) => Ok(Completed),
        _ => Err(illegal("appointment", format!("{current:?}"), event.name())),
    }
}

/// Applies an event to a vehicle status.
pub fn vehicle_transition(current: VehicleStatus, event: VehicleEvent) -> Result<VehicleStatus> {
    use VehicleEvent::*;
    use VehicleStatus::*;

    match (current, event) {
        (PendingAppointment, Receive) => Ok(Received),
        (Received, Quote) => Ok(WaitingApproval),
        (WaitingApproval, StartRepair) => Ok(Repairing),
        (Repairing, FinishRepair) => Ok(Done),
        (Done, Settle) => Ok(Delivered),
        _ => Err(illegal("vehicle", format!("{current:?}"), event.name())),
    }
}

/// Applies an event to a repair order status. Paid orders are locked
/// and reject every event.
pub fn repair_order_transition(
    current: RepairOrderStatus,
    event: RepairOrderEvent,
) -> Result<RepairOrderStatus> {
    use RepairOrderEvent::*;
    use RepairOrderStatus::*;

    if current.is_locked() {
        return Err(AppError::OrderLocked);
    }

    match (current, event) {
        (Quoted, Approve) => Ok(Approved),
        (Approved, Start) => Ok(Repairing),
        (Repairing, Complete) => Ok(Done),
        (Done, Settle) => Ok(Paid),
        _ => Err(illegal("repair_order", format!("{current:?}"), event.name())),
    }
}

/// Vehicle status driven by a repair order status change.
fn vehicle_status_for_order(order_status: RepairOrderStatus) -> Option<VehicleStatus> {
    match order_status {
        RepairOrderStatus::Quoted => Some(VehicleStatus::WaitingApproval),
        RepairOrderStatus::Repairing => Some(VehicleStatus::Repairing),
        RepairOrderStatus::Done => Some(VehicleStatus::Done),
        RepairOrderStatus::Paid => Some(VehicleStatus::Delivered),
        RepairOrderStatus::Approved => None,
    }
}

/// Computes the cascade target for a vehicle when its repair order
/// changes status. Returns `None` when no change is required, so a
/// repeated cascade is an idempotent no-op.
pub fn vehicle_cascade(
    vehicle_status: VehicleStatus,
    order_status: RepairOrderStatus,
) -> Option<VehicleStatus> {
    match vehicle_status_for_order(order_status) {
        Some(target) if target != vehicle_status => Some(target),
        _ => None,
    }
}

fn illegal(entity: &'static str, from: String, event: &'static str) -> AppError {
    AppError::IllegalTransition { entity, from, event }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_happy_path() {
        let confirmed =
            appointment_transition(AppointmentStatus::Booked, AppointmentEvent::Confirm).unwrap();
        assert_eq!(confirmed, AppointmentStatus::Confirmed);

        let completed =
            appointment_transition(confirmed, AppointmentEvent::ConsumedByReception).unwrap();
        assert_eq!(completed, AppointmentStatus::Completed);
    }

    #[test]
    fn test_booked_appointment_can_be_consumed_directly() {
        let completed = appointment_transition(
            AppointmentStatus::Booked,
            AppointmentEvent::ConsumedByReception,
        )
        .unwrap();
        assert_eq!(completed, AppointmentStatus::Completed);
    }

    #[test]
    fn test_terminal_appointment_rejects_all_events() {
        for terminal in [AppointmentStatus::Cancelled, AppointmentStatus::Completed] {
            for event in [
                AppointmentEvent::Confirm,
                AppointmentEvent::Cancel,
                AppointmentEvent::ConsumedByReception,
            ] {
                let result = appointment_transition(terminal, event);
                assert!(matches!(
                    result,
                    Err(AppError::IllegalTransition { entity: "appointment", .. })
                ));
            }
        }
    }

    #[test]
    fn test_vehicle_full_lifecycle() {
        let mut status = VehicleStatus::PendingAppointment;
        for event in [
            VehicleEvent::Receive,
            VehicleEvent::Quote,
            VehicleEvent::StartRepair,
            VehicleEvent::FinishRepair,
            VehicleEvent::Settle,
        ] {
            status = vehicle_transition(status, event).unwrap();
        }
        assert_eq!(status, VehicleStatus::Delivered);
    }

    #[test]
    fn test_vehicle_rejects_skipped_steps() {
        let result = vehicle_transition(VehicleStatus::Received, VehicleEvent::Settle);
        assert!(matches!(result, Err(AppError::IllegalTransition { .. })));
    }

    #[test]
    fn test_repair_order_full_lifecycle() {
        let mut status = RepairOrderStatus::Quoted;
        for event in [
            RepairOrderEvent::Approve,
            RepairOrderEvent::Start,
            RepairOrderEvent::Complete,
            RepairOrderEvent::Settle,
        ] {
            status = repair_order_transition(status, event).unwrap();
        }
        assert_eq!(status, RepairOrderStatus::Paid);
    }

    #[test]
    fn test_approve_on_done_order_is_illegal() {
        let result = repair_order_transition(RepairOrderStatus::Done, RepairOrderEvent::Approve);
        assert!(matches!(
            result,
            Err(AppError::IllegalTransition { entity: "repair_order", event: "approve", .. })
        ));
    }

    #[test]
    fn test_paid_order_is_locked() {
        for event in [
            RepairOrderEvent::Approve,
            RepairOrderEvent::Start,
            RepairOrderEvent::Complete,
            RepairOrderEvent::Settle,
        ] {
            let result = repair_order_transition(RepairOrderStatus::Paid, event);
            assert!(matches!(result, Err(AppError::OrderLocked)));
        }
    }

    #[test]
    fn test_cascade_mapping() {
        assert_eq!(
            vehicle_cascade(VehicleStatus::Received, RepairOrderStatus::Quoted),
            Some(VehicleStatus::WaitingApproval)
        );
        assert_eq!(
            vehicle_cascade(VehicleStatus::WaitingApproval, RepairOrderStatus::Repairing),
            Some(VehicleStatus::Repairing)
        );
        assert_eq!(
            vehicle_cascade(VehicleStatus::Repairing, RepairOrderStatus::Done),
            Some(VehicleStatus::Done)
        );
        assert_eq!(
            vehicle_cascade(VehicleStatus::Done, RepairOrderStatus::Paid),
            Some(VehicleStatus::Delivered)
        );
    }

    #[test]
    fn test_cascade_is_idempotent() {
        assert_eq!(
            vehicle_cascade(VehicleStatus::Repairing, RepairOrderStatus::Repairing),
            None
        );
        assert_eq!(
            vehicle_cascade(VehicleStatus::Delivered, RepairOrderStatus::Paid),
            None
        );
    }

    #[test]
    fn test_approved_order_does_not_cascade() {
        assert_eq!(
            vehicle_cascade(VehicleStatus::WaitingApproval, RepairOrderStatus::Approved),
            None
        );
    }
}
