use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Status of a repair order from quote to payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "repair_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairOrderStatus {
    /// Quote written, waiting for customer approval.
    Quoted,
    Approved,
    Repairing,
    /// Work finished, waiting for settlement.
    Done,
    /// Settled. The order is immutable from here on.
    Paid,
}

impl RepairOrderStatus {
    /// A paid order rejects any further mutation.
    pub fn is_locked(&self) -> bool {
        matches!(self, RepairOrderStatus::Paid)
    }

    /// True when the order can be settled by a payment.
    pub fn is_settleable(&self) -> bool {
        matches!(self, RepairOrderStatus::Done)
    }
}

/// A repair quote/work order for one reception form.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RepairOrder {
    pub id: Uuid,
    pub reception_form_id: Uuid,
    pub vehicle_id: Uuid,
    pub employee_id: Uuid,
    pub status: RepairOrderStatus,
    pub created_at: DateTime<Utc>,
}

impl RepairOrder {
    pub fn new(reception_form_id: Uuid, vehicle_id: Uuid, employee_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            reception_form_id,
            vehicle_id,
            employee_id,
            status: RepairOrderStatus::Quoted,
            created_at: Utc::now(),
        }
    }
}

/// One line of a repair order. Prices are snapshots taken from the
/// catalog at creation time; later catalog changes never touch them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RepairLine {
    pub id: Uuid,
    pub repair_order_id: Uuid,
    pub task: Option<String>,
    pub service_id: Option<Uuid>,
    pub spare_part_id: Option<Uuid>,
    pub quantity: i32,
    /// Service price at line creation.
    pub service_price: Option<Decimal>,
    /// Spare part unit price at line creation.
    pub spare_part_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl RepairLine {
    pub fn new(
        repair_order_id: Uuid,
        task: Option<String>,
        service_id: Option<Uuid>,
        spare_part_id: Option<Uuid>,
        quantity: i32,
        service_price: Option<Decimal>,
        spare_part_price: Option<Decimal>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            repair_order_id,
            task,
            service_id,
            spare_part_id,
            quantity,
            service_price,
            spare_part_price,
            created_at: Utc::now(),
        }
    }

    pub fn has_service(&self) -> bool {
        self.service_price.map(|p| p > Decimal::ZERO).unwrap_or(false)
    }

    pub fn has_spare_part(&self) -> bool {
        self.spare_part_price
            .map(|p| p > Decimal::ZERO)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_order_is_quoted() {
        let order = RepairOrder::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(order.status, RepairOrderStatus::Quoted);
        assert!(!order.status.is_locked());
    }

    #[test]
    fn test_paid_is_locked() {
        assert!(RepairOrderStatus::Paid.is_locked());
        assert!(!RepairOrderStatus::Done.is_locked());
    }

    #[test]
    fn test_only_done_is_settleable() {
        assert!(RepairOrderStatus::Done.is_settleable());
        assert!(!RepairOrderStatus::Quoted.is_settleable());
        assert!(!RepairOrderStatus::Repairing.is_settleable());
        assert!(!RepairOrderStatus::Paid.is_settleable());
    }

    #[test]
    fn test_line_component_predicates() {
        let line = RepairLine::new(
            Uuid::new_v4(),
            Some("replace brake pads".to_string()),
            Some(Uuid::new_v4()),
            Some(Uuid::new_v4()),
            2,
            Some(dec!(200_000)),
            Some(dec!(150_000)),
        );
        assert!(line.has_service());
        assert!(line.has_spare_part());

        let labor_only = RepairLine::new(
            Uuid::new_v4(),
            None,
            Some(Uuid::new_v4()),
            None,
            1,
            Some(dec!(80_000)),
            None,
        );
        assert!(labor_only.has_service());
        assert!(!labor_only.has_spare_part());
    }
}
