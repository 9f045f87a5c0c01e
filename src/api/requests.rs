use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to book a drop-off appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub customer_id: Uuid,
    pub license_plate: String,
    pub vehicle_type: String,
    pub schedule_time: DateTime<Utc>,
    pub note: Option<String>,
}

impl BookAppointmentRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.license_plate.trim().is_empty() {
            errors.push(ValidationError { field: "license_plate".to_string(), message: "license_plate cannot be empty".to_string() });
        }
        if self.vehicle_type.trim().is_empty() {
            errors.push(ValidationError { field: "vehicle_type".to_string(), message: "vehicle_type cannot be empty".to_string() });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Request to receive a vehicle against its appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveAppointmentRequest {
    pub employee_id: Uuid,
    pub appointment_id: Uuid,
    pub error_description: String,
}

impl ReceiveAppointmentRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.error_description.trim().is_empty() {
            errors.push(ValidationError { field: "error_description".to_string(), message: "error_description cannot be empty".to_string() });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Request to receive a walk-in vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveWalkInRequest {
    pub employee_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub license_plate: String,
    pub vehicle_type: String,
    pub error_description: String,
}

impl ReceiveWalkInRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.customer_name.trim().is_empty() {
            errors.push(ValidationError { field: "customer_name".to_string(), message: "customer_name cannot be empty".to_string() });
        }
        if self.customer_phone.trim().is_empty() {
            errors.push(ValidationError { field: "customer_phone".to_string(), message: "customer_phone cannot be empty".to_string() });
        }
        if self.license_plate.trim().is_empty() {
            errors.push(ValidationError { field: "license_plate".to_string(), message: "license_plate cannot be empty".to_string() });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// One line of a quote request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteLineRequestBody {
    pub task: Option<String>,
    pub service_id: Option<Uuid>,
    pub spare_part_id: Option<Uuid>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// Request to create a repair quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuoteRequest {
    pub reception_form_id: Uuid,
    pub employee_id: Uuid,
    pub lines: Vec<QuoteLineRequestBody>,
}

impl CreateQuoteRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.lines.is_empty() {
            errors.push(ValidationError { field: "lines".to_string(), message: "a quote needs at least one line".to_string() });
        }
        for (i, line) in self.lines.iter().enumerate() {
            if line.quantity < 1 {
                errors.push(ValidationError { field: format!("lines[{i}].quantity"), message: "quantity must be >= 1".to_string() });
            }
            if line.service_id.is_none() && line.spare_part_id.is_none() {
                errors.push(ValidationError { field: format!("lines[{i}]"), message: "line needs a service or a spare part".to_string() });
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Request to add a spare part to the session cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub spare_part_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

impl AddCartItemRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.quantity < 1 {
            errors.push(ValidationError { field: "quantity".to_string(), message: "quantity must be >= 1".to_string() });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Request to start checkout for the session cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCheckoutRequest {
    pub session: String,
}

impl CartCheckoutRequest {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.session.trim().is_empty() {
            errors.push(ValidationError { field: "session".to_string(), message: "session cannot be empty".to_string() });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Request to start checkout for a repair order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairCheckoutRequest {
    pub repair_order_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_appointment_request_validation() {
        let valid = BookAppointmentRequest {
            customer_id: Uuid::new_v4(),
            license_plate: "51H-123.45".to_string(),
            vehicle_type: "motorbike".to_string(),
            schedule_time: Utc::now(),
            note: None,
        };
        assert!(valid.validate().is_ok());

        let invalid = BookAppointmentRequest {
            license_plate: "  ".to_string(),
            ..valid
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_quote_request_rejects_empty_lines() {
        let request = CreateQuoteRequest {
            reception_form_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            lines: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_quote_line_needs_service_or_part() {
        let request = CreateQuoteRequest {
            reception_form_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            lines: vec![QuoteLineRequestBody {
                task: Some("diagnose".to_string()),
                service_id: None,
                spare_part_id: None,
                quantity: 1,
            }],
        };
        assert!(request.validate().is_err());
    }
}
