use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Appointment, AppointmentStatus, Payment, PaymentMethod, PaymentStatus, PaymentType, Receipt,
    ReceiptItem, ReceiptItemType, ReceiveType, ReceptionForm, RepairLine, RepairOrder,
    RepairOrderStatus,
};
use crate::services::{ReconciliationResult, SettlementOutcome};

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: ErrorResponse) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<ValidationErrorDetail>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Validation error detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// Maps a service error to its HTTP response.
pub fn error_reply(error: AppError) -> (StatusCode, Json<ApiResponse<()>>) {
    let status = match &error {
        AppError::Validation(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AppError::SignatureInvalid => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) | AppError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
        AppError::IllegalTransition { .. } | AppError::OrderLocked => StatusCode::CONFLICT,
        AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "request failed");
        ErrorResponse::new(error.code(), "An internal error occurred")
    } else {
        ErrorResponse::new(error.code(), error.to_string())
    };

    (status, Json(ApiResponse::<()>::error(body)))
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub services: ServiceHealth,
}

/// Service health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub database: bool,
}

/// Appointment response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub schedule_time: DateTime<Utc>,
    pub note: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            customer_id: appointment.customer_id,
            vehicle_id: appointment.vehicle_id,
            schedule_time: appointment.schedule_time,
            note: appointment.note,
            status: appointment.status,
            created_at: appointment.created_at,
        }
    }
}

/// Reception form response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionFormResponse {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub vehicle_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub error_description: String,
    pub receive_type: ReceiveType,
    pub created_at: DateTime<Utc>,
}

impl From<ReceptionForm> for ReceptionFormResponse {
    fn from(form: ReceptionForm) -> Self {
        Self {
            id: form.id,
            employee_id: form.employee_id,
            vehicle_id: form.vehicle_id,
            appointment_id: form.appointment_id,
            error_description: form.error_description,
            receive_type: form.receive_type,
            created_at: form.created_at,
        }
    }
}

/// Repair order response DTO with its quote lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOrderResponse {
    pub id: Uuid,
    pub reception_form_id: Uuid,
    pub vehicle_id: Uuid,
    pub employee_id: Uuid,
    pub status: RepairOrderStatus,
    pub lines: Vec<RepairLineResponse>,
    pub created_at: DateTime<Utc>,
}

impl RepairOrderResponse {
    pub fn from_parts(order: RepairOrder, lines: Vec<RepairLine>) -> Self {
        Self {
            id: order.id,
            reception_form_id: order.reception_form_id,
            vehicle_id: order.vehicle_id,
            employee_id: order.employee_id,
            status: order.status,
            lines: lines.into_iter().map(RepairLineResponse::from).collect(),
            created_at: order.created_at,
        }
    }
}

impl From<RepairOrder> for RepairOrderResponse {
    fn from(order: RepairOrder) -> Self {
        Self::from_parts(order, Vec::new())
    }
}

/// Repair line response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairLineResponse {
    pub id: Uuid,
    pub task: Option<String>,
    pub service_id: Option<Uuid>,
    pub spare_part_id: Option<Uuid>,
    pub quantity: i32,
    pub service_price: Option<Decimal>,
    pub spare_part_price: Option<Decimal>,
}

impl From<RepairLine> for RepairLineResponse {
    fn from(line: RepairLine) -> Self {
        Self {
            id: line.id,
            task: line.task,
            service_id: line.service_id,
            spare_part_id: line.spare_part_id,
            quantity: line.quantity,
            service_price: line.service_price,
            spare_part_price: line.spare_part_price,
        }
    }
}

/// Order totals response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTotalsResponse {
    pub subtotal: Decimal,
    pub vat_rate: Decimal,
    pub total_with_vat: Decimal,
}

/// Checkout response DTO with the gateway redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub payment_id: Uuid,
    pub txn_ref: String,
    pub amount: Decimal,
    pub redirect_url: String,
}

/// Payment response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub vat_rate: Decimal,
    pub txn_ref: String,
    pub vnp_transaction_no: Option<String>,
    pub status: PaymentStatus,
    pub receipt_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            payment_type: payment.payment_type,
            amount: payment.amount,
            vat_rate: payment.vat_rate,
            txn_ref: payment.txn_ref,
            vnp_transaction_no: payment.vnp_transaction_no,
            status: payment.status,
            receipt_id: payment.receipt_id,
            created_at: payment.created_at,
            settled_at: payment.settled_at,
        }
    }
}

/// Receipt response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub receipt_type: PaymentType,
    pub subtotal: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_paid: Decimal,
    pub payment_method: PaymentMethod,
    pub items: Vec<ReceiptItemResponse>,
    pub paid_at: DateTime<Utc>,
}

impl ReceiptResponse {
    pub fn from_parts(receipt: Receipt, items: Vec<ReceiptItem>) -> Self {
        Self {
            id: receipt.id,
            payment_id: receipt.payment_id,
            receipt_type: receipt.receipt_type,
            subtotal: receipt.subtotal,
            vat_rate: receipt.vat_rate,
            vat_amount: receipt.vat_amount,
            total_paid: receipt.total_paid,
            payment_method: receipt.payment_method,
            items: items.into_iter().map(ReceiptItemResponse::from).collect(),
            paid_at: receipt.paid_at,
        }
    }
}

/// Receipt item response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptItemResponse {
    pub item_type: ReceiptItemType,
    pub service_id: Option<Uuid>,
    pub spare_part_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl From<ReceiptItem> for ReceiptItemResponse {
    fn from(item: ReceiptItem) -> Self {
        Self {
            item_type: item.item_type,
            service_id: item.service_id,
            spare_part_id: item.spare_part_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
        }
    }
}

/// Result of a gateway return callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub txn_ref: String,
    pub payment_status: PaymentStatus,
    pub replay: bool,
    pub receipt: Option<ReceiptResponse>,
}

impl From<ReconciliationResult> for CallbackResponse {
    fn from(result: ReconciliationResult) -> Self {
        let replay = result.is_replay();
        match result {
            ReconciliationResult::Settled(outcome)
            | ReconciliationResult::AlreadySettled(outcome) => {
                let SettlementOutcome { payment, receipt, items } = outcome;
                Self {
                    txn_ref: payment.txn_ref,
                    payment_status: payment.status,
                    replay,
                    receipt: Some(ReceiptResponse::from_parts(receipt, items)),
                }
            }
            ReconciliationResult::Failed(payment)
            | ReconciliationResult::AlreadyFailed(payment) => Self {
                txn_ref: payment.txn_ref,
                payment_status: payment.status,
                replay,
                receipt: None,
            },
        }
    }
}
