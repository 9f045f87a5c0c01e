use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::api::requests::{
    AddCartItemRequest, BookAppointmentRequest, CartCheckoutRequest, CreateQuoteRequest,
    ReceiveAppointmentRequest, ReceiveWalkInRequest, RepairCheckoutRequest,
};
use crate::api::responses::{
    error_reply, ApiResponse, AppointmentResponse, CallbackResponse, CheckoutResponse,
    ErrorResponse, HealthResponse, OrderTotalsResponse, PaymentResponse, ReceiptResponse,
    ReceptionFormResponse, RepairOrderResponse, ServiceHealth, ValidationErrorDetail,
};
use crate::error::AppError;
use crate::ledger;
use crate::models::CartEntry;
use crate::repositories::{CatalogRepository, PaymentRepository, ReceptionRepository};
use crate::services;

use super::routes::AppState;

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();

    let response = HealthResponse {
        status: if db_healthy { "healthy".to_string() } else { "degraded".to_string() },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        services: ServiceHealth { database: db_healthy },
    };

    Json(ApiResponse::success(response))
}

/// Readiness check endpoint.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();

    if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

// ============================================================================
// Appointment Handlers
// ============================================================================

/// Book a drop-off appointment.
pub async fn book_appointment(
    State(state): State<AppState>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AppointmentResponse>>), HandlerError> {
    validate(request.validate())?;

    let appointment = state
        .booking
        .book(services::BookAppointmentRequest {
            customer_id: request.customer_id,
            license_plate: request.license_plate,
            vehicle_type: request.vehicle_type,
            schedule_time: request.schedule_time,
            note: request.note,
        })
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AppointmentResponse::from(appointment))),
    ))
}

/// Confirm a booked appointment.
pub async fn confirm_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AppointmentResponse>>, HandlerError> {
    let appointment = state.booking.confirm(id).await.map_err(error_reply)?;
    Ok(Json(ApiResponse::success(AppointmentResponse::from(appointment))))
}

/// Cancel an appointment.
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AppointmentResponse>>, HandlerError> {
    let appointment = state.booking.cancel(id).await.map_err(error_reply)?;
    Ok(Json(ApiResponse::success(AppointmentResponse::from(appointment))))
}

// ============================================================================
// Reception Handlers
// ============================================================================

/// Receive a vehicle against its appointment.
pub async fn receive_from_appointment(
    State(state): State<AppState>,
    Json(request): Json<ReceiveAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReceptionFormResponse>>), HandlerError> {
    validate(request.validate())?;

    let form = state
        .reception
        .receive_from_appointment(services::AppointmentReceptionRequest {
            employee_id: request.employee_id,
            appointment_id: request.appointment_id,
            error_description: request.error_description,
        })
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ReceptionFormResponse::from(form))),
    ))
}

/// Receive an unannounced walk-in vehicle.
pub async fn receive_walk_in(
    State(state): State<AppState>,
    Json(request): Json<ReceiveWalkInRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReceptionFormResponse>>), HandlerError> {
    validate(request.validate())?;

    let form = state
        .reception
        .receive_walk_in(services::WalkInReceptionRequest {
            employee_id: request.employee_id,
            customer_name: request.customer_name,
            customer_phone: request.customer_phone,
            license_plate: request.license_plate,
            vehicle_type: request.vehicle_type,
            error_description: request.error_description,
        })
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ReceptionFormResponse::from(form))),
    ))
}

/// Soft-deactivate a reception form, e.g. when a drop-off was recorded
/// in error. Deactivated forms can no longer be quoted against.
pub async fn deactivate_reception(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReceptionFormResponse>>, HandlerError> {
    let repo = ReceptionRepository::new(state.pool.clone());
    let form = repo
        .deactivate(id)
        .await
        .map_err(error_reply)?
        .ok_or_else(|| {
            error_reply(AppError::NotFound(format!("Reception form '{id}' not found")))
        })?;

    Ok(Json(ApiResponse::success(ReceptionFormResponse::from(form))))
}

// ============================================================================
// Repair Order Handlers
// ============================================================================

/// Create a repair quote for a reception form.
pub async fn create_quote(
    State(state): State<AppState>,
    Json(request): Json<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RepairOrderResponse>>), HandlerError> {
    validate(request.validate())?;

    let lines = request
        .lines
        .into_iter()
        .map(|line| services::QuoteLineRequest {
            task: line.task,
            service_id: line.service_id,
            spare_part_id: line.spare_part_id,
            quantity: line.quantity,
        })
        .collect();

    let (order, lines) = state
        .repair
        .create_quote(services::CreateQuoteRequest {
            reception_form_id: request.reception_form_id,
            employee_id: request.employee_id,
            lines,
        })
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RepairOrderResponse::from_parts(order, lines))),
    ))
}

/// Get a repair order with its lines.
pub async fn get_repair_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RepairOrderResponse>>, HandlerError> {
    let order = state.repair.find_by_id(id).await.map_err(error_reply)?;
    let lines = state.repair.find_lines(id).await.map_err(error_reply)?;
    Ok(Json(ApiResponse::success(RepairOrderResponse::from_parts(order, lines))))
}

/// Get repair order totals at the configured VAT rate.
pub async fn get_order_totals(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderTotalsResponse>>, HandlerError> {
    let totals = state
        .repair
        .order_totals(id, state.vat_rate)
        .await
        .map_err(error_reply)?;

    Ok(Json(ApiResponse::success(OrderTotalsResponse {
        subtotal: totals.subtotal,
        vat_rate: state.vat_rate,
        total_with_vat: totals.total_with_vat,
    })))
}

/// Approve a quoted repair order.
pub async fn approve_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RepairOrderResponse>>, HandlerError> {
    let order = state.repair.approve(id).await.map_err(error_reply)?;
    Ok(Json(ApiResponse::success(RepairOrderResponse::from(order))))
}

/// Start repairing an approved order.
pub async fn start_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RepairOrderResponse>>, HandlerError> {
    let order = state.repair.start(id).await.map_err(error_reply)?;
    Ok(Json(ApiResponse::success(RepairOrderResponse::from(order))))
}

/// Mark an order's repair work finished.
pub async fn complete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RepairOrderResponse>>, HandlerError> {
    let order = state.repair.complete(id).await.map_err(error_reply)?;
    Ok(Json(ApiResponse::success(RepairOrderResponse::from(order))))
}

// ============================================================================
// Cart Handlers
// ============================================================================

/// Session cart contents with totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub session: String,
    pub entries: Vec<CartEntry>,
    pub subtotal: Decimal,
    pub total_with_vat: Decimal,
}

/// Add a spare part to the session cart at its current catalog price.
pub async fn add_cart_item(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(request): Json<AddCartItemRequest>,
) -> Result<Json<ApiResponse<CartResponse>>, HandlerError> {
    validate(request.validate())?;

    let catalog = CatalogRepository::new(state.pool.clone());
    let part = catalog
        .find_spare_part(request.spare_part_id)
        .await
        .map_err(error_reply)?
        .ok_or_else(|| {
            error_reply(AppError::NotFound(format!(
                "Spare part '{}' not found",
                request.spare_part_id
            )))
        })?;

    state
        .cart
        .add(
            &session,
            CartEntry {
                spare_part_id: part.id,
                quantity: request.quantity,
                unit_price: part.unit_price,
            },
        )
        .await
        .map_err(error_reply)?;

    cart_response(&state, session).await
}

/// Get the session cart.
pub async fn get_cart(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<ApiResponse<CartResponse>>, HandlerError> {
    cart_response(&state, session).await
}

async fn cart_response(
    state: &AppState,
    session: String,
) -> Result<Json<ApiResponse<CartResponse>>, HandlerError> {
    let entries = state.cart.snapshot(&session).await.map_err(error_reply)?;
    let subtotal = ledger::cart_subtotal(&entries);

    Ok(Json(ApiResponse::success(CartResponse {
        session,
        subtotal,
        total_with_vat: ledger::apply_vat(subtotal, state.vat_rate),
        entries,
    })))
}

// ============================================================================
// Checkout and Settlement Handlers
// ============================================================================

/// Start gateway checkout for the session cart.
pub async fn checkout_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CartCheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResponse>>), HandlerError> {
    validate(request.validate())?;

    let redirect = state
        .checkout
        .create_cart_payment(&request.session, &client_ip(&headers))
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CheckoutResponse {
            payment_id: redirect.payment.id,
            txn_ref: redirect.payment.txn_ref,
            amount: redirect.payment.amount,
            redirect_url: redirect.redirect_url,
        })),
    ))
}

/// Settle the session cart as a cash sale at the counter.
pub async fn checkout_cart_cash(
    State(state): State<AppState>,
    Json(request): Json<CartCheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReceiptResponse>>), HandlerError> {
    validate(request.validate())?;

    let (receipt, items) = state
        .checkout
        .settle_cart_cash(&request.session)
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ReceiptResponse::from_parts(receipt, items))),
    ))
}

/// Start gateway checkout for a completed repair order.
pub async fn checkout_repair(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RepairCheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResponse>>), HandlerError> {
    let redirect = state
        .checkout
        .create_repair_payment(request.repair_order_id, &client_ip(&headers))
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CheckoutResponse {
            payment_id: redirect.payment.id,
            txn_ref: redirect.payment.txn_ref,
            amount: redirect.payment.amount,
            redirect_url: redirect.redirect_url,
        })),
    ))
}

/// Gateway return callback. The full query string is verified and
/// reconciled; an invalid signature never reaches the database.
pub async fn vnpay_return(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<ApiResponse<CallbackResponse>>, HandlerError> {
    let result = state.settlement.reconcile(&params).await.map_err(|e| {
        if e.is_untrusted_callback() {
            tracing::warn!(error = %e, "rejected untrusted gateway callback");
        }
        error_reply(e)
    })?;
    Ok(Json(ApiResponse::success(CallbackResponse::from(result))))
}

/// Query parameters for the stale payment listing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StalePaymentsQuery {
    pub older_than_minutes: Option<i64>,
}

/// List payments stuck in PENDING, for manual reconciliation against
/// the gateway's merchant portal.
pub async fn list_stale_payments(
    State(state): State<AppState>,
    Query(query): Query<StalePaymentsQuery>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, HandlerError> {
    let minutes = query.older_than_minutes.unwrap_or(30).max(1);
    let cutoff = chrono::Utc::now() - chrono::Duration::minutes(minutes);

    let stale = state
        .settlement
        .find_stale_pending(cutoff)
        .await
        .map_err(error_reply)?;

    Ok(Json(ApiResponse::success(
        stale.into_iter().map(PaymentResponse::from).collect(),
    )))
}

/// Look up a payment by its gateway transaction reference.
pub async fn get_payment(
    State(state): State<AppState>,
    Path(txn_ref): Path<String>,
) -> Result<Json<ApiResponse<PaymentResponse>>, HandlerError> {
    let repo = PaymentRepository::new(state.pool.clone());
    let payment = repo
        .find_by_txn_ref(&txn_ref)
        .await
        .map_err(error_reply)?
        .ok_or_else(|| error_reply(AppError::PaymentNotFound(txn_ref.clone())))?;

    Ok(Json(ApiResponse::success(PaymentResponse::from(payment))))
}

fn validate(
    result: Result<(), Vec<crate::api::requests::ValidationError>>,
) -> Result<(), HandlerError> {
    if let Err(errors) = result {
        let details: Vec<ValidationErrorDetail> = errors
            .iter()
            .map(|e| ValidationErrorDetail {
                field: e.field.clone(),
                message: e.message.clone(),
            })
            .collect();

        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(
                ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                    .with_details(details),
            )),
        ));
    }
    Ok(())
}

/// Client address for the gateway request, preferring the proxy header.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}
