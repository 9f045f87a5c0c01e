use axum::{
    routing::{delete, get, post},
    Router,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;

use super::handlers;
use crate::services::{
    BookingService, CartStore, CheckoutService, ReceptionService, RepairService, SettlementService,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub booking: Arc<BookingService>,
    pub reception: Arc<ReceptionService>,
    pub repair: Arc<RepairService>,
    pub checkout: Arc<CheckoutService>,
    pub settlement: Arc<SettlementService>,
    pub cart: Arc<dyn CartStore>,
    pub vat_rate: Decimal,
}

/// Creates the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check))
        // Appointment endpoints
        .route("/appointments", post(handlers::book_appointment))
        .route("/appointments/:id/confirm", post(handlers::confirm_appointment))
        .route("/appointments/:id/cancel", post(handlers::cancel_appointment))
        // Reception endpoints
        .route("/receptions/appointment", post(handlers::receive_from_appointment))
        .route("/receptions/walk-in", post(handlers::receive_walk_in))
        .route("/receptions/:id", delete(handlers::deactivate_reception))
        // Repair order endpoints
        .route("/repair-orders", post(handlers::create_quote))
        .route("/repair-orders/:id", get(handlers::get_repair_order))
        .route("/repair-orders/:id/totals", get(handlers::get_order_totals))
        .route("/repair-orders/:id/approve", post(handlers::approve_order))
        .route("/repair-orders/:id/start", post(handlers::start_order))
        .route("/repair-orders/:id/complete", post(handlers::complete_order))
        // Cart endpoints
        .route("/carts/:session/items", post(handlers::add_cart_item))
        .route("/carts/:session", get(handlers::get_cart))
        // Checkout and settlement endpoints
        .route("/checkout/cart", post(handlers::checkout_cart))
        .route("/checkout/cart/cash", post(handlers::checkout_cart_cash))
        .route("/checkout/repair", post(handlers::checkout_repair))
        .route("/payments/vnpay_return", get(handlers::vnpay_return))
        .route("/payments/stale", get(handlers::list_stale_payments))
        .route("/payments/:txn_ref", get(handlers::get_payment))
        .with_state(state)
}
