pub mod booking_service;
pub mod cart;
pub mod checkout_service;
pub mod reception_service;
pub mod repair_service;
pub mod settlement_service;

pub use booking_service::{BookAppointmentRequest, BookingService};
pub use cart::{CartStore, InMemoryCartStore};
pub use checkout_service::{CheckoutRedirect, CheckoutService};
pub use reception_service::{
    AppointmentReceptionRequest, ReceptionService, WalkInReceptionRequest,
};
pub use repair_service::{CreateQuoteRequest, OrderTotals, QuoteLineRequest, RepairService};
pub use settlement_service::{ReconciliationResult, SettlementOutcome, SettlementService};
