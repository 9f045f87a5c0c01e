pub mod appointment_repository;
pub mod catalog_repository;
pub mod customer_repository;
pub mod payment_repository;
pub mod receipt_repository;
pub mod reception_repository;
pub mod repair_order_repository;
pub mod vehicle_repository;

pub use appointment_repository::AppointmentRepository;
pub use catalog_repository::CatalogRepository;
pub use customer_repository::CustomerRepository;
pub use payment_repository::PaymentRepository;
pub use receipt_repository::ReceiptRepository;
pub use reception_repository::ReceptionRepository;
pub use repair_order_repository::RepairOrderRepository;
pub use vehicle_repository::VehicleRepository;
