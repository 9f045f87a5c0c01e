pub mod appointment;
pub mod catalog;
pub mod customer;
pub mod employee;
pub mod payment;
pub mod receipt;
pub mod reception_form;
pub mod repair_order;
pub mod vehicle;

pub use appointment::{Appointment, AppointmentStatus};
pub use catalog::{Service, SparePart};
pub use customer::Customer;
pub use employee::Employee;
pub use payment::{CartEntry, Payment, PaymentStatus, PaymentType};
pub use receipt::{PaymentMethod, Receipt, ReceiptItem, ReceiptItemType};
pub use reception_form::{ReceiveType, ReceptionForm};
pub use repair_order::{RepairLine, RepairOrder, RepairOrderStatus};
pub use vehicle::{Vehicle, VehicleStatus};
