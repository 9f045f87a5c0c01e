mod common;

use chrono::{Duration, Utc};
use garage_settlement::error::AppError;
use garage_settlement::models::{AppointmentStatus, ReceiveType, RepairOrderStatus, VehicleStatus};
use garage_settlement::repositories::{
    AppointmentRepository, CatalogRepository, ReceptionRepository, VehicleRepository,
};
use garage_settlement::services::{
    AppointmentReceptionRequest, BookAppointmentRequest, BookingService, CreateQuoteRequest,
    QuoteLineRequest, ReceptionService, RepairService, WalkInReceptionRequest,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn test_booking_and_reception_flow() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let booking = BookingService::new(pool.clone(), 30);
    let reception = ReceptionService::new(pool.clone());
    let customer = common::seed_customer(&pool).await;
    let employee = common::seed_employee(&pool).await;

    let appointment = booking
        .book(BookAppointmentRequest {
            customer_id: customer.id,
            license_plate: common::unique_plate(),
            vehicle_type: "motorbike".to_string(),
            schedule_time: Utc::now() + Duration::days(1),
            note: Some("engine noise".to_string()),
        })
        .await
        .expect("Failed to book");
    assert_eq!(appointment.status, AppointmentStatus::Booked);

    let confirmed = booking.confirm(appointment.id).await.expect("Failed to confirm");
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let form = reception
        .receive_from_appointment(AppointmentReceptionRequest {
            employee_id: employee.id,
            appointment_id: appointment.id,
            error_description: "engine noise at idle".to_string(),
        })
        .await
        .expect("Failed to receive");
    assert_eq!(form.receive_type, ReceiveType::FromAppointment);
    assert_eq!(form.appointment_id, Some(appointment.id));

    let appointment_repo = AppointmentRepository::new(pool.clone());
    let stored = appointment_repo
        .find_by_id(appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Completed);

    let vehicle_repo = VehicleRepository::new(pool.clone());
    let vehicle = vehicle_repo.find_by_id(form.vehicle_id).await.unwrap().unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Received);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_booking_respects_daily_capacity() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let booking = BookingService::new(pool.clone(), 1);
    let customer = common::seed_customer(&pool).await;
    let schedule_time = Utc::now() + Duration::days(2);

    booking
        .book(BookAppointmentRequest {
            customer_id: customer.id,
            license_plate: common::unique_plate(),
            vehicle_type: "car".to_string(),
            schedule_time,
            note: None,
        })
        .await
        .expect("First booking must fit");

    let second = booking
        .book(BookAppointmentRequest {
            customer_id: customer.id,
            license_plate: common::unique_plate(),
            vehicle_type: "car".to_string(),
            schedule_time,
            note: None,
        })
        .await;
    assert!(matches!(second, Err(AppError::Validation(_))));

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_cancelled_appointment_cannot_be_received() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let booking = BookingService::new(pool.clone(), 30);
    let reception = ReceptionService::new(pool.clone());
    let customer = common::seed_customer(&pool).await;
    let employee = common::seed_employee(&pool).await;

    let appointment = booking
        .book(BookAppointmentRequest {
            customer_id: customer.id,
            license_plate: common::unique_plate(),
            vehicle_type: "motorbike".to_string(),
            schedule_time: Utc::now() + Duration::days(1),
            note: None,
        })
        .await
        .unwrap();

    booking.cancel(appointment.id).await.expect("Failed to cancel");

    // Cancelled is terminal for both cancel and reception.
    assert!(booking.cancel(appointment.id).await.is_err());

    let result = reception
        .receive_from_appointment(AppointmentReceptionRequest {
            employee_id: employee.id,
            appointment_id: appointment.id,
            error_description: "flat tire".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AppError::IllegalTransition { .. })));

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_walk_in_creates_customer_and_vehicle() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let reception = ReceptionService::new(pool.clone());
    let employee = common::seed_employee(&pool).await;
    let plate = common::unique_plate();
    let phone = format!("09{}", &Uuid::new_v4().simple().to_string()[..9]);

    let form = reception
        .receive_walk_in(WalkInReceptionRequest {
            employee_id: employee.id,
            customer_name: "Walk In".to_string(),
            customer_phone: phone,
            license_plate: plate.clone(),
            vehicle_type: "motorbike".to_string(),
            error_description: "brake check".to_string(),
        })
        .await
        .expect("Failed to receive walk-in");
    assert_eq!(form.receive_type, ReceiveType::WalkIn);
    assert_eq!(form.appointment_id, None);

    let vehicle_repo = VehicleRepository::new(pool.clone());
    let vehicle = vehicle_repo.find_by_plate(&plate).await.unwrap().unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Received);

    // The vehicle is in the shop now; a second drop-off is rejected.
    let again = reception
        .receive_walk_in(WalkInReceptionRequest {
            employee_id: employee.id,
            customer_name: "Walk In".to_string(),
            customer_phone: format!("09{}", &Uuid::new_v4().simple().to_string()[..9]),
            license_plate: plate,
            vehicle_type: "motorbike".to_string(),
            error_description: "brake check".to_string(),
        })
        .await;
    assert!(matches!(again, Err(AppError::IllegalTransition { .. })));

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_quote_snapshots_catalog_prices() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let reception = ReceptionService::new(pool.clone());
    let repair = RepairService::new(pool.clone());
    let employee = common::seed_employee(&pool).await;
    let service = common::seed_service(&pool, "Oil change", dec!(80000)).await;
    let part = common::seed_spare_part(&pool, "Oil filter", dec!(50000)).await;

    let form = reception
        .receive_walk_in(WalkInReceptionRequest {
            employee_id: employee.id,
            customer_name: "Quote Customer".to_string(),
            customer_phone: format!("09{}", &Uuid::new_v4().simple().to_string()[..9]),
            license_plate: common::unique_plate(),
            vehicle_type: "motorbike".to_string(),
            error_description: "oil change due".to_string(),
        })
        .await
        .unwrap();

    let (order, lines) = repair
        .create_quote(CreateQuoteRequest {
            reception_form_id: form.id,
            employee_id: employee.id,
            lines: vec![QuoteLineRequest {
                task: Some("oil change".to_string()),
                service_id: Some(service.id),
                spare_part_id: Some(part.id),
                quantity: 2,
            }],
        })
        .await
        .expect("Failed to quote");
    assert_eq!(order.status, RepairOrderStatus::Quoted);
    assert_eq!(lines[0].service_price, Some(dec!(80000)));
    assert_eq!(lines[0].spare_part_price, Some(dec!(50000)));

    // Vehicle cascades with the quote.
    let vehicle_repo = VehicleRepository::new(pool.clone());
    let vehicle = vehicle_repo.find_by_id(order.vehicle_id).await.unwrap().unwrap();
    assert_eq!(vehicle.status, VehicleStatus::WaitingApproval);

    // Catalog changes after the quote do not reach the snapshot.
    let catalog = CatalogRepository::new(pool.clone());
    catalog
        .update_service_price(service.id, dec!(999999))
        .await
        .expect("Failed to reprice");

    let totals = repair.order_totals(order.id, dec!(0.1)).await.unwrap();
    assert_eq!(totals.subtotal, dec!(180000));
    assert_eq!(totals.total_with_vat, dec!(198000));

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_repair_order_transition_chain() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let reception = ReceptionService::new(pool.clone());
    let repair = RepairService::new(pool.clone());
    let employee = common::seed_employee(&pool).await;
    let service = common::seed_service(&pool, "Brake pads", dec!(120000)).await;

    let form = reception
        .receive_walk_in(WalkInReceptionRequest {
            employee_id: employee.id,
            customer_name: "Chain Customer".to_string(),
            customer_phone: format!("09{}", &Uuid::new_v4().simple().to_string()[..9]),
            license_plate: common::unique_plate(),
            vehicle_type: "car".to_string(),
            error_description: "soft brakes".to_string(),
        })
        .await
        .unwrap();

    let (order, _) = repair
        .create_quote(CreateQuoteRequest {
            reception_form_id: form.id,
            employee_id: employee.id,
            lines: vec![QuoteLineRequest {
                task: None,
                service_id: Some(service.id),
                spare_part_id: None,
                quantity: 1,
            }],
        })
        .await
        .unwrap();

    // Start before approval is out of order.
    assert!(matches!(
        repair.start(order.id).await,
        Err(AppError::IllegalTransition { .. })
    ));

    let order = repair.approve(order.id).await.unwrap();
    assert_eq!(order.status, RepairOrderStatus::Approved);

    let order = repair.start(order.id).await.unwrap();
    assert_eq!(order.status, RepairOrderStatus::Repairing);

    let order = repair.complete(order.id).await.unwrap();
    assert_eq!(order.status, RepairOrderStatus::Done);

    // DONE cannot be re-approved.
    assert!(matches!(
        repair.approve(order.id).await,
        Err(AppError::IllegalTransition { .. })
    ));

    let vehicle_repo = VehicleRepository::new(pool.clone());
    let vehicle = vehicle_repo.find_by_id(order.vehicle_id).await.unwrap().unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Done);

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_deactivated_form_cannot_be_quoted() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let reception = ReceptionService::new(pool.clone());
    let repair = RepairService::new(pool.clone());
    let employee = common::seed_employee(&pool).await;
    let service = common::seed_service(&pool, "Diagnostics", dec!(70000)).await;

    let form = reception
        .receive_walk_in(WalkInReceptionRequest {
            employee_id: employee.id,
            customer_name: "Mistaken Entry".to_string(),
            customer_phone: format!("09{}", &Uuid::new_v4().simple().to_string()[..9]),
            license_plate: common::unique_plate(),
            vehicle_type: "car".to_string(),
            error_description: "recorded in error".to_string(),
        })
        .await
        .unwrap();

    let reception_repo = ReceptionRepository::new(pool.clone());
    let deactivated = reception_repo.deactivate(form.id).await.unwrap().unwrap();
    assert!(!deactivated.active);

    let result = repair
        .create_quote(CreateQuoteRequest {
            reception_form_id: form.id,
            employee_id: employee.id,
            lines: vec![QuoteLineRequest {
                task: None,
                service_id: Some(service.id),
                spare_part_id: None,
                quantity: 1,
            }],
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    common::cleanup_test_data(&pool).await;
}

#[tokio::test]
async fn test_reception_form_accepts_single_quote() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_data(&pool).await;

    let reception = ReceptionService::new(pool.clone());
    let repair = RepairService::new(pool.clone());
    let employee = common::seed_employee(&pool).await;
    let service = common::seed_service(&pool, "Inspection", dec!(60000)).await;

    let form = reception
        .receive_walk_in(WalkInReceptionRequest {
            employee_id: employee.id,
            customer_name: "Single Quote".to_string(),
            customer_phone: format!("09{}", &Uuid::new_v4().simple().to_string()[..9]),
            license_plate: common::unique_plate(),
            vehicle_type: "car".to_string(),
            error_description: "annual inspection".to_string(),
        })
        .await
        .unwrap();

    let quote = |form_id| CreateQuoteRequest {
        reception_form_id: form_id,
        employee_id: employee.id,
        lines: vec![QuoteLineRequest {
            task: None,
            service_id: Some(service.id),
            spare_part_id: None,
            quantity: 1,
        }],
    };

    repair.create_quote(quote(form.id)).await.expect("First quote fits");

    let second = repair.create_quote(quote(form.id)).await;
    assert!(matches!(second, Err(AppError::Validation(_))));

    common::cleanup_test_data(&pool).await;
}
