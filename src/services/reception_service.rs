use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::lifecycle::{appointment_transition, vehicle_transition, AppointmentEvent, VehicleEvent};
use crate::models::{Customer, ReceptionForm, Vehicle, VehicleStatus};
use crate::repositories::{AppointmentRepository, CustomerRepository, VehicleRepository};

/// Reception of a vehicle that booked an appointment.
#[derive(Debug, Clone)]
pub struct AppointmentReceptionRequest {
    pub employee_id: Uuid,
    pub appointment_id: Uuid,
    pub error_description: String,
}

/// Reception of an unannounced drop-off.
#[derive(Debug, Clone)]
pub struct WalkInReceptionRequest {
    pub employee_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub license_plate: String,
    pub vehicle_type: String,
    pub error_description: String,
}

/// Creates reception forms at vehicle drop-off. Consuming an
/// appointment marks it COMPLETED and the vehicle RECEIVED in one
/// database transaction.
pub struct ReceptionService {
    pool: PgPool,
    appointment_repo: AppointmentRepository,
    vehicle_repo: VehicleRepository,
    customer_repo: CustomerRepository,
}

impl ReceptionService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            appointment_repo: AppointmentRepository::new(pool.clone()),
            vehicle_repo: VehicleRepository::new(pool.clone()),
            customer_repo: CustomerRepository::new(pool.clone()),
            pool,
        }
    }

    /// Receives a vehicle against its appointment. All-or-nothing:
    /// the appointment completion, the vehicle status change and the
    /// form insert commit together or not at all.
    pub async fn receive_from_appointment(
        &self,
        request: AppointmentReceptionRequest,
    ) -> Result<ReceptionForm> {
        let appointment = self
            .appointment_repo
            .find_by_id(request.appointment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Appointment '{}' not found", request.appointment_id))
            })?;

        let appointment_next =
            appointment_transition(appointment.status, AppointmentEvent::ConsumedByReception)?;

        let vehicle = self
            .vehicle_repo
            .find_by_id(appointment.vehicle_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Vehicle '{}' not found", appointment.vehicle_id))
            })?;

        let vehicle_next = vehicle_transition(vehicle.status, VehicleEvent::Receive)?;

        let form = ReceptionForm::from_appointment(
            request.employee_id,
            vehicle.id,
            appointment.id,
            request.error_description,
        );

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("UPDATE appointments SET status = $2 WHERE id = $1")
            .bind(appointment.id)
            .bind(appointment_next)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
            .bind(vehicle.id)
            .bind(vehicle_next)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let form = insert_form(&mut tx, &form).await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            form_id = %form.id,
            appointment_id = %appointment.id,
            license_plate = %vehicle.license_plate,
            "vehicle received from appointment"
        );
        Ok(form)
    }

    /// Receives a walk-in, creating the customer and vehicle records
    /// when the garage has not seen them before.
    pub async fn receive_walk_in(&self, request: WalkInReceptionRequest) -> Result<ReceptionForm> {
        if request.customer_phone.trim().is_empty() {
            return Err(AppError::Validation(
                "customer phone must not be empty".to_string(),
            ));
        }
        if request.license_plate.trim().is_empty() {
            return Err(AppError::Validation(
                "license plate must not be empty".to_string(),
            ));
        }

        let existing_customer = self
            .customer_repo
            .find_by_phone(&request.customer_phone)
            .await?;
        let existing_vehicle = self
            .vehicle_repo
            .find_by_plate(&request.license_plate)
            .await?;

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let customer = match existing_customer {
            Some(customer) => customer,
            None => {
                let customer =
                    Customer::new(request.customer_name.clone(), request.customer_phone.clone());
                insert_customer(&mut tx, &customer).await?
            }
        };

        let vehicle = match existing_vehicle {
            Some(vehicle) => {
                let next = walk_in_status(vehicle.status)?;
                sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
                    .bind(vehicle.id)
                    .bind(next)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
                Vehicle { status: next, ..vehicle }
            }
            None => {
                let vehicle = Vehicle::walk_in(
                    request.license_plate.clone(),
                    request.vehicle_type.clone(),
                    customer.id,
                );
                insert_vehicle(&mut tx, &vehicle).await?
            }
        };

        let form =
            ReceptionForm::walk_in(request.employee_id, vehicle.id, request.error_description);
        let form = insert_form(&mut tx, &form).await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            form_id = %form.id,
            license_plate = %vehicle.license_plate,
            "walk-in vehicle received"
        );
        Ok(form)
    }
}

/// Status for a returning vehicle dropped off without an appointment.
/// A vehicle already in the shop cannot be received twice.
fn walk_in_status(current: VehicleStatus) -> Result<VehicleStatus> {
    match current {
        VehicleStatus::PendingAppointment => {
            vehicle_transition(current, VehicleEvent::Receive)
        }
        // A past customer returning after delivery re-enters the cycle.
        VehicleStatus::Delivered | VehicleStatus::Cancelled => Ok(VehicleStatus::Received),
        _ => Err(AppError::IllegalTransition {
            entity: "vehicle",
            from: format!("{current:?}"),
            event: "receive",
        }),
    }
}

async fn insert_form(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    form: &ReceptionForm,
) -> Result<ReceptionForm> {
    let row = sqlx::query_as::<_, ReceptionForm>(
        r#"
        INSERT INTO reception_forms (id, employee_id, vehicle_id, appointment_id, error_description, receive_type, active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, employee_id, vehicle_id, appointment_id, error_description, receive_type, active, created_at
        "#,
    )
    .bind(form.id)
    .bind(form.employee_id)
    .bind(form.vehicle_id)
    .bind(form.appointment_id)
    .bind(&form.error_description)
    .bind(form.receive_type)
    .bind(form.active)
    .bind(form.created_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(row)
}

async fn insert_customer(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    customer: &Customer,
) -> Result<Customer> {
    let row = sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (id, full_name, phone, address, active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, full_name, phone, address, active, created_at
        "#,
    )
    .bind(customer.id)
    .bind(&customer.full_name)
    .bind(&customer.phone)
    .bind(&customer.address)
    .bind(customer.active)
    .bind(customer.created_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(row)
}

async fn insert_vehicle(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    vehicle: &Vehicle,
) -> Result<Vehicle> {
    let row = sqlx::query_as::<_, Vehicle>(
        r#"
        INSERT INTO vehicles (id, license_plate, vehicle_type, customer_id, status, active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, license_plate, vehicle_type, customer_id, status, active, created_at
        "#,
    )
    .bind(vehicle.id)
    .bind(&vehicle.license_plate)
    .bind(&vehicle.vehicle_type)
    .bind(vehicle.customer_id)
    .bind(vehicle.status)
    .bind(vehicle.active)
    .bind(vehicle.created_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_in_status_from_pending() {
        assert_eq!(
            walk_in_status(VehicleStatus::PendingAppointment).unwrap(),
            VehicleStatus::Received
        );
    }

    #[test]
    fn test_walk_in_status_reentry_after_delivery() {
        assert_eq!(
            walk_in_status(VehicleStatus::Delivered).unwrap(),
            VehicleStatus::Received
        );
    }

    #[test]
    fn test_walk_in_status_rejects_vehicle_in_shop() {
        for status in [
            VehicleStatus::Received,
            VehicleStatus::WaitingApproval,
            VehicleStatus::Repairing,
            VehicleStatus::Done,
        ] {
            assert!(walk_in_status(status).is_err());
        }
    }
}
