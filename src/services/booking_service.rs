use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::lifecycle::{appointment_transition, AppointmentEvent};
use crate::models::{Appointment, Vehicle};
use crate::repositories::{AppointmentRepository, CustomerRepository, VehicleRepository};

/// Request to book a drop-off appointment.
#[derive(Debug, Clone)]
pub struct BookAppointmentRequest {
    pub customer_id: Uuid,
    pub license_plate: String,
    pub vehicle_type: String,
    pub schedule_time: DateTime<Utc>,
    pub note: Option<String>,
}

/// Books, confirms and cancels appointments, enforcing the daily slot
/// capacity.
pub struct BookingService {
    appointment_repo: AppointmentRepository,
    vehicle_repo: VehicleRepository,
    customer_repo: CustomerRepository,
    max_slots_per_day: i64,
}

impl BookingService {
    pub fn new(pool: PgPool, max_slots_per_day: i64) -> Self {
        Self {
            appointment_repo: AppointmentRepository::new(pool.clone()),
            vehicle_repo: VehicleRepository::new(pool.clone()),
            customer_repo: CustomerRepository::new(pool),
            max_slots_per_day,
        }
    }

    /// Books an appointment, creating the vehicle on first sight of
    /// its license plate.
    pub async fn book(&self, request: BookAppointmentRequest) -> Result<Appointment> {
        if request.license_plate.trim().is_empty() {
            return Err(AppError::Validation(
                "license plate must not be empty".to_string(),
            ));
        }

        let customer = self
            .customer_repo
            .find_by_id(request.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Customer '{}' not found", request.customer_id))
            })?;

        let day = request.schedule_time.date_naive();
        let booked = self.appointment_repo.count_for_day(day).await?;
        if booked >= self.max_slots_per_day {
            return Err(AppError::Validation(format!(
                "no free slots on {day}: {booked} of {} taken",
                self.max_slots_per_day
            )));
        }

        let vehicle = match self.vehicle_repo.find_by_plate(&request.license_plate).await? {
            Some(vehicle) => {
                if vehicle.customer_id != customer.id {
                    return Err(AppError::Validation(format!(
                        "vehicle '{}' belongs to a different customer",
                        request.license_plate
                    )));
                }
                vehicle
            }
            None => {
                let vehicle = Vehicle::booked(
                    request.license_plate.clone(),
                    request.vehicle_type.clone(),
                    customer.id,
                );
                self.vehicle_repo.create(&vehicle).await?
            }
        };

        let appointment = Appointment::new(
            customer.id,
            vehicle.id,
            request.schedule_time,
            request.note,
        );
        let appointment = self.appointment_repo.create(&appointment).await?;

        tracing::info!(
            appointment_id = %appointment.id,
            license_plate = %vehicle.license_plate,
            "appointment booked"
        );
        Ok(appointment)
    }

    pub async fn confirm(&self, id: Uuid) -> Result<Appointment> {
        self.apply(id, AppointmentEvent::Confirm).await
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Appointment> {
        self.apply(id, AppointmentEvent::Cancel).await
    }

    async fn apply(&self, id: Uuid, event: AppointmentEvent) -> Result<Appointment> {
        let appointment = self
            .appointment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment '{id}' not found")))?;

        let next = appointment_transition(appointment.status, event)?;

        self.appointment_repo
            .update_status(id, next)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment '{id}' not found")))
    }
}
