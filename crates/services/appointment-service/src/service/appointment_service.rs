//! Appointment booking: slot conflicts, pet ownership and the appointment
//! lifecycle. Nothing outside this service is reserved, so cancelling needs
//! no compensation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tracing::info;

use clients::{CatalogApi, CustomerApi, PetApi};
use common::{AppError, AppResult, AuthorizationGate, OptionExt};
use domain::{
    appointment_total, free_slots, is_daily_slot, validate_service_ids, Appointment,
    AppointmentStatus, AttendanceMethod, Identity, NewAppointment, PetSize, Role,
};

use crate::repository::{AppointmentFilter, AppointmentRepository};

const ANY_ROLE: &[Role] = &[Role::Admin, Role::Customer];

/// Input of [`AppointmentService::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookAppointment {
    pub customer_id: i64,
    pub pet_id: i64,
    pub service_ids: Vec<i64>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub attendance_method: AttendanceMethod,
    pub pet_size: Option<PetSize>,
    pub notes: Option<String>,
}

/// What `DELETE` did to an appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// Soft cancel, the appointment is kept
    Cancelled(Appointment),
    /// Row removed
    Deleted,
}

/// Appointment use cases. Every operation takes the caller's identity.
#[async_trait]
pub trait AppointmentService: Send + Sync {
    /// Book a slot as `PENDING` after checking customer, pet and services.
    async fn create(&self, identity: &Identity, request: BookAppointment)
        -> AppResult<Appointment>;

    async fn get(&self, identity: &Identity, id: i64) -> AppResult<Appointment>;

    /// Customers are always restricted to their own appointments.
    async fn list(&self, identity: &Identity, filter: AppointmentFilter)
        -> AppResult<Vec<Appointment>>;

    /// Customers may only cancel, and only while `PENDING`.
    async fn update_status(
        &self,
        identity: &Identity,
        id: i64,
        status: AppointmentStatus,
    ) -> AppResult<Appointment>;

    /// Customers soft-cancel; admins delete the row.
    async fn cancel_or_delete(&self, identity: &Identity, id: i64) -> AppResult<Removal>;

    /// Daily slots of `date` not held by an active appointment.
    async fn available_slots(&self, identity: &Identity, date: NaiveDate)
        -> AppResult<Vec<NaiveTime>>;
}

/// [`AppointmentService`] backed by the repository and the customer, pet and
/// catalog peers.
pub struct AppointmentBooking {
    repo: Arc<dyn AppointmentRepository>,
    catalog: Arc<dyn CatalogApi>,
    customers: Arc<dyn CustomerApi>,
    pets: Arc<dyn PetApi>,
}

impl AppointmentBooking {
    pub fn new(
        repo: Arc<dyn AppointmentRepository>,
        catalog: Arc<dyn CatalogApi>,
        customers: Arc<dyn CustomerApi>,
        pets: Arc<dyn PetApi>,
    ) -> Self {
        Self {
            repo,
            catalog,
            customers,
            pets,
        }
    }

    async fn load(&self, identity: &Identity, id: i64) -> AppResult<Appointment> {
        AuthorizationGate::require_role(identity, ANY_ROLE)?;
        let appointment = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_not_found(format!("Appointment {}", id))?;
        AuthorizationGate::require_ownership(identity, appointment.customer_id)?;
        Ok(appointment)
    }

    async fn cancel(&self, identity: &Identity, appointment: &Appointment) -> AppResult<Appointment> {
        if !identity.is_admin() && appointment.status != AppointmentStatus::Pending {
            return Err(AppError::Forbidden);
        }
        appointment.ensure_transition(AppointmentStatus::Cancelled)?;

        let cancelled = self
            .repo
            .update_status(appointment.id, AppointmentStatus::Cancelled)
            .await?;
        info!(
            "Appointment {} cancelled, slot {} {} released",
            cancelled.id,
            cancelled.date,
            cancelled.time.format("%H:%M")
        );
        Ok(cancelled)
    }
}

#[async_trait]
impl AppointmentService for AppointmentBooking {
    async fn create(
        &self,
        identity: &Identity,
        request: BookAppointment,
    ) -> AppResult<Appointment> {
        validate_service_ids(&request.service_ids)?;
        if !is_daily_slot(request.time) {
            return Err(AppError::validation(format!(
                "{} is not a bookable time",
                request.time.format("%H:%M")
            )));
        }
        AuthorizationGate::require_role(identity, ANY_ROLE)?;
        AuthorizationGate::require_ownership(identity, request.customer_id)?;

        self.customers
            .find_customer(request.customer_id)
            .await
            .ok_or_not_found(format!("Customer {}", request.customer_id))?;

        let pet = self
            .pets
            .find_pet(request.pet_id)
            .await
            .ok_or_not_found(format!("Pet {}", request.pet_id))?;
        if !identity.is_admin() && pet.customer_id != request.customer_id {
            return Err(AppError::Forbidden);
        }

        let mut prices = Vec::with_capacity(request.service_ids.len());
        for service_id in &request.service_ids {
            let service = self
                .catalog
                .find_service(*service_id)
                .await
                .ok_or_not_found(format!("Service {}", service_id))?;
            prices.push(service.price);
        }
        let total = appointment_total(&prices, request.attendance_method);

        let taken = self.repo.taken_slots(request.date).await?;
        if taken.contains(&request.time) {
            return Err(AppError::conflict(format!(
                "Slot {} {} is already booked",
                request.date,
                request.time.format("%H:%M")
            )));
        }

        let appointment = self
            .repo
            .create(NewAppointment {
                customer_id: request.customer_id,
                pet_id: request.pet_id,
                service_ids: request.service_ids,
                date: request.date,
                time: request.time,
                attendance_method: request.attendance_method,
                pet_size: request.pet_size,
                notes: request.notes,
                total,
            })
            .await?;

        info!(
            "Appointment {} booked for pet {} at {} {} (total {})",
            appointment.id,
            appointment.pet_id,
            appointment.date,
            appointment.time.format("%H:%M"),
            appointment.total
        );
        Ok(appointment)
    }

    async fn get(&self, identity: &Identity, id: i64) -> AppResult<Appointment> {
        self.load(identity, id).await
    }

    async fn list(
        &self,
        identity: &Identity,
        filter: AppointmentFilter,
    ) -> AppResult<Vec<Appointment>> {
        let customer_id = AuthorizationGate::scope_owner_filter(identity, filter.customer_id)?;
        self.repo
            .list(AppointmentFilter {
                customer_id,
                ..filter
            })
            .await
    }

    async fn update_status(
        &self,
        identity: &Identity,
        id: i64,
        status: AppointmentStatus,
    ) -> AppResult<Appointment> {
        let appointment = self.load(identity, id).await?;

        if status == AppointmentStatus::Cancelled {
            return self.cancel(identity, &appointment).await;
        }
        if !identity.is_admin() {
            return Err(AppError::Forbidden);
        }
        appointment.ensure_transition(status)?;

        let updated = self.repo.update_status(id, status).await?;
        info!(
            "Appointment {} moved from {} to {}",
            id, appointment.status, status
        );
        Ok(updated)
    }

    async fn cancel_or_delete(&self, identity: &Identity, id: i64) -> AppResult<Removal> {
        let appointment = self.load(identity, id).await?;

        if identity.is_admin() {
            self.repo.delete(id).await?;
            info!("Appointment {} deleted", id);
            return Ok(Removal::Deleted);
        }

        self.cancel(identity, &appointment)
            .await
            .map(Removal::Cancelled)
    }

    async fn available_slots(
        &self,
        identity: &Identity,
        date: NaiveDate,
    ) -> AppResult<Vec<NaiveTime>> {
        AuthorizationGate::require_role(identity, ANY_ROLE)?;
        let taken = self.repo.taken_slots(date).await?;
        Ok(free_slots(&taken))
    }
}
