//! Appointment repository implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    NotSet, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

use super::entities::appointment::{self, ActiveModel, Entity as AppointmentEntity};
use common::{AppError, AppResult};
use domain::{Appointment, AppointmentStatus, NewAppointment};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Listing filters; `None` means no restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub customer_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.customer_id.map_or(true, |id| appointment.customer_id == id)
            && self.status.map_or(true, |status| appointment.status == status)
            && self.date.map_or(true, |date| appointment.date == date)
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Appointment>>;

    /// Appointments matching the filter, in agenda order (date, then time)
    async fn list(&self, filter: AppointmentFilter) -> AppResult<Vec<Appointment>>;

    /// Times on `date` held by a non-cancelled appointment
    async fn taken_slots(&self, date: NaiveDate) -> AppResult<Vec<NaiveTime>>;

    /// Persist a new appointment as `PENDING`. A slot already held by another
    /// active appointment is a `Conflict`.
    async fn create(&self, appointment: NewAppointment) -> AppResult<Appointment>;

    async fn update_status(&self, id: i64, status: AppointmentStatus) -> AppResult<Appointment>;

    async fn delete(&self, id: i64) -> AppResult<()>;
}

/// SeaORM-backed appointment repository
pub struct AppointmentStore {
    db: DatabaseConnection,
}

impl AppointmentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn slot_conflict(err: DbErr, date: NaiveDate, time: NaiveTime) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(format!(
            "Slot {} {} is already booked",
            date,
            time.format("%H:%M")
        )),
        _ => AppError::from(err),
    }
}

#[async_trait]
impl AppointmentRepository for AppointmentStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Appointment>> {
        AppointmentEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?
            .map(Appointment::try_from)
            .transpose()
    }

    async fn list(&self, filter: AppointmentFilter) -> AppResult<Vec<Appointment>> {
        let mut query = AppointmentEntity::find();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(appointment::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(appointment::Column::Status.eq(status.as_str()));
        }
        if let Some(date) = filter.date {
            query = query.filter(appointment::Column::ScheduledDate.eq(date));
        }

        query
            .order_by_asc(appointment::Column::ScheduledDate)
            .order_by_asc(appointment::Column::ScheduledTime)
            .all(&self.db)
            .await
            .map_err(AppError::from)?
            .into_iter()
            .map(Appointment::try_from)
            .collect()
    }

    async fn taken_slots(&self, date: NaiveDate) -> AppResult<Vec<NaiveTime>> {
        let times: Vec<NaiveTime> = AppointmentEntity::find()
            .select_only()
            .column(appointment::Column::ScheduledTime)
            .filter(appointment::Column::ScheduledDate.eq(date))
            .filter(appointment::Column::Status.ne(AppointmentStatus::Cancelled.as_str()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(times)
    }

    async fn create(&self, appointment: NewAppointment) -> AppResult<Appointment> {
        let now = Utc::now();
        let (date, time) = (appointment.date, appointment.time);
        let service_ids = serde_json::to_value(&appointment.service_ids)
            .map_err(|e| AppError::internal(format!("Failed to serialize service ids: {}", e)))?;

        let model = ActiveModel {
            id: NotSet,
            customer_id: Set(appointment.customer_id),
            pet_id: Set(appointment.pet_id),
            service_ids: Set(service_ids),
            scheduled_date: Set(date),
            scheduled_time: Set(time),
            status: Set(AppointmentStatus::Pending.as_str().to_string()),
            attendance_method: Set(appointment.attendance_method.as_str().to_string()),
            pet_size: Set(appointment.pet_size.map(|size| size.as_str().to_string())),
            total: Set(appointment.total),
            notes: Set(appointment.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = model
            .insert(&self.db)
            .await
            .map_err(|e| slot_conflict(e, date, time))?;
        Appointment::try_from(model)
    }

    async fn update_status(&self, id: i64, status: AppointmentStatus) -> AppResult<Appointment> {
        let model = AppointmentEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Appointment {}", id)))?;

        let mut active = model.into_active_model();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Appointment::try_from(model)
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = AppointmentEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found(format!("Appointment {}", id)));
        }
        Ok(())
    }
}
