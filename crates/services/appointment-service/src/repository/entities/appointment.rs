//! Appointment database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{Appointment, AppointmentStatus, AttendanceMethod, PetSize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub customer_id: i64,
    pub pet_id: i64,
    /// Serialized `Vec<i64>`
    #[sea_orm(column_type = "JsonBinary")]
    pub service_ids: Json,
    pub scheduled_date: Date,
    pub scheduled_time: Time,
    pub status: String,
    pub attendance_method: String,
    pub pet_size: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Appointment {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let service_ids: Vec<i64> = serde_json::from_value(model.service_ids).map_err(|e| {
            AppError::internal(format!(
                "Appointment {} has malformed service ids: {}",
                model.id, e
            ))
        })?;
        let status: AppointmentStatus = model.status.parse()?;
        let attendance_method: AttendanceMethod = model.attendance_method.parse()?;
        let pet_size = model
            .pet_size
            .as_deref()
            .map(str::parse::<PetSize>)
            .transpose()?;

        Ok(Appointment {
            id: model.id,
            customer_id: model.customer_id,
            pet_id: model.pet_id,
            service_ids,
            date: model.scheduled_date,
            time: model.scheduled_time,
            status,
            attendance_method,
            pet_size,
            total: model.total,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
