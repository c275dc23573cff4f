//! Appointment handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use common::http::ValidatedJson;
use common::{AppError, AppResult};
use domain::{Appointment, AppointmentStatus, AttendanceMethod, Identity, PetSize};

use crate::repository::AppointmentFilter;
use crate::service::{BookAppointment, Removal};
use crate::state::AppState;

/// Accepts `HH:MM` and `HH:MM:SS`.
fn parse_time(value: &str) -> AppResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::validation(format!("Invalid time '{}', expected HH:MM", value)))
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Booking request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAppointmentRequest {
    #[serde(rename = "clienteId")]
    #[schema(example = 1)]
    pub customer_id: i64,
    #[serde(rename = "petId")]
    #[schema(example = 7)]
    pub pet_id: i64,
    #[serde(rename = "servicoIds")]
    #[validate(length(min = 1, message = "Appointment must include at least one service"))]
    pub service_ids: Vec<i64>,
    #[serde(rename = "dataAgendamento")]
    #[schema(example = "2025-01-15")]
    pub date: NaiveDate,
    #[serde(rename = "horario")]
    #[schema(example = "10:00")]
    pub time: String,
    #[serde(rename = "metodoAtendimento", default)]
    pub attendance_method: AttendanceMethod,
    #[serde(rename = "portePet", default)]
    pub pet_size: Option<PetSize>,
    #[serde(rename = "observacoes", default)]
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    pub notes: Option<String>,
}

/// Status change request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAppointmentsQuery {
    /// Only appointments of this customer
    #[serde(rename = "clienteId")]
    #[param(rename = "clienteId")]
    pub customer_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
    /// Only appointments on this day
    #[serde(rename = "data")]
    #[param(rename = "data")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotsQuery {
    /// Day to inspect
    #[serde(rename = "data")]
    #[param(rename = "data", example = "2025-01-15")]
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentResponse {
    pub id: i64,
    #[serde(rename = "clienteId")]
    pub customer_id: i64,
    #[serde(rename = "petId")]
    pub pet_id: i64,
    #[serde(rename = "servicoIds")]
    pub service_ids: Vec<i64>,
    #[serde(rename = "dataAgendamento")]
    pub date: NaiveDate,
    #[serde(rename = "horario")]
    pub time: String,
    pub status: AppointmentStatus,
    #[serde(rename = "metodoAtendimento")]
    pub attendance_method: AttendanceMethod,
    #[serde(rename = "portePet", skip_serializing_if = "Option::is_none")]
    pub pet_size: Option<PetSize>,
    pub total: Decimal,
    #[serde(rename = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            customer_id: appointment.customer_id,
            pet_id: appointment.pet_id,
            service_ids: appointment.service_ids,
            date: appointment.date,
            time: format_time(appointment.time),
            status: appointment.status,
            attendance_method: appointment.attendance_method,
            pet_size: appointment.pet_size,
            total: appointment.total,
            notes: appointment.notes,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

/// Create appointment routes
pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route("/:id", get(get_appointment).delete(delete_appointment))
        .route("/:id/status", put(update_appointment_status))
}

/// Create availability routes
pub fn slot_routes() -> Router<AppState> {
    Router::new().route("/", get(available_slots))
}

/// Book an appointment slot
#[utoipa::path(
    post,
    path = "/agendamentos",
    tag = "Appointments",
    security(("bearer_auth" = [])),
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentResponse),
        (status = 400, description = "Invalid services or time"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Booking for another customer or their pet"),
        (status = 404, description = "Customer, pet or service not found"),
        (status = 409, description = "Slot already booked"),
        (status = 503, description = "Peer service unavailable")
    )
)]
pub async fn create_appointment(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<AppointmentResponse>)> {
    let request = BookAppointment {
        customer_id: body.customer_id,
        pet_id: body.pet_id,
        service_ids: body.service_ids,
        date: body.date,
        time: parse_time(&body.time)?,
        attendance_method: body.attendance_method,
        pet_size: body.pet_size,
        notes: body.notes,
    };

    let appointment = state.appointments.create(&identity, request).await?;
    Ok((StatusCode::CREATED, Json(AppointmentResponse::from(appointment))))
}

/// List appointments (customers only see their own)
#[utoipa::path(
    get,
    path = "/agendamentos",
    tag = "Appointments",
    security(("bearer_auth" = [])),
    params(ListAppointmentsQuery),
    responses(
        (status = 200, description = "Appointments", body = Vec<AppointmentResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Filtering by another customer")
    )
)]
pub async fn list_appointments(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Query(query): Query<ListAppointmentsQuery>,
) -> AppResult<Json<Vec<AppointmentResponse>>> {
    let filter = AppointmentFilter {
        customer_id: query.customer_id,
        status: query.status,
        date: query.date,
    };
    let appointments = state.appointments.list(&identity, filter).await?;
    Ok(Json(
        appointments
            .into_iter()
            .map(AppointmentResponse::from)
            .collect(),
    ))
}

/// Get appointment by ID
#[utoipa::path(
    get,
    path = "/agendamentos/{id}",
    tag = "Appointments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment", body = AppointmentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Appointment of another customer"),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn get_appointment(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppointmentResponse>> {
    let appointment = state.appointments.get(&identity, id).await?;
    Ok(Json(AppointmentResponse::from(appointment)))
}

/// Change appointment status (customers may only cancel a pending one)
#[utoipa::path(
    put,
    path = "/agendamentos/{id}/status",
    tag = "Appointments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Appointment ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Appointment updated", body = AppointmentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not allowed for this caller"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
pub async fn update_appointment_status(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<AppointmentResponse>> {
    let appointment = state
        .appointments
        .update_status(&identity, id, body.status)
        .await?;
    Ok(Json(AppointmentResponse::from(appointment)))
}

/// Cancel (customer) or delete (admin) an appointment
#[utoipa::path(
    delete,
    path = "/agendamentos/{id}",
    tag = "Appointments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentResponse),
        (status = 204, description = "Appointment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Appointment of another customer or no longer pending"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment already finished")
    )
)]
pub async fn delete_appointment(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let response = match state.appointments.cancel_or_delete(&identity, id).await? {
        Removal::Cancelled(appointment) => {
            Json(AppointmentResponse::from(appointment)).into_response()
        }
        Removal::Deleted => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

/// Free time slots of a day
#[utoipa::path(
    get,
    path = "/horarios-disponiveis",
    tag = "Appointments",
    security(("bearer_auth" = [])),
    params(SlotsQuery),
    responses(
        (status = 200, description = "Free slots (HH:MM) in chronological order", body = Vec<String>),
        (status = 400, description = "Missing or malformed date"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn available_slots(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Query(query): Query<SlotsQuery>,
) -> AppResult<Json<Vec<String>>> {
    let slots = state
        .appointments
        .available_slots(&identity, query.date)
        .await?;
    Ok(Json(slots.into_iter().map(format_time).collect()))
}
