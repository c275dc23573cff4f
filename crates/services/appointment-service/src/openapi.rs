//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::appointment_handler::{
    AppointmentResponse, CreateAppointmentRequest, UpdateStatusRequest,
};
use crate::handlers::health_handler::{HealthResponse, ServiceHealth};
use domain::{AppointmentStatus, AttendanceMethod, PetSize};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::appointment_handler::create_appointment,
        crate::handlers::appointment_handler::list_appointments,
        crate::handlers::appointment_handler::get_appointment,
        crate::handlers::appointment_handler::update_appointment_status,
        crate::handlers::appointment_handler::delete_appointment,
        crate::handlers::appointment_handler::available_slots,
    ),
    components(
        schemas(
            CreateAppointmentRequest,
            UpdateStatusRequest,
            AppointmentResponse,
            AppointmentStatus,
            AttendanceMethod,
            PetSize,
            HealthResponse,
            ServiceHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Appointments", description = "Grooming and care appointment booking"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
