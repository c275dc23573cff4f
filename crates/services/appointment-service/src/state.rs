//! Application state for dependency injection.

use std::sync::Arc;

use clients::ResilientClient;
use common::AuthorizationGate;

use crate::infra::Database;
use crate::service::AppointmentService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub appointments: Arc<dyn AppointmentService>,
    pub gate: AuthorizationGate,
    /// Gateway shared by the peer clients, read for health reporting
    pub gateway: ResilientClient,
    /// `None` when running without a database (tests)
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(
        appointments: Arc<dyn AppointmentService>,
        gate: AuthorizationGate,
        gateway: ResilientClient,
        database: Option<Database>,
    ) -> Self {
        Self {
            appointments,
            gate,
            gateway,
            database,
        }
    }
}
