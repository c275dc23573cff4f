//! Appointment domain entity, its status state machine and daily slots.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{telebusca_surcharge, FIRST_SLOT_HOUR, LAST_SLOT_HOUR};
use crate::error::{DomainError, DomainResult};

/// Appointment lifecycle.
///
/// `Pending -> Confirmed -> InProgress -> Done`, with `Cancelled` reachable
/// from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AppointmentStatus {
    #[serde(alias = "PENDENTE", alias = "AGENDADO")]
    Pending,
    #[serde(alias = "CONFIRMADO")]
    Confirmed,
    #[serde(alias = "EM_ANDAMENTO")]
    InProgress,
    #[serde(alias = "CONCLUIDO")]
    Done,
    #[serde(alias = "CANCELADO")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::InProgress => "IN_PROGRESS",
            AppointmentStatus::Done => "DONE",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Done | AppointmentStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match (self, next) {
            (Pending, Confirmed) | (Confirmed, InProgress) | (InProgress, Done) => true,
            (Pending | Confirmed | InProgress, Cancelled) => true,
            _ => false,
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "PENDENTE" | "AGENDADO" => Ok(AppointmentStatus::Pending),
            "CONFIRMED" | "CONFIRMADO" => Ok(AppointmentStatus::Confirmed),
            "IN_PROGRESS" | "EM_ANDAMENTO" => Ok(AppointmentStatus::InProgress),
            "DONE" | "CONCLUIDO" => Ok(AppointmentStatus::Done),
            "CANCELLED" | "CANCELADO" => Ok(AppointmentStatus::Cancelled),
            _ => Err(DomainError::validation(format!(
                "Unknown appointment status '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the pet gets to the shop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AttendanceMethod {
    /// Customer brings the pet to the store
    #[default]
    Presencial,
    /// Shop picks the pet up and brings it back
    Telebusca,
}

impl AttendanceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceMethod::Presencial => "presencial",
            AttendanceMethod::Telebusca => "telebusca",
        }
    }

    /// Fixed amount added on top of the service prices.
    pub fn surcharge(&self) -> Decimal {
        match self {
            AttendanceMethod::Presencial => Decimal::ZERO,
            AttendanceMethod::Telebusca => telebusca_surcharge(),
        }
    }
}

impl FromStr for AttendanceMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "presencial" => Ok(AttendanceMethod::Presencial),
            "telebusca" => Ok(AttendanceMethod::Telebusca),
            _ => Err(DomainError::validation(format!(
                "Unknown attendance method '{}'",
                s
            ))),
        }
    }
}

/// Pet size declared at booking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum PetSize {
    Pequeno,
    Medio,
    Grande,
}

impl PetSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetSize::Pequeno => "PEQUENO",
            PetSize::Medio => "MEDIO",
            PetSize::Grande => "GRANDE",
        }
    }
}

impl FromStr for PetSize {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PEQUENO" => Ok(PetSize::Pequeno),
            "MEDIO" => Ok(PetSize::Medio),
            "GRANDE" => Ok(PetSize::Grande),
            _ => Err(DomainError::validation(format!("Unknown pet size '{}'", s))),
        }
    }
}

// =============================================================================
// Slots
// =============================================================================

/// Bookable times of a day, in chronological order.
pub fn daily_slots() -> Vec<NaiveTime> {
    (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .collect()
}

pub fn is_daily_slot(time: NaiveTime) -> bool {
    daily_slots().contains(&time)
}

/// Daily slots not present in `taken`.
pub fn free_slots(taken: &[NaiveTime]) -> Vec<NaiveTime> {
    daily_slots()
        .into_iter()
        .filter(|slot| !taken.contains(slot))
        .collect()
}

/// Price snapshot of a booking.
pub fn appointment_total(service_prices: &[Decimal], method: AttendanceMethod) -> Decimal {
    service_prices.iter().copied().sum::<Decimal>() + method.surcharge()
}

/// Check the service list of a booking request.
pub fn validate_service_ids(service_ids: &[i64]) -> DomainResult<()> {
    if service_ids.is_empty() {
        return Err(DomainError::validation(
            "Appointment must include at least one service",
        ));
    }
    let mut seen = HashSet::with_capacity(service_ids.len());
    if let Some(dup) = service_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(DomainError::validation(format!(
            "Service {} appears more than once",
            dup
        )));
    }
    Ok(())
}

// =============================================================================
// Entity
// =============================================================================

/// Appointment ready to be persisted (no id yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub customer_id: i64,
    pub pet_id: i64,
    pub service_ids: Vec<i64>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub attendance_method: AttendanceMethod,
    pub pet_size: Option<PetSize>,
    pub notes: Option<String>,
    pub total: Decimal,
}

/// Persisted appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub customer_id: i64,
    pub pet_id: i64,
    pub service_ids: Vec<i64>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub attendance_method: AttendanceMethod,
    pub pet_size: Option<PetSize>,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether this appointment blocks its `(date, time)` slot.
    pub fn occupies_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    pub fn ensure_transition(&self, next: AppointmentStatus) -> DomainResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "Appointment {} cannot move from {} to {}",
                self.id, self.status, next
            )))
        }
    }
}
