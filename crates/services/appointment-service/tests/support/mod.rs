//! In-memory collaborators for booking tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use appointment_service_lib::repository::{AppointmentFilter, AppointmentRepository};
use appointment_service_lib::service::{AppointmentBooking, BookAppointment};
use clients::{CatalogApi, CustomerApi, PetApi};
use common::{AppError, AppResult};
use domain::{
    Appointment, AppointmentStatus, AttendanceMethod, Customer, Identity, NewAppointment, Pet,
    Product, Role, ServiceOffering,
};

pub fn admin() -> Identity {
    Identity::verified("admin@petshop", Role::Admin, None)
}

pub fn customer(id: i64) -> Identity {
    Identity::verified(format!("cliente{}@petshop", id), Role::Customer, Some(id))
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

pub fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

/// Booking of pet 7 (owned by customer 1) for service 1 at `hour` on [`day`].
pub fn booking(hour: u32, method: AttendanceMethod) -> BookAppointment {
    BookAppointment {
        customer_id: 1,
        pet_id: 7,
        service_ids: vec![1],
        date: day(),
        time: at(hour),
        attendance_method: method,
        pet_size: None,
        notes: None,
    }
}

/// Catalog exposing grooming services only.
#[derive(Default)]
pub struct FakeServices {
    services: Mutex<HashMap<i64, ServiceOffering>>,
    pub lookups: AtomicI64,
}

impl FakeServices {
    pub fn with(services: &[(i64, i64)]) -> Self {
        let catalog = Self::default();
        {
            let mut map = catalog.services.lock();
            for (id, cents) in services {
                map.insert(
                    *id,
                    ServiceOffering {
                        id: *id,
                        name: format!("Servico {}", id),
                        price: Decimal::new(*cents, 2),
                    },
                );
            }
        }
        catalog
    }
}

#[async_trait]
impl CatalogApi for FakeServices {
    async fn find_product(&self, _id: i64) -> Option<Product> {
        None
    }

    async fn find_service(&self, id: i64) -> Option<ServiceOffering> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.services.lock().get(&id).cloned()
    }

    async fn deduct_stock(&self, product_id: i64, _quantity: i32) -> AppResult<()> {
        Err(AppError::not_found(format!("Product {}", product_id)))
    }

    async fn restore_stock(&self, product_id: i64, _quantity: i32) -> AppResult<()> {
        Err(AppError::not_found(format!("Product {}", product_id)))
    }
}

pub struct FakeCustomers(pub HashSet<i64>);

#[async_trait]
impl CustomerApi for FakeCustomers {
    async fn find_customer(&self, id: i64) -> Option<Customer> {
        self.0.contains(&id).then(|| Customer {
            id,
            name: format!("Cliente {}", id),
            email: None,
        })
    }
}

/// Pets keyed by id, valued by owner.
pub struct FakePets(pub HashMap<i64, i64>);

#[async_trait]
impl PetApi for FakePets {
    async fn find_pet(&self, id: i64) -> Option<Pet> {
        self.0.get(&id).map(|owner| Pet {
            id,
            name: format!("Pet {}", id),
            customer_id: *owner,
        })
    }
}

/// Appointment repository kept in memory, enforcing the active-slot
/// uniqueness the real table enforces with its partial index.
#[derive(Default)]
pub struct InMemoryAppointments {
    rows: Mutex<Vec<Appointment>>,
    next_id: AtomicI64,
}

impl InMemoryAppointments {
    pub fn all(&self) -> Vec<Appointment> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointments {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Appointment>> {
        Ok(self.rows.lock().iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self, filter: AppointmentFilter) -> AppResult<Vec<Appointment>> {
        let mut rows: Vec<Appointment> = self
            .rows
            .lock()
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.date, a.time));
        Ok(rows)
    }

    async fn taken_slots(&self, date: NaiveDate) -> AppResult<Vec<NaiveTime>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|a| a.date == date && a.occupies_slot())
            .map(|a| a.time)
            .collect())
    }

    async fn create(&self, new: NewAppointment) -> AppResult<Appointment> {
        let mut rows = self.rows.lock();
        if rows
            .iter()
            .any(|a| a.date == new.date && a.time == new.time && a.occupies_slot())
        {
            return Err(AppError::conflict("duplicate key value violates unique constraint"));
        }
        let now = Utc::now();
        let appointment = Appointment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            customer_id: new.customer_id,
            pet_id: new.pet_id,
            service_ids: new.service_ids,
            date: new.date,
            time: new.time,
            status: AppointmentStatus::Pending,
            attendance_method: new.attendance_method,
            pet_size: new.pet_size,
            total: new.total,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        rows.push(appointment.clone());
        Ok(appointment)
    }

    async fn update_status(&self, id: i64, status: AppointmentStatus) -> AppResult<Appointment> {
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::not_found(format!("Appointment {}", id)))?;
        row.status = status;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|a| a.id != id);
        if rows.len() == before {
            return Err(AppError::not_found(format!("Appointment {}", id)));
        }
        Ok(())
    }
}

/// Booking workflow over fresh fakes: customers 1 and 2, pet 7 owned by 1,
/// pet 8 owned by 2, service 1 at 50.00 and service 2 at 35.00.
pub struct Harness {
    pub catalog: Arc<FakeServices>,
    pub repo: Arc<InMemoryAppointments>,
    pub service: AppointmentBooking,
}

impl Harness {
    pub fn new() -> Self {
        let catalog = Arc::new(FakeServices::with(&[(1, 5000), (2, 3500)]));
        let customers = Arc::new(FakeCustomers([1, 2].into_iter().collect()));
        let pets = Arc::new(FakePets([(7, 1), (8, 2)].into_iter().collect()));
        let repo = Arc::new(InMemoryAppointments::default());
        let service = AppointmentBooking::new(repo.clone(), catalog.clone(), customers, pets);
        Self {
            catalog,
            repo,
            service,
        }
    }
}
