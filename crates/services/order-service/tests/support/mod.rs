//! In-memory collaborators for order workflow tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use clients::{CatalogApi, CustomerApi};
use common::{AppError, AppResult};
use domain::{Customer, Identity, NewOrder, Order, OrderStatus, Product, Role, ServiceOffering};
use order_service_lib::repository::{OrderFilter, OrderRepository};
use order_service_lib::service::OrderFulfillment;

pub fn admin() -> Identity {
    Identity::verified("admin@petshop", Role::Admin, None)
}

pub fn customer(id: i64) -> Identity {
    Identity::verified(format!("cliente{}@petshop", id), Role::Customer, Some(id))
}

pub fn product(id: i64, cents: i64, stock: i32) -> Product {
    Product {
        id,
        name: format!("Produto {}", id),
        price: Decimal::new(cents, 2),
        stock,
    }
}

/// Catalog holding real stock counts.
#[derive(Default)]
pub struct FakeCatalog {
    products: Mutex<HashMap<i64, Product>>,
    failing_deductions: Mutex<HashSet<i64>>,
    failing_restores: Mutex<HashSet<i64>>,
    /// `(product_id, quantity)` of every successful restoration
    pub restorations: Mutex<Vec<(i64, i32)>>,
    /// `(product_id, quantity)` of every successful deduction
    pub deductions: Mutex<Vec<(i64, i32)>>,
}

impl FakeCatalog {
    pub fn with_products(products: Vec<Product>) -> Self {
        let catalog = Self::default();
        {
            let mut map = catalog.products.lock();
            for p in products {
                map.insert(p.id, p);
            }
        }
        catalog
    }

    pub fn stock(&self, id: i64) -> i32 {
        self.products.lock().get(&id).map(|p| p.stock).unwrap_or_default()
    }

    pub fn set_stock(&self, id: i64, stock: i32) {
        if let Some(p) = self.products.lock().get_mut(&id) {
            p.stock = stock;
        }
    }

    pub fn fail_deduction_for(&self, id: i64) {
        self.failing_deductions.lock().insert(id);
    }

    pub fn fail_restore_for(&self, id: i64) {
        self.failing_restores.lock().insert(id);
    }

    pub fn allow_restore_for(&self, id: i64) {
        self.failing_restores.lock().remove(&id);
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn find_product(&self, id: i64) -> Option<Product> {
        self.products.lock().get(&id).cloned()
    }

    async fn find_service(&self, _id: i64) -> Option<ServiceOffering> {
        None
    }

    async fn deduct_stock(&self, product_id: i64, quantity: i32) -> AppResult<()> {
        if self.failing_deductions.lock().contains(&product_id) {
            return Err(AppError::service_unavailable("catalog"));
        }
        let mut products = self.products.lock();
        let product = products
            .get_mut(&product_id)
            .ok_or_else(|| AppError::not_found(format!("Product {}", product_id)))?;
        if product.stock < quantity {
            return Err(AppError::InsufficientStock { product_id });
        }
        product.stock -= quantity;
        self.deductions.lock().push((product_id, quantity));
        Ok(())
    }

    async fn restore_stock(&self, product_id: i64, quantity: i32) -> AppResult<()> {
        if self.failing_restores.lock().contains(&product_id) {
            return Err(AppError::service_unavailable("catalog (restore)"));
        }
        let mut products = self.products.lock();
        let product = products
            .get_mut(&product_id)
            .ok_or_else(|| AppError::not_found(format!("Product {}", product_id)))?;
        product.stock += quantity;
        self.restorations.lock().push((product_id, quantity));
        Ok(())
    }
}

/// Customer directory with a fixed set of ids.
pub struct FakeCustomers(pub HashSet<i64>);

impl FakeCustomers {
    pub fn with_ids(ids: &[i64]) -> Self {
        Self(ids.iter().copied().collect())
    }
}

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

/// Order repository kept in memory.
#[derive(Default)]
pub struct InMemoryOrders {
    orders: Mutex<Vec<Order>>,
    next_id: AtomicI64,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl InMemoryOrders {
    pub fn all(&self) -> Vec<Order> {
        self.orders.lock().clone()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Order>> {
        Ok(self.orders.lock().iter().find(|o| o.id == id).cloned())
    }

    async fn list(&self, filter: OrderFilter) -> AppResult<Vec<Order>> {
        Ok(self
            .orders
            .lock()
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect())
    }

    async fn create(&self, order: NewOrder) -> AppResult<Order> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::internal("connection refused"));
        }
        let now = Utc::now();
        let order = Order {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            customer_id: order.customer_id,
            items: order.items,
            status: OrderStatus::Pending,
            payment_method: order.payment_method,
            notes: order.notes,
            total: order.total,
            created_at: now,
            updated_at: now,
        };
        self.orders.lock().push(order.clone());
        Ok(order)
    }

    async fn update_status(&self, id: i64, status: OrderStatus) -> AppResult<Order> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(AppError::internal("connection refused"));
        }
        let mut orders = self.orders.lock();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| AppError::not_found(format!("Order {}", id)))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::internal("connection refused"));
        }
        let mut orders = self.orders.lock();
        let before = orders.len();
        orders.retain(|o| o.id != id);
        if orders.len() == before {
            return Err(AppError::not_found(format!("Order {}", id)));
        }
        Ok(())
    }
}

/// Workflow wired to fresh fakes.
pub struct Harness {
    pub catalog: Arc<FakeCatalog>,
    pub customers: Arc<FakeCustomers>,
    pub repo: Arc<InMemoryOrders>,
    pub service: OrderFulfillment,
}

impl Harness {
    pub fn new(products: Vec<Product>, customer_ids: &[i64]) -> Self {
        let catalog = Arc::new(FakeCatalog::with_products(products));
        let customers = Arc::new(FakeCustomers::with_ids(customer_ids));
        let repo = Arc::new(InMemoryOrders::default());
        let service = OrderFulfillment::new(repo.clone(), catalog.clone(), customers.clone());
        Self {
            catalog,
            customers,
            repo,
            service,
        }
    }
}
