//! Order fulfillment: stock reservation on creation, restoration on
//! cancellation or deletion, compensation when a step fails midway.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use clients::{CatalogApi, CustomerApi};
use common::{AppError, AppResult, AuthorizationGate, OptionExt};
use domain::{
    validate_item_requests, Identity, ItemRequest, NewOrder, Order, OrderItem, OrderStatus,
    PaymentMethod, Role,
};

use crate::repository::{OrderFilter, OrderRepository};

const ANY_ROLE: &[Role] = &[Role::Admin, Role::Customer];

/// Input of [`OrderService::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    pub customer_id: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub items: Vec<ItemRequest>,
}

/// Order use cases. Every operation takes the caller's identity and applies
/// the role and ownership rules itself.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Reserve stock and persist a `PENDING` order.
    async fn create(&self, identity: &Identity, request: CreateOrder) -> AppResult<Order>;

    async fn get(&self, identity: &Identity, id: i64) -> AppResult<Order>;

    /// Customers are always restricted to their own orders.
    async fn list(&self, identity: &Identity, filter: OrderFilter) -> AppResult<Vec<Order>>;

    /// Move an order through its lifecycle. Cancelling gives the stock back.
    async fn update_status(&self, identity: &Identity, id: i64, status: OrderStatus)
        -> AppResult<Order>;

    /// Remove a `PENDING` or `CANCELLED` order. Pending stock is given back.
    async fn delete(&self, identity: &Identity, id: i64) -> AppResult<()>;
}

/// [`OrderService`] backed by the repository and the catalog/customer peers.
pub struct OrderFulfillment {
    repo: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogApi>,
    customers: Arc<dyn CustomerApi>,
}

impl OrderFulfillment {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogApi>,
        customers: Arc<dyn CustomerApi>,
    ) -> Self {
        Self {
            repo,
            catalog,
            customers,
        }
    }

    async fn load(&self, identity: &Identity, id: i64) -> AppResult<Order> {
        AuthorizationGate::require_role(identity, ANY_ROLE)?;
        let order = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_not_found(format!("Order {}", id))?;
        AuthorizationGate::require_ownership(identity, order.customer_id)?;
        Ok(order)
    }

    /// Price every requested item against the current catalog and check its
    /// stock. Nothing is mutated.
    async fn price_items(&self, requests: &[ItemRequest]) -> AppResult<Vec<OrderItem>> {
        let mut items = Vec::with_capacity(requests.len());
        for request in requests {
            let product = self
                .catalog
                .find_product(request.product_id)
                .await
                .ok_or_not_found(format!("Product {}", request.product_id))?;

            if !product.has_stock_for(request.quantity) {
                return Err(AppError::InsufficientStock {
                    product_id: request.product_id,
                });
            }

            items.push(OrderItem::new(product.id, request.quantity, product.price)?);
        }
        Ok(items)
    }

    /// Deduct stock for every item. On failure the deductions already made
    /// are restored and the deduction error is returned, unless restoring
    /// fails too, in which case that failure is returned instead.
    async fn reserve(&self, items: &[OrderItem]) -> AppResult<()> {
        for (index, item) in items.iter().enumerate() {
            if let Err(err) = self.catalog.deduct_stock(item.product_id, item.quantity).await {
                warn!(
                    "Stock deduction failed for product {}: {}; rolling back {} item(s)",
                    item.product_id,
                    err,
                    index
                );
                self.release(&items[..index]).await?;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Give back the stock of `items`, newest first. Either every item is
    /// restored or none is: after a failed restore the items already given
    /// back are deducted again. A failure of that re-deduction is returned in
    /// place of the restore failure.
    async fn release(&self, items: &[OrderItem]) -> AppResult<()> {
        let mut restored: Vec<&OrderItem> = Vec::with_capacity(items.len());
        for item in items.iter().rev() {
            if let Err(err) = self.catalog.restore_stock(item.product_id, item.quantity).await {
                error!(
                    "Failed to restore {} unit(s) of product {}: {}; re-deducting {} item(s)",
                    item.quantity,
                    item.product_id,
                    err,
                    restored.len()
                );
                self.reclaim(&restored).await?;
                return Err(err);
            }
            restored.push(item);
        }
        Ok(())
    }

    /// Deduct again the stock a failed `release` had already given back.
    async fn reclaim(&self, restored: &[&OrderItem]) -> AppResult<()> {
        for item in restored.iter().rev() {
            if let Err(err) = self.catalog.deduct_stock(item.product_id, item.quantity).await {
                error!(
                    "Product {} keeps {} restored unit(s) of an uncancelled order: {}",
                    item.product_id, item.quantity, err
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// Restore the order's stock, then persist `CANCELLED`. When the write
    /// fails the stock is reserved again; if that fails too, both failures
    /// are reported together.
    async fn cancel(&self, order: &Order) -> AppResult<Order> {
        self.release(&order.items).await?;

        let err = match self.repo.update_status(order.id, OrderStatus::Cancelled).await {
            Ok(updated) => {
                info!("Order {} moved from {} to CANCELLED", order.id, order.status);
                return Ok(updated);
            }
            Err(err) => err,
        };

        error!("Failed to persist cancellation of order {}: {}", order.id, err);
        match self.reserve(&order.items).await {
            Ok(()) => Err(err),
            Err(reserve_err) => Err(AppError::internal(format!(
                "Order {} was not cancelled ({}) and could not re-reserve its stock ({})",
                order.id, err, reserve_err
            ))),
        }
    }
}

#[async_trait]
impl OrderService for OrderFulfillment {
    async fn create(&self, identity: &Identity, request: CreateOrder) -> AppResult<Order> {
        validate_item_requests(&request.items)?;
        AuthorizationGate::require_role(identity, ANY_ROLE)?;
        AuthorizationGate::require_ownership(identity, request.customer_id)?;

        self.customers
            .find_customer(request.customer_id)
            .await
            .ok_or_not_found(format!("Customer {}", request.customer_id))?;

        let items = self.price_items(&request.items).await?;
        let new_order = NewOrder::new(
            request.customer_id,
            request.payment_method,
            request.notes,
            items,
        )?;

        self.reserve(&new_order.items).await?;

        match self.repo.create(new_order.clone()).await {
            Ok(order) => {
                info!(
                    "Order {} created for customer {} (total {})",
                    order.id, order.customer_id, order.total
                );
                Ok(order)
            }
            Err(err) => {
                error!("Failed to persist order, releasing reserved stock: {}", err);
                self.release(&new_order.items).await?;
                Err(err)
            }
        }
    }

    async fn get(&self, identity: &Identity, id: i64) -> AppResult<Order> {
        self.load(identity, id).await
    }

    async fn list(&self, identity: &Identity, filter: OrderFilter) -> AppResult<Vec<Order>> {
        let customer_id = AuthorizationGate::scope_owner_filter(identity, filter.customer_id)?;
        self.repo
            .list(OrderFilter {
                customer_id,
                ..filter
            })
            .await
    }

    async fn update_status(
        &self,
        identity: &Identity,
        id: i64,
        status: OrderStatus,
    ) -> AppResult<Order> {
        let order = self.load(identity, id).await?;

        if !identity.is_admin() && status != OrderStatus::Cancelled {
            return Err(AppError::Forbidden);
        }

        if order.status == OrderStatus::Cancelled && status == OrderStatus::Cancelled {
            return Ok(order);
        }
        order.ensure_transition(status)?;

        if status == OrderStatus::Cancelled {
            return self.cancel(&order).await;
        }

        let updated = self.repo.update_status(id, status).await?;
        info!("Order {} moved from {} to {}", id, order.status, status);
        Ok(updated)
    }

    async fn delete(&self, identity: &Identity, id: i64) -> AppResult<()> {
        let order = self.load(identity, id).await?;
        order.ensure_deletable()?;

        // Cancelled first, so a failed delete leaves a cancelled order
        // rather than a pending one whose stock is already back
        if order.status == OrderStatus::Pending {
            self.cancel(&order).await?;
        }

        self.repo.delete(id).await?;
        info!("Order {} deleted", id);
        Ok(())
    }
}
