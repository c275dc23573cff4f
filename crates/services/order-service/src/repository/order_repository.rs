//! Order repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, NotSet,
    QueryFilter, QueryOrder, Set,
};

use super::entities::order::{self, ActiveModel, Entity as OrderEntity};
use common::{AppError, AppResult};
use domain::{NewOrder, Order, OrderStatus};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Listing filters; `None` means no restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.customer_id.map_or(true, |id| order.customer_id == id)
            && self.status.map_or(true, |status| order.status == status)
    }
}

/// Order repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Order>>;

    /// Orders matching the filter, newest first
    async fn list(&self, filter: OrderFilter) -> AppResult<Vec<Order>>;

    /// Persist a new order as `PENDING`
    async fn create(&self, order: NewOrder) -> AppResult<Order>;

    async fn update_status(&self, id: i64, status: OrderStatus) -> AppResult<Order>;

    async fn delete(&self, id: i64) -> AppResult<()>;
}

/// SeaORM-backed order repository
pub struct OrderStore {
    db: DatabaseConnection,
}

impl OrderStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepository for OrderStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Order>> {
        OrderEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?
            .map(Order::try_from)
            .transpose()
    }

    async fn list(&self, filter: OrderFilter) -> AppResult<Vec<Order>> {
        let mut query = OrderEntity::find();
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(order::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status.as_str()));
        }

        query
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    async fn create(&self, order: NewOrder) -> AppResult<Order> {
        let now = Utc::now();
        let items = serde_json::to_value(&order.items)
            .map_err(|e| AppError::internal(format!("Failed to serialize order items: {}", e)))?;

        let model = ActiveModel {
            id: NotSet,
            customer_id: Set(order.customer_id),
            items: Set(items),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            payment_method: Set(order.payment_method.as_str().to_string()),
            notes: Set(order.notes),
            total: Set(order.total),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = model.insert(&self.db).await.map_err(AppError::from)?;
        Order::try_from(model)
    }

    async fn update_status(&self, id: i64, status: OrderStatus) -> AppResult<Order> {
        let model = OrderEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Order {}", id)))?;

        let mut active = model.into_active_model();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Order::try_from(model)
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = OrderEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found(format!("Order {}", id)));
        }
        Ok(())
    }
}
