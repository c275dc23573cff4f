//! Order database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{Order, OrderItem, OrderStatus, PaymentMethod};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub customer_id: i64,
    /// Serialized `Vec<OrderItem>`
    #[sea_orm(column_type = "JsonBinary")]
    pub items: Json,
    pub status: String,
    pub payment_method: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert a database row to the domain entity. Fails only on rows written
/// by something other than this service.
impl TryFrom<Model> for Order {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let items: Vec<OrderItem> = serde_json::from_value(model.items).map_err(|e| {
            AppError::internal(format!("Order {} has malformed items: {}", model.id, e))
        })?;
        let status: OrderStatus = model.status.parse()?;
        let payment_method: PaymentMethod = model.payment_method.parse()?;

        Ok(Order {
            id: model.id,
            customer_id: model.customer_id,
            items,
            status,
            payment_method,
            notes: model.notes,
            total: model.total,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
