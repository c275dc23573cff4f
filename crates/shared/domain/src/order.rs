//! Order domain entity and its status state machine.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_ORDER_ITEMS;
use crate::error::{DomainError, DomainResult};

/// Order lifecycle.
///
/// `Pending -> Confirmed -> Processing -> Shipped -> Delivered`, with
/// `Cancelled` reachable from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum OrderStatus {
    #[serde(alias = "PENDENTE")]
    Pending,
    #[serde(alias = "CONFIRMADO")]
    Confirmed,
    #[serde(alias = "PROCESSANDO")]
    Processing,
    #[serde(alias = "ENVIADO")]
    Shipped,
    #[serde(alias = "ENTREGUE")]
    Delivered,
    #[serde(alias = "CANCELADO")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// `Delivered` and `Cancelled` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether `next` is reachable from this status in one step.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed)
            | (Confirmed, Processing)
            | (Processing, Shipped)
            | (Shipped, Delivered) => true,
            (Pending | Confirmed | Processing | Shipped, Cancelled) => true,
            _ => false,
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "PENDENTE" => Ok(OrderStatus::Pending),
            "CONFIRMED" | "CONFIRMADO" => Ok(OrderStatus::Confirmed),
            "PROCESSING" | "PROCESSANDO" => Ok(OrderStatus::Processing),
            "SHIPPED" | "ENVIADO" => Ok(OrderStatus::Shipped),
            "DELIVERED" | "ENTREGUE" => Ok(OrderStatus::Delivered),
            "CANCELLED" | "CANCELADO" => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::validation(format!("Unknown order status '{}'", s))),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum PaymentMethod {
    Pix,
    CartaoCredito,
    CartaoDebito,
    Dinheiro,
    Boleto,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "PIX",
            PaymentMethod::CartaoCredito => "CARTAO_CREDITO",
            PaymentMethod::CartaoDebito => "CARTAO_DEBITO",
            PaymentMethod::Dinheiro => "DINHEIRO",
            PaymentMethod::Boleto => "BOLETO",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PIX" => Ok(PaymentMethod::Pix),
            "CARTAO_CREDITO" => Ok(PaymentMethod::CartaoCredito),
            "CARTAO_DEBITO" => Ok(PaymentMethod::CartaoDebito),
            "DINHEIRO" => Ok(PaymentMethod::Dinheiro),
            "BOLETO" => Ok(PaymentMethod::Boleto),
            _ => Err(DomainError::validation(format!(
                "Unknown payment method '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product line of an order. The unit price is a snapshot taken at
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl OrderItem {
    /// Create an item, computing its subtotal.
    pub fn new(product_id: i64, quantity: i32, unit_price: Decimal) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation(format!(
                "Quantity for product {} must be greater than zero",
                product_id
            )));
        }
        if unit_price.is_sign_negative() {
            return Err(DomainError::validation(format!(
                "Price for product {} cannot be negative",
                product_id
            )));
        }

        Ok(Self {
            product_id,
            quantity,
            unit_price,
            subtotal: unit_price * Decimal::from(quantity),
        })
    }
}

/// Product and quantity requested by a caller, before pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

/// Check a requested item list before any peer service is contacted.
pub fn validate_item_requests(items: &[ItemRequest]) -> DomainResult<()> {
    if items.is_empty() {
        return Err(DomainError::validation("Order must contain at least one item"));
    }
    if items.len() > MAX_ORDER_ITEMS {
        return Err(DomainError::validation(format!(
            "Order cannot contain more than {} items",
            MAX_ORDER_ITEMS
        )));
    }

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "Quantity for product {} must be greater than zero",
                item.product_id
            )));
        }
        if !seen.insert(item.product_id) {
            return Err(DomainError::validation(format!(
                "Product {} appears more than once",
                item.product_id
            )));
        }
    }

    Ok(())
}

/// Sum of item subtotals.
pub fn order_total(items: &[OrderItem]) -> Decimal {
    items.iter().map(|item| item.subtotal).sum()
}

/// Order ready to be persisted (no id yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub items: Vec<OrderItem>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub total: Decimal,
}

impl NewOrder {
    /// Build a pending order, computing its total from the items.
    pub fn new(
        customer_id: i64,
        payment_method: PaymentMethod,
        notes: Option<String>,
        items: Vec<OrderItem>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("Order must contain at least one item"));
        }

        let total = order_total(&items);
        Ok(Self {
            customer_id,
            items,
            payment_method,
            notes,
            total,
        })
    }
}

/// Persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Validate a status change, returning `Conflict` when `next` is not
    /// reachable from the current status.
    pub fn ensure_transition(&self, next: OrderStatus) -> DomainResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "Order {} cannot move from {} to {}",
                self.id, self.status, next
            )))
        }
    }

    /// Only pending or cancelled orders may be removed.
    pub fn ensure_deletable(&self) -> DomainResult<()> {
        match self.status {
            OrderStatus::Pending | OrderStatus::Cancelled => Ok(()),
            status => Err(DomainError::conflict(format!(
                "Order {} is {}; cancel it before deleting",
                self.id, status
            ))),
        }
    }

    /// Whether the stored total still equals the sum of its items.
    pub fn is_consistent(&self) -> bool {
        self.total == order_total(&self.items) && self.items.iter().all(|i| i.quantity > 0)
    }
}
