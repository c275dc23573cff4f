//! Read models of data owned by peer services (catalog, customers, pets).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product as exposed by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "nome", alias = "name", default)]
    pub name: String,
    #[serde(rename = "preco", alias = "price")]
    pub price: Decimal,
    #[serde(rename = "estoque", alias = "stock")]
    pub stock: i32,
}

impl Product {
    pub fn has_stock_for(&self, quantity: i32) -> bool {
        self.stock >= quantity
    }
}

/// Bookable service (bath, grooming, ...) as exposed by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: i64,
    #[serde(rename = "nome", alias = "name", default)]
    pub name: String,
    #[serde(rename = "preco", alias = "price")]
    pub price: Decimal,
}

/// Customer as exposed by the customer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(rename = "nome", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Pet as exposed by the pet service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    #[serde(rename = "nome", alias = "name", default)]
    pub name: String,
    #[serde(rename = "clienteId", alias = "customerId")]
    pub customer_id: i64,
}
