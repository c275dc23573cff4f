//! HTTP client for the catalog service (products, bookable services, stock).

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use common::{AppError, AppResult};
use domain::{Product, ServiceOffering};

use crate::gateway::{CallError, CallTarget, ResilientClient};
use crate::http::{send_empty, send_json};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Catalog operations used by the workflows.
///
/// Reads fail closed: an unreachable catalog looks like a missing record.
/// Stock mutations always report their failure.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn find_product(&self, id: i64) -> Option<Product>;

    async fn find_service(&self, id: i64) -> Option<ServiceOffering>;

    /// Take `quantity` units out of the product's stock.
    async fn deduct_stock(&self, product_id: i64, quantity: i32) -> AppResult<()>;

    /// Put `quantity` units back into the product's stock.
    async fn restore_stock(&self, product_id: i64, quantity: i32) -> AppResult<()>;
}

#[derive(Debug, Serialize)]
struct QuantityBody {
    quantidade: i32,
}

/// 409 and 422 always mean the stock is short. The catalog also answers 400
/// for that case, so a 400 counts only when its message is about stock.
fn refuses_for_stock(status: u16, message: &str) -> bool {
    match status {
        409 | 422 => true,
        400 => {
            let message = message.to_lowercase();
            message.contains("estoque") || message.contains("stock")
        }
        _ => false,
    }
}

/// Catalog client backed by the resilient gateway.
pub struct CatalogClient {
    gateway: ResilientClient,
    http: Client,
    target: CallTarget,
}

impl CatalogClient {
    pub fn new(gateway: ResilientClient, http: Client, base_url: &str) -> Self {
        let target = CallTarget::new("catalog", base_url);
        gateway.registry().register(&target);
        Self {
            gateway,
            http,
            target,
        }
    }

    pub fn target(&self) -> &CallTarget {
        &self.target
    }

    async fn fetch_product(&self, id: i64) -> Result<Product, CallError> {
        let url = self.target.url(&format!("/produtos/{}", id));
        self.gateway
            .execute(&self.target, || send_json::<Product>(self.http.get(&url)))
            .await
    }

    fn stock_error(&self, product_id: i64, err: CallError) -> AppError {
        match err {
            CallError::Rejected { status: 404, .. } => {
                AppError::not_found(format!("Product {}", product_id))
            }
            err if err.is_unavailable() => {
                AppError::service_unavailable(self.target.name().to_string())
            }
            err => AppError::from(err),
        }
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn find_product(&self, id: i64) -> Option<Product> {
        let url = self.target.url(&format!("/produtos/{}", id));
        self.gateway
            .call(
                &self.target,
                || {
                    let request = self.http.get(&url);
                    async move { send_json::<Product>(request).await.map(Some) }
                },
                None,
            )
            .await
    }

    async fn find_service(&self, id: i64) -> Option<ServiceOffering> {
        let url = self.target.url(&format!("/servicos/{}", id));
        self.gateway
            .call(
                &self.target,
                || {
                    let request = self.http.get(&url);
                    async move { send_json::<ServiceOffering>(request).await.map(Some) }
                },
                None,
            )
            .await
    }

    async fn deduct_stock(&self, product_id: i64, quantity: i32) -> AppResult<()> {
        let url = self
            .target
            .url(&format!("/produtos/{}/deduzir-estoque", product_id));
        let body = QuantityBody {
            quantidade: quantity,
        };

        let result = self
            .gateway
            .execute(&self.target, || send_empty(self.http.put(&url).json(&body)))
            .await;

        match result {
            Ok(()) => {
                debug!("Deducted {} unit(s) of product {}", quantity, product_id);
                Ok(())
            }
            Err(CallError::Rejected { status, message })
                if refuses_for_stock(status, &message) =>
            {
                debug!(
                    "Catalog refused deduction for product {}: {}",
                    product_id, message
                );
                Err(AppError::InsufficientStock { product_id })
            }
            Err(err) => Err(self.stock_error(product_id, err)),
        }
    }

    async fn restore_stock(&self, product_id: i64, quantity: i32) -> AppResult<()> {
        let product = self
            .fetch_product(product_id)
            .await
            .map_err(|err| self.stock_error(product_id, err))?;

        let stock = product.stock.checked_add(quantity).ok_or_else(|| {
            AppError::internal(format!(
                "Restoring {} unit(s) of product {} overflows its stock of {}",
                quantity, product_id, product.stock
            ))
        })?;

        let url = self.target.url(&format!("/produtos/{}/estoque", product_id));
        let body = QuantityBody { quantidade: stock };

        self.gateway
            .execute(&self.target, || send_empty(self.http.put(&url).json(&body)))
            .await
            .map_err(|err| {
                error!(
                    "Failed to restore {} unit(s) of product {}: {}",
                    quantity, product_id, err
                );
                self.stock_error(product_id, err)
            })?;

        debug!(
            "Restored {} unit(s) of product {} (stock now {})",
            quantity, product_id, body.quantidade
        );
        Ok(())
    }
}
