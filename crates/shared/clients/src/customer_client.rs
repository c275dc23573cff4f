//! HTTP client for the customer service.

use async_trait::async_trait;
use reqwest::Client;

use domain::Customer;

use crate::gateway::{CallTarget, ResilientClient};
use crate::http::send_json;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CustomerApi: Send + Sync {
    /// `None` when the customer does not exist or the service is unreachable.
    async fn find_customer(&self, id: i64) -> Option<Customer>;
}

pub struct CustomerClient {
    gateway: ResilientClient,
    http: Client,
    target: CallTarget,
}

impl CustomerClient {
    pub fn new(gateway: ResilientClient, http: Client, base_url: &str) -> Self {
        let target = CallTarget::new("customers", base_url);
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
}

#[async_trait]
impl CustomerApi for CustomerClient {
    async fn find_customer(&self, id: i64) -> Option<Customer> {
        let url = self.target.url(&format!("/clientes/{}", id));
        self.gateway
            .call(
                &self.target,
                || {
                    let request = self.http.get(&url);
                    async move { send_json::<Customer>(request).await.map(Some) }
                },
                None,
            )
            .await
    }
}
