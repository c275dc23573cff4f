//! HTTP client for the pet service.

use async_trait::async_trait;
use reqwest::Client;

use domain::Pet;

use crate::gateway::{CallTarget, ResilientClient};
use crate::http::send_json;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PetApi: Send + Sync {
    /// `None` when the pet does not exist or the service is unreachable.
    async fn find_pet(&self, id: i64) -> Option<Pet>;
}

pub struct PetClient {
    gateway: ResilientClient,
    http: Client,
    target: CallTarget,
}

impl PetClient {
    pub fn new(gateway: ResilientClient, http: Client, base_url: &str) -> Self {
        let target = CallTarget::new("pets", base_url);
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
impl PetApi for PetClient {
    async fn find_pet(&self, id: i64) -> Option<Pet> {
        let url = self.target.url(&format!("/pets/{}", id));
        self.gateway
            .call(
                &self.target,
                || {
                    let request = self.http.get(&url);
                    async move { send_json::<Pet>(request).await.map(Some) }
                },
                None,
            )
            .await
    }
}
