//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::health_handler::{HealthResponse, ServiceHealth};
use crate::handlers::order_handler::{
    CreateOrderRequest, OrderItemRequest, OrderItemResponse, OrderResponse, UpdateStatusRequest,
};
use domain::{OrderStatus, PaymentMethod};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::order_handler::create_order,
        crate::handlers::order_handler::list_orders,
        crate::handlers::order_handler::get_order,
        crate::handlers::order_handler::update_order_status,
        crate::handlers::order_handler::delete_order,
    ),
    components(
        schemas(
            CreateOrderRequest,
            OrderItemRequest,
            UpdateStatusRequest,
            OrderResponse,
            OrderItemResponse,
            OrderStatus,
            PaymentMethod,
            HealthResponse,
            ServiceHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Orders", description = "Order placement and fulfillment"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
