//! Order handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use common::http::ValidatedJson;
use common::AppResult;
use domain::{Identity, ItemRequest, Order, OrderItem, OrderStatus, PaymentMethod};

use crate::repository::OrderFilter;
use crate::service::CreateOrder;
use crate::state::AppState;

/// Requested product line
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    #[serde(rename = "produtoId")]
    #[schema(example = 10)]
    pub product_id: i64,
    #[serde(rename = "quantidade")]
    #[schema(example = 2)]
    pub quantity: i32,
}

/// Order creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[serde(rename = "clienteId")]
    #[schema(example = 1)]
    pub customer_id: i64,
    #[serde(rename = "formaPagamento")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "observacoes", default)]
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    pub notes: Option<String>,
    #[serde(rename = "itens")]
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
}

/// Status change request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersQuery {
    /// Only orders of this customer
    #[serde(rename = "clienteId")]
    #[param(rename = "clienteId")]
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    #[serde(rename = "produtoId")]
    pub product_id: i64,
    #[serde(rename = "quantidade")]
    pub quantity: i32,
    #[serde(rename = "precoUnitario")]
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    #[serde(rename = "clienteId")]
    pub customer_id: i64,
    #[serde(rename = "itens")]
    pub items: Vec<OrderItemResponse>,
    pub status: OrderStatus,
    #[serde(rename = "formaPagamento")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "observacoes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub total: Decimal,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
            status: order.status,
            payment_method: order.payment_method,
            notes: order.notes,
            total: order.total,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Create order routes
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).delete(delete_order))
        .route("/:id/status", put(update_order_status))
}

/// Place an order, reserving stock for every item
#[utoipa::path(
    post,
    path = "/pedidos",
    tag = "Orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid items"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Ordering for another customer"),
        (status = 404, description = "Customer or product not found"),
        (status = 409, description = "Insufficient stock"),
        (status = 503, description = "Catalog or customer service unavailable")
    )
)]
pub async fn create_order(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    let request = CreateOrder {
        customer_id: body.customer_id,
        payment_method: body.payment_method,
        notes: body.notes,
        items: body
            .items
            .into_iter()
            .map(|item| ItemRequest {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
    };

    let order = state.orders.create(&identity, request).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

/// List orders (customers only see their own)
#[utoipa::path(
    get,
    path = "/pedidos",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Orders", body = Vec<OrderResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Filtering by another customer")
    )
)]
pub async fn list_orders(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<Vec<OrderResponse>>> {
    let filter = OrderFilter {
        customer_id: query.customer_id,
        status: query.status,
    };
    let orders = state.orders.list(&identity, filter).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Get order by ID
#[utoipa::path(
    get,
    path = "/pedidos/{id}",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Order of another customer"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderResponse>> {
    let order = state.orders.get(&identity, id).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Change order status (customers may only cancel)
#[utoipa::path(
    put,
    path = "/pedidos/{id}/status",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not allowed for this caller"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
        (status = 503, description = "Catalog unavailable while restoring stock")
    )
)]
pub async fn update_order_status(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<OrderResponse>> {
    let order = state.orders.update_status(&identity, id, body.status).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Delete a pending or cancelled order
#[utoipa::path(
    delete,
    path = "/pedidos/{id}",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Order of another customer"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is neither pending nor cancelled")
    )
)]
pub async fn delete_order(
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.orders.delete(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
