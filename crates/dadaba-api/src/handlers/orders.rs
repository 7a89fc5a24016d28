//! Order transitions that trigger administrator notifications.
//!
//! The fan-out is spawned after the order is committed and never awaited, so
//! the response does not depend on notification outcome.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use dadaba_core::{Error, NewOrder, Order, OrderEvent, OrderItemInput};

use crate::error::ErrorBody;
use crate::{ApiError, AppState, AuthUser};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub items: Vec<OrderItemInput>,
    pub seats: Option<i32>,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub delivery_name: String,
    #[serde(default)]
    pub delivery_phone: String,
    #[serde(default)]
    pub delivery_location: String,
}

/// Place an order for the caller.
#[utoipa::path(post, path = "/api/orders", tag = "Orders",
    request_body = CreateOrderBody,
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Invalid order", body = ErrorBody),
        (status = 401, description = "Missing or invalid credential", body = ErrorBody),
    ))]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .orders
        .create(NewOrder {
            user_id: identity.user_id,
            items: body.items,
            seats: body.seats.unwrap_or(1),
            payment_method: body.payment_method,
            delivery_name: body.delivery_name,
            delivery_phone: body.delivery_phone,
            delivery_location: body.delivery_location,
        })
        .await?;

    info!(
        subsystem = "api",
        component = "orders",
        op = "create",
        order_id = %order.id,
        user_id = %identity.user_id,
        "Order created"
    );
    state.emitter.spawn(OrderEvent::created(&order));

    Ok((StatusCode::CREATED, Json(order)))
}

/// Confirm one of the caller's pending orders.
#[utoipa::path(post, path = "/api/orders/{id}/confirm", tag = "Orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order confirmed", body = Order),
        (status = 403, description = "Caller does not own the order", body = ErrorBody),
        (status = 404, description = "Unknown order", body = ErrorBody),
        (status = 409, description = "Order is not pending", body = ErrorBody),
    ))]
pub async fn confirm_order(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let existing = state
        .orders
        .get(id)
        .await?
        .ok_or(Error::OrderNotFound(id))?;
    if existing.user_id != identity.user_id {
        return Err(ApiError::Forbidden(
            "Only the customer who placed the order can confirm it".to_string(),
        ));
    }

    let order = state.orders.confirm(id).await?;
    info!(
        subsystem = "api",
        component = "orders",
        op = "confirm",
        order_id = %order.id,
        "Order confirmed"
    );
    state.emitter.spawn(OrderEvent::confirmed(&order));

    Ok(Json(order))
}

/// Fetch an order. Visible to its customer and to staff and above.
#[utoipa::path(get, path = "/api/orders/{id}", tag = "Orders",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order", body = Order),
        (status = 403, description = "Not visible to the caller", body = ErrorBody),
        (status = 404, description = "Unknown order", body = ErrorBody),
    ))]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .get(id)
        .await?
        .ok_or(Error::OrderNotFound(id))?;
    if order.user_id != identity.user_id && !identity.role.can_view_all_orders() {
        return Err(ApiError::Forbidden("Order not visible".to_string()));
    }
    Ok(Json(order))
}
