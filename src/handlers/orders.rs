use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    errors::ServiceError,
    models::{
        MessageResponse, NewOrderProduct, OrderProduct, OrdersResponse, PlaceOrderRequest,
        PlaceOrderResponse, UpdateOrderStatusRequest,
    },
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub include_completed: bool,
}

/// POST /place-order
pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), ServiceError> {
    let placed = state.services.orders.place_order(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            success: true,
            order_id: placed.order_id,
            message: "Order placed successfully".to_string(),
        }),
    ))
}

/// GET /orders
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<OrdersResponse>, ServiceError> {
    let orders = state
        .services
        .orders
        .list_orders(query.include_completed)
        .await?;

    Ok(Json(OrdersResponse {
        success: true,
        orders,
    }))
}

/// PATCH /orders/:id
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state
        .services
        .orders
        .update_order_status(order_id, request.status)
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Order status updated successfully".to_string(),
    }))
}

/// DELETE /orders/:orderId
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.services.orders.delete_order(order_id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Order deleted successfully".to_string(),
    }))
}

/// PUT /orders/:orderId/products/:productId
///
/// Line items are addressed by their durable product id, not by the
/// position they happened to occupy in a previously fetched array.
pub async fn update_line_item(
    State(state): State<AppState>,
    Path((order_id, product_id)): Path<(i64, i64)>,
    Json(item): Json<NewOrderProduct>,
) -> Result<Json<OrderProduct>, ServiceError> {
    let updated = state
        .services
        .orders
        .update_line_item(order_id, product_id, item)
        .await?;

    Ok(Json(updated))
}

/// POST /orders/:id/complete
pub async fn complete_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.services.orders.complete_order(order_id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Order marked as completed".to_string(),
    }))
}
