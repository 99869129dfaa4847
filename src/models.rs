//! Wire contract shared by the HTTP handlers and the embeddable client.
//!
//! Field names follow the JSON surface consumed by existing frontends:
//! camelCase identifiers with `created_at` kept verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::{order, order_product, stack};

/// An order with its nested line items, as it travels over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: i64,
    pub customer_name: String,
    pub contact_number: String,
    pub district: String,
    pub transport: String,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub products: Vec<OrderProduct>,
}

impl Order {
    /// Assembles the wire shape from an order row and its line items.
    pub fn from_parts(model: order::Model, products: Vec<order_product::Model>) -> Self {
        Self {
            order_id: model.id,
            customer_name: model.customer_name,
            contact_number: model.contact_number,
            district: model.district,
            transport: model.transport,
            created_at: model.created_at,
            status: model.status,
            products: products.into_iter().map(OrderProduct::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProduct {
    pub product_id: i64,
    pub micron: i32,
    pub meter: i32,
    pub size: String,
    pub color: String,
    pub nos: String,
    pub unit: String,
    pub quantity: i32,
}

impl From<order_product::Model> for OrderProduct {
    fn from(model: order_product::Model) -> Self {
        Self {
            product_id: model.id,
            micron: model.micron,
            meter: model.meter,
            size: model.size,
            color: model.color,
            nos: model.nos,
            unit: model.unit,
            quantity: model.quantity,
        }
    }
}

/// Body of `POST /place-order`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    // Required fields default to empty so an absent field reports the
    // same validation failure as an empty one.
    #[serde(default)]
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Contact number is required"))]
    pub contact_number: String,

    #[serde(default)]
    pub district: String,

    #[serde(default)]
    pub transport: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "At least one product is required"))]
    pub products: Vec<NewOrderProduct>,
}

/// A line item as submitted at order placement, and the body of the
/// line-item update endpoint. `nos` and `unit` fall back to their
/// server-side defaults when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderProduct {
    pub micron: i32,
    pub meter: i32,
    pub size: String,
    pub color: String,
    #[serde(default)]
    pub nos: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    pub quantity: i32,
}

/// Body of `PATCH /orders/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order_id: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub success: bool,
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// A stack (inventory) row on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub id: i64,
    pub micron: i32,
    pub meter: i32,
    pub size: String,
    pub color: String,
    pub stock: i32,
}

impl From<stack::Model> for Stack {
    fn from(model: stack::Model) -> Self {
        Self {
            id: model.id,
            micron: model.micron,
            meter: model.meter,
            size: model.size,
            color: model.color,
            stock: model.stock,
        }
    }
}

/// Body of stack create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackRequest {
    pub micron: i32,
    pub meter: i32,
    pub size: String,
    pub color: String,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StackMutationResponse {
    pub success: bool,
    pub message: String,
    pub id: i64,
}

/// Body of `POST /login` and `POST /production-login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
