use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, STATUS_COMPLETED,
    },
    entities::order_product::{
        self, ActiveModel as OrderProductActiveModel, Entity as OrderProductEntity, DEFAULT_UNIT,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{NewOrderProduct, Order, OrderProduct, PlaceOrderRequest},
};

/// Service for placing, listing and mutating orders. All multi-row
/// writes run inside a single transaction on the shared pool.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Creates an order together with all of its line items, atomically.
    /// Either the order row and every product row commit, or none do.
    #[instrument(skip(self, request), fields(customer_name = %request.customer_name))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, ServiceError> {
        request.validate().map_err(|_| {
            ServiceError::ValidationError(
                "Customer name, contact number, and at least one product are required".to_string(),
            )
        })?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order placement");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = OrderActiveModel {
            customer_name: Set(request.customer_name),
            contact_number: Set(request.contact_number),
            district: Set(request.district),
            transport: Set(request.transport),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create order row");
            ServiceError::DatabaseError(e)
        })?;

        let order_id = order_model.id;
        let product_rows: Vec<OrderProductActiveModel> = request
            .products
            .into_iter()
            .map(|p| new_product_row(order_id, p))
            .collect();

        // Dropping the transaction on any failure below rolls everything
        // back, including the order row inserted above.
        OrderProductEntity::insert_many(product_rows)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to insert order products");
                ServiceError::DatabaseError(e)
            })?;

        let products = OrderProductEntity::find()
            .filter(order_product::Column::OrderId.eq(order_id))
            .order_by_asc(order_product::Column::Id)
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to commit order placement");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id, "Order placed successfully");

        let placed = Order::from_parts(order_model, products);
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderPlaced(placed.clone())).await {
                warn!(error = %e, order_id, "Failed to send order placed event");
            }
        }

        Ok(placed)
    }

    /// Lists orders newest-first with their line items nested. Orders
    /// without line items appear with an empty products list. Completed
    /// orders are excluded unless `include_completed` is set.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, include_completed: bool) -> Result<Vec<Order>, ServiceError> {
        let db = &*self.db;

        let mut query = OrderEntity::find();
        if !include_completed {
            query = query.filter(order::Column::Status.ne(STATUS_COMPLETED));
        }
        let orders = query
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch orders");
                ServiceError::DatabaseError(e)
            })?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let products = OrderProductEntity::find()
            .filter(order_product::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_product::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch order products");
                ServiceError::DatabaseError(e)
            })?;

        let mut by_order: HashMap<i64, Vec<order_product::Model>> = HashMap::new();
        for product in products {
            by_order.entry(product.order_id).or_default().push(product);
        }

        Ok(orders
            .into_iter()
            .map(|o| {
                let items = by_order.remove(&o.id).unwrap_or_default();
                Order::from_parts(o, items)
            })
            .collect())
    }

    /// Updates an order's status; line items are untouched.
    #[instrument(skip(self), fields(order_id = order_id, new_status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: i64,
        status: String,
    ) -> Result<(), ServiceError> {
        if status.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Status is required".to_string(),
            ));
        }

        let db = &*self.db;
        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(order_id, "Order not found for status update");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        let old_status = order.status.clone();
        let mut active: OrderActiveModel = order.into();
        active.status = Set(status.clone());
        active.update(db).await.map_err(|e| {
            error!(error = %e, order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id, %old_status, %status, "Order status updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status: status,
                })
                .await
            {
                warn!(error = %e, order_id, "Failed to send status changed event");
            }
        }

        Ok(())
    }

    /// Deletes an order and all of its line items in one transaction,
    /// children first. Deleting an absent order succeeds with zero rows
    /// affected.
    #[instrument(skip(self), fields(order_id = order_id))]
    pub async fn delete_order(&self, order_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to start transaction for order deletion");
            ServiceError::DatabaseError(e)
        })?;

        OrderProductEntity::delete_many()
            .filter(order_product::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to delete order products");
                ServiceError::DatabaseError(e)
            })?;

        let deleted = OrderEntity::delete_by_id(order_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to delete order");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to commit order deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id,
            rows_affected = deleted.rows_affected,
            "Order deleted"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderDeleted(order_id)).await {
                warn!(error = %e, order_id, "Failed to send order deleted event");
            }
        }

        Ok(())
    }

    /// Replaces the attribute fields of one line item, addressed by its
    /// durable product id scoped to its order.
    #[instrument(skip(self, item), fields(order_id = order_id, product_id = product_id))]
    pub async fn update_line_item(
        &self,
        order_id: i64,
        product_id: i64,
        item: NewOrderProduct,
    ) -> Result<OrderProduct, ServiceError> {
        let db = &*self.db;

        let existing = OrderProductEntity::find_by_id(product_id)
            .filter(order_product::Column::OrderId.eq(order_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(order_id, product_id, "Line item not found for update");
                ServiceError::NotFound("Order product not found".to_string())
            })?;

        let mut active: OrderProductActiveModel = existing.into();
        active.micron = Set(item.micron);
        active.meter = Set(item.meter);
        active.size = Set(item.size);
        active.color = Set(item.color);
        active.nos = Set(item.nos.unwrap_or_default());
        active.unit = Set(item.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string()));
        active.quantity = Set(item.quantity);

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, order_id, product_id, "Failed to update line item");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id, product_id, "Line item updated");

        Ok(OrderProduct::from(updated))
    }

    /// Marks an order completed. The row is retained with its status set
    /// to the completed value, which drops it from the active list.
    #[instrument(skip(self), fields(order_id = order_id))]
    pub async fn complete_order(&self, order_id: i64) -> Result<(), ServiceError> {
        let db = &*self.db;
        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(order_id, "Order not found for completion");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        let mut active: OrderActiveModel = order.into();
        active.status = Set(STATUS_COMPLETED.to_string());
        active.update(db).await.map_err(|e| {
            error!(error = %e, order_id, "Failed to mark order completed");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id, "Order marked completed");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCompleted(order_id)).await {
                warn!(error = %e, order_id, "Failed to send order completed event");
            }
        }

        Ok(())
    }
}

fn new_product_row(order_id: i64, item: NewOrderProduct) -> OrderProductActiveModel {
    OrderProductActiveModel {
        order_id: Set(order_id),
        micron: Set(item.micron),
        meter: Set(item.meter),
        size: Set(item.size),
        color: Set(item.color),
        nos: Set(item.nos.unwrap_or_default()),
        unit: Set(item.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string())),
        quantity: Set(item.quantity),
        ..Default::default()
    }
}
