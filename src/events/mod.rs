use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::models::Order;

/// The various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A new order was durably written; carries the full wire object so
    /// subscribers can surface it without a round-trip.
    OrderPlaced(Order),
    OrderStatusChanged {
        order_id: i64,
        old_status: String,
        new_status: String,
    },
    OrderCompleted(i64),
    OrderDeleted(i64),

    StackCreated(i64),
    StackUpdated(i64),
    StackDeleted(i64),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// In-process push channel for newly placed orders. Receivers that lag
/// simply miss entries; the polling refresh converges them anyway.
#[derive(Debug, Clone)]
pub struct OrderFeed {
    tx: broadcast::Sender<Order>,
}

impl OrderFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Order> {
        self.tx.subscribe()
    }

    pub fn publish(&self, order: Order) {
        // Errors only mean there is no subscriber right now.
        let _ = self.tx.send(order);
    }
}

impl Default for OrderFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Consumes the event stream: logs every event and republishes order
/// placements onto the order feed.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, feed: OrderFeed) {
    info!("Event processor started");
    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderPlaced(order) => {
                info!(order_id = order.order_id, "Order placed");
                feed.publish(order.clone());
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id, %old_status, %new_status, "Order status changed");
            }
            Event::OrderCompleted(order_id) => info!(order_id, "Order completed"),
            Event::OrderDeleted(order_id) => info!(order_id, "Order deleted"),
            Event::StackCreated(id) | Event::StackUpdated(id) | Event::StackDeleted(id) => {
                debug!(stack_id = id, "Stack changed");
            }
        }
    }
    info!("Event processor stopped");
}
