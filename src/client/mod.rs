//! Embeddable client for the order API: a thin `reqwest` wrapper plus an
//! eventually-consistent polling cache of the active order list.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::errors::ErrorResponse;
use crate::models::{
    MessageResponse, NewOrderProduct, Order, OrderProduct, OrdersResponse, PlaceOrderRequest,
    PlaceOrderResponse,
};

/// How often the cache re-pulls the full order list.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected request ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Typed access to the order HTTP surface.
#[derive(Debug, Clone)]
pub struct OrdersApi {
    http: reqwest::Client,
    base_url: String,
}

impl OrdersApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn fetch_orders(&self) -> Result<Vec<Order>, ClientError> {
        let response = self.http.get(self.url("/orders")).send().await?;
        let body: OrdersResponse = check(response).await?.json().await?;
        Ok(body.orders)
    }

    pub async fn place_order(&self, request: &PlaceOrderRequest) -> Result<i64, ClientError> {
        let response = self
            .http
            .post(self.url("/place-order"))
            .json(request)
            .send()
            .await?;
        let body: PlaceOrderResponse = check(response).await?.json().await?;
        Ok(body.order_id)
    }

    pub async fn delete_order(&self, order_id: i64) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/orders/{order_id}")))
            .send()
            .await?;
        check(response).await?.json::<MessageResponse>().await?;
        Ok(())
    }

    pub async fn update_line_item(
        &self,
        order_id: i64,
        product_id: i64,
        item: &NewOrderProduct,
    ) -> Result<OrderProduct, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/orders/{order_id}/products/{product_id}")))
            .json(item)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn complete_order(&self, order_id: i64) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/orders/{order_id}/complete")))
            .send()
            .await?;
        check(response).await?.json::<MessageResponse>().await?;
        Ok(())
    }
}

/// Turns a non-2xx response into a `ClientError::Api`, pulling the
/// message out of the standard error body when one is present.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Observable cache state. `loading` and `error` are display states;
/// `orders` is the last reconciled view of the active order list.
#[derive(Debug, Clone, Default)]
pub struct OrdersSnapshot {
    pub orders: Vec<Order>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Client-side mirror of the server's active order list.
///
/// Every mutating operation is pessimistic: the server round-trip happens
/// first and local state is only touched on success, except for
/// [`OrderCache::push_order`], which accepts an out-of-band new order
/// without validation. A failed [`OrderCache::mark_completed`] runs one
/// compensating [`OrderCache::refresh`] because the server-side outcome
/// is uncertain.
pub struct OrderCache {
    api: OrdersApi,
    state: Mutex<OrdersSnapshot>,
    watch_tx: watch::Sender<OrdersSnapshot>,
}

impl OrderCache {
    pub fn new(api: OrdersApi) -> Arc<Self> {
        let (watch_tx, _) = watch::channel(OrdersSnapshot::default());
        Arc::new(Self {
            api,
            state: Mutex::new(OrdersSnapshot::default()),
            watch_tx,
        })
    }

    /// Subscribes to snapshot updates; the receiver immediately holds the
    /// current state.
    pub fn subscribe(&self) -> watch::Receiver<OrdersSnapshot> {
        self.watch_tx.subscribe()
    }

    pub fn snapshot(&self) -> OrdersSnapshot {
        self.state.lock().expect("cache state poisoned").clone()
    }

    fn begin(&self) {
        let mut state = self.state.lock().expect("cache state poisoned");
        state.loading = true;
        state.error = None;
        self.watch_tx.send_replace(state.clone());
    }

    fn finish_ok(&self, apply: impl FnOnce(&mut Vec<Order>)) {
        let mut state = self.state.lock().expect("cache state poisoned");
        apply(&mut state.orders);
        state.loading = false;
        self.watch_tx.send_replace(state.clone());
    }

    fn finish_err(&self, message: &str) {
        let mut state = self.state.lock().expect("cache state poisoned");
        state.loading = false;
        state.error = Some(message.to_string());
        self.watch_tx.send_replace(state.clone());
    }

    /// Full reload of the order list; replaces local state wholesale.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.begin();
        match self.api.fetch_orders().await {
            Ok(orders) => {
                self.finish_ok(|local| *local = orders);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Order refresh failed");
                self.finish_err("Failed to fetch orders");
                Err(e)
            }
        }
    }

    /// Prepends an order announced out-of-band, without a server
    /// round-trip. The next refresh reconciles it against server state.
    pub fn push_order(&self, order: Order) {
        let mut state = self.state.lock().expect("cache state poisoned");
        state.orders.insert(0, order);
        self.watch_tx.send_replace(state.clone());
    }

    /// Deletes an order server-side, then removes it locally by identity.
    /// On failure local state is left untouched (stale, not wrong).
    pub async fn delete_order(&self, order_id: i64) -> Result<(), ClientError> {
        self.begin();
        match self.api.delete_order(order_id).await {
            Ok(()) => {
                self.finish_ok(|local| local.retain(|o| o.order_id != order_id));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, order_id, "Order delete failed");
                self.finish_err("Failed to delete order");
                Err(e)
            }
        }
    }

    /// Updates one line item server-side, then replaces the matching item
    /// locally by its durable product id.
    pub async fn update_line_item(
        &self,
        order_id: i64,
        product_id: i64,
        item: NewOrderProduct,
    ) -> Result<(), ClientError> {
        self.begin();
        match self.api.update_line_item(order_id, product_id, &item).await {
            Ok(updated) => {
                self.finish_ok(|local| {
                    if let Some(order) = local.iter_mut().find(|o| o.order_id == order_id) {
                        if let Some(product) = order
                            .products
                            .iter_mut()
                            .find(|p| p.product_id == product_id)
                        {
                            *product = updated;
                        }
                    }
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, order_id, product_id, "Line item update failed");
                self.finish_err("Failed to update product");
                Err(e)
            }
        }
    }

    /// Marks an order completed server-side and removes it from the
    /// active list. If the call fails the server-side outcome is
    /// uncertain, so one compensating refresh resynchronizes the cache.
    pub async fn mark_completed(&self, order_id: i64) -> Result<(), ClientError> {
        self.begin();
        match self.api.complete_order(order_id).await {
            Ok(()) => {
                self.finish_ok(|local| local.retain(|o| o.order_id != order_id));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, order_id, "Complete failed, refreshing");
                self.finish_err("Failed to complete order");
                let _ = self.refresh().await;
                Err(e)
            }
        }
    }

    /// Starts the fixed-interval polling loop. The first tick fires
    /// immediately (the mount-time load); the task stops when the
    /// returned handle is dropped.
    pub fn start_polling(self: &Arc<Self>, period: Duration) -> PollerHandle {
        let cache = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = cache.refresh().await {
                    debug!(error = %e, "Poll tick failed");
                }
            }
        });
        PollerHandle { handle }
    }

    /// Pipes an in-process order feed into the cache: every broadcast
    /// order is prepended as if announced by another client. Lagged
    /// receivers skip ahead; the polling refresh converges them.
    pub fn attach_feed(self: &Arc<Self>, mut feed: broadcast::Receiver<Order>) -> PollerHandle {
        let cache = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(order) => cache.push_order(order),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Order feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        PollerHandle { handle }
    }
}

/// Owns a background cache task; dropping it aborts the task so no stale
/// response is applied after teardown.
pub struct PollerHandle {
    handle: JoinHandle<()>,
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(id: i64) -> Order {
        Order {
            order_id: id,
            customer_name: format!("customer-{id}"),
            contact_number: "555-0100".into(),
            district: String::new(),
            transport: String::new(),
            created_at: Utc::now(),
            status: "Pending".into(),
            products: Vec::new(),
        }
    }

    #[tokio::test]
    async fn push_order_prepends_without_network() {
        // Point the API at a closed port; push_order must never touch it.
        let cache = OrderCache::new(OrdersApi::new("http://127.0.0.1:1"));
        cache.push_order(order(1));
        cache.push_order(order(2));

        let snapshot = cache.snapshot();
        let ids: Vec<i64> = snapshot.orders.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn failed_refresh_sets_error_and_clears_loading() {
        let cache = OrderCache::new(OrdersApi::new("http://127.0.0.1:1"));
        let result = cache.refresh().await;
        assert!(result.is_err());

        let snapshot = cache.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some("Failed to fetch orders"));
        assert!(snapshot.orders.is_empty());
    }

    #[tokio::test]
    async fn subscribers_observe_pushed_orders() {
        let cache = OrderCache::new(OrdersApi::new("http://127.0.0.1:1"));
        let mut rx = cache.subscribe();
        cache.push_order(order(7));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().orders[0].order_id, 7);
    }

    #[test]
    fn base_url_trailing_slashes_are_trimmed() {
        let api = OrdersApi::new("http://localhost:5000///");
        assert_eq!(api.url("/orders"), "http://localhost:5000/orders");
    }
}
