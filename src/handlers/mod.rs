pub mod auth;
pub mod orders;
pub mod stacks;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<crate::services::orders::OrderService>,
    pub stacks: Arc<crate::services::stacks::StackService>,
    pub auth: Arc<crate::services::auth::AuthService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db.clone(),
            Some(event_sender.clone()),
        ));
        let stacks = Arc::new(crate::services::stacks::StackService::new(
            db.clone(),
            Some(event_sender),
        ));
        let auth = Arc::new(crate::services::auth::AuthService::new(db));

        Self {
            orders,
            stacks,
            auth,
        }
    }
}
