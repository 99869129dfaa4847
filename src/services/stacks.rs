use std::sync::Arc;

use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use tracing::{error, info, instrument, warn};

use crate::{
    db::DbPool,
    entities::stack::{self, ActiveModel as StackActiveModel, Entity as StackEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Stack, StackRequest},
};

/// CRUD over the stacks (inventory) table.
#[derive(Clone)]
pub struct StackService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl StackService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request))]
    pub async fn create_stack(&self, request: StackRequest) -> Result<Stack, ServiceError> {
        let created = StackActiveModel {
            micron: Set(request.micron),
            meter: Set(request.meter),
            size: Set(request.size),
            color: Set(request.color),
            stock: Set(request.stock),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create stack");
            ServiceError::DatabaseError(e)
        })?;

        info!(stack_id = created.id, "Stack created");
        self.emit(Event::StackCreated(created.id)).await;

        Ok(Stack::from(created))
    }

    #[instrument(skip(self))]
    pub async fn list_stacks(&self) -> Result<Vec<Stack>, ServiceError> {
        let stacks = StackEntity::find()
            .order_by_asc(stack::Column::Id)
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch stacks");
                ServiceError::DatabaseError(e)
            })?;

        Ok(stacks.into_iter().map(Stack::from).collect())
    }

    #[instrument(skip(self, request), fields(stack_id = stack_id))]
    pub async fn update_stack(
        &self,
        stack_id: i64,
        request: StackRequest,
    ) -> Result<Stack, ServiceError> {
        let existing = StackEntity::find_by_id(stack_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                warn!(stack_id, "Stack not found for update");
                ServiceError::NotFound("Stack not found".to_string())
            })?;

        let mut active: StackActiveModel = existing.into();
        active.micron = Set(request.micron);
        active.meter = Set(request.meter);
        active.size = Set(request.size);
        active.color = Set(request.color);
        active.stock = Set(request.stock);

        let updated = active.update(&*self.db).await.map_err(|e| {
            error!(error = %e, stack_id, "Failed to update stack");
            ServiceError::DatabaseError(e)
        })?;

        info!(stack_id, "Stack updated");
        self.emit(Event::StackUpdated(stack_id)).await;

        Ok(Stack::from(updated))
    }

    /// Deleting an absent stack succeeds with zero rows affected.
    #[instrument(skip(self), fields(stack_id = stack_id))]
    pub async fn delete_stack(&self, stack_id: i64) -> Result<(), ServiceError> {
        let deleted = StackEntity::delete_by_id(stack_id)
            .exec(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, stack_id, "Failed to delete stack");
                ServiceError::DatabaseError(e)
            })?;

        info!(
            stack_id,
            rows_affected = deleted.rows_affected,
            "Stack deleted"
        );
        self.emit(Event::StackDeleted(stack_id)).await;

        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send stack event");
            }
        }
    }
}
