use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    errors::ServiceError,
    models::{Stack, StackMutationResponse, StackRequest},
    AppState,
};

/// POST /stacks
pub async fn create_stack(
    State(state): State<AppState>,
    Json(request): Json<StackRequest>,
) -> Result<(StatusCode, Json<StackMutationResponse>), ServiceError> {
    let created = state.services.stacks.create_stack(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(StackMutationResponse {
            success: true,
            message: "Stack created".to_string(),
            id: created.id,
        }),
    ))
}

/// GET /stacks — the stock screen consumes a bare array.
pub async fn list_stacks(
    State(state): State<AppState>,
) -> Result<Json<Vec<Stack>>, ServiceError> {
    let stacks = state.services.stacks.list_stacks().await?;
    Ok(Json(stacks))
}

/// PUT /stacks/:id
pub async fn update_stack(
    State(state): State<AppState>,
    Path(stack_id): Path<i64>,
    Json(request): Json<StackRequest>,
) -> Result<Json<StackMutationResponse>, ServiceError> {
    state.services.stacks.update_stack(stack_id, request).await?;

    Ok(Json(StackMutationResponse {
        success: true,
        message: "Stack updated".to_string(),
        id: stack_id,
    }))
}

/// DELETE /stacks/:id
pub async fn delete_stack(
    State(state): State<AppState>,
    Path(stack_id): Path<i64>,
) -> Result<Json<StackMutationResponse>, ServiceError> {
    state.services.stacks.delete_stack(stack_id).await?;

    Ok(Json(StackMutationResponse {
        success: true,
        message: "Stack deleted".to_string(),
        id: stack_id,
    }))
}
