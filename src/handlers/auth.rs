use axum::{extract::State, Json};

use crate::{
    errors::ServiceError,
    models::{LoginRequest, LoginResponse},
    AppState,
};

fn require_credentials(request: &LoginRequest) -> Result<(), ServiceError> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ServiceError::ValidationError(
            "Username and password are required".to_string(),
        ));
    }
    Ok(())
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    require_credentials(&request)?;

    let user = state
        .services
        .auth
        .verify_login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        user,
    }))
}

/// POST /production-login
pub async fn production_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    require_credentials(&request)?;

    let user = state
        .services
        .auth
        .verify_production_login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        user,
    }))
}
