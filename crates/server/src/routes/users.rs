use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use models::user::{self, Role};
use service::auth::domain::Identity;
use service::errors::ServiceError;
use service::user_service;

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize)]
pub struct UserInput {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
}

pub async fn list(
    State(state): State<ServerState>,
    Extension(_identity): Extension<Identity>,
) -> Result<Json<Vec<user::Model>>, ApiError> {
    let users = user_service::list_users(&state.db).await?;
    Ok(Json(users))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<UserInput>,
) -> Result<Json<user::Model>, ApiError> {
    let password = input
        .password
        .as_deref()
        .ok_or_else(|| ServiceError::Validation("password required".to_string()))?;
    let created =
        user_service::create_user(&state.db, &identity, &input.username, password, input.role)
            .await?;
    Ok(Json(created))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(input): Json<UserInput>,
) -> Result<Json<user::Model>, ApiError> {
    let updated = user_service::update_user(
        &state.db,
        &identity,
        id,
        &input.username,
        input.password.as_deref(),
        input.role,
    )
    .await?;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user_service::delete_user(&state.db, &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
