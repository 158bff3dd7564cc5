use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::neighborhood;
use service::auth::domain::Identity;
use service::neighborhood_service;

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize)]
pub struct NeighborhoodInput {
    pub name: String,
    /// Comma-decimal fee text, e.g. "12,50".
    pub fee: String,
}

#[derive(Serialize)]
pub struct FeeOutput {
    pub fee: String,
}

pub async fn list(
    State(state): State<ServerState>,
    Extension(_identity): Extension<Identity>,
) -> Result<Json<Vec<neighborhood::Model>>, ApiError> {
    let all = neighborhood_service::list_neighborhoods(&state.db).await?;
    Ok(Json(all))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<NeighborhoodInput>,
) -> Result<Json<neighborhood::Model>, ApiError> {
    let created =
        neighborhood_service::create_neighborhood(&state.db, &identity, &input.name, &input.fee)
            .await?;
    Ok(Json(created))
}

pub async fn update(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(input): Json<NeighborhoodInput>,
) -> Result<Json<neighborhood::Model>, ApiError> {
    let updated = neighborhood_service::update_neighborhood(
        &state.db,
        &identity,
        id,
        &input.name,
        &input.fee,
    )
    .await?;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    neighborhood_service::delete_neighborhood(&state.db, &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fee lookup used while filling in a service: returns display text,
/// `"0,00"` for names the directory does not know.
#[utoipa::path(get, path = "/neighborhoods/fee/{name}", tag = "neighborhoods", params(("name" = String, Path, description = "Neighborhood name")), responses((status = 200, description = "Formatted fee")))]
pub async fn fee(
    State(state): State<ServerState>,
    Extension(_identity): Extension<Identity>,
    Path(name): Path<String>,
) -> Result<Json<FeeOutput>, ApiError> {
    let fee = neighborhood_service::fee_text_for(&state.db, &name).await?;
    Ok(Json(FeeOutput { fee }))
}
