use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::service::{Model as ServiceModel, ServiceStatus};
use service::auth::domain::Identity;
use service::board::{self, BoardFilters, FilterOptions, ServiceCard};
use service::errors::ServiceError;
use service::lifecycle::{self, ServiceInput};
use service::ordering::{self, MoveDirection};

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize)]
pub struct EditServiceRequest {
    #[serde(flatten)]
    pub input: ServiceInput,
    /// When set, the edit behaves as a cancellation instead.
    #[serde(default)]
    pub cancel: bool,
}

#[derive(Serialize)]
pub struct MoveOutput {
    pub moved: bool,
}

#[derive(Serialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub snapshot: board::BoardSnapshot,
    pub options: FilterOptions,
}

#[derive(Serialize)]
pub struct CancelledView {
    pub cancelled: Vec<ServiceCard>,
    pub options: FilterOptions,
}

fn status_from_slug(slug: &str) -> Result<ServiceStatus, ServiceError> {
    match slug.replace('-', "_").as_str() {
        "registered" => Ok(ServiceStatus::Registered),
        "en_route" => Ok(ServiceStatus::EnRoute),
        "finished" => Ok(ServiceStatus::Finished),
        "cancelled" => Ok(ServiceStatus::Cancelled),
        other => Err(ServiceError::Validation(format!("unknown status: {}", other))),
    }
}

#[utoipa::path(post, path = "/services", tag = "services", request_body = crate::openapi::ServiceRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<ServiceInput>,
) -> Result<Json<ServiceModel>, ApiError> {
    let created = lifecycle::create_service(&state.db, &identity, input).await?;
    Ok(Json(created))
}

pub async fn edit(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<EditServiceRequest>,
) -> Result<Json<ServiceModel>, ApiError> {
    let updated = lifecycle::edit_service(&state.db, &identity, id, req.input, req.cancel).await?;
    Ok(Json(updated))
}

/// Single entry point for every lifecycle edge; illegal edges come back
/// as a conflict and leave the record untouched.
#[utoipa::path(post, path = "/services/{id}/status/{target}", tag = "services", params(("id" = Uuid, Path, description = "Service id"), ("target" = String, Path, description = "Target status slug")), responses((status = 200, description = "Transitioned"), (status = 403, description = "Forbidden"), (status = 409, description = "Illegal transition")))]
pub async fn transition(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path((id, target)): Path<(Uuid, String)>,
) -> Result<Json<ServiceModel>, ApiError> {
    let target = status_from_slug(&target)?;
    let updated = lifecycle::transition_service(&state.db, &identity, id, target).await?;
    Ok(Json(updated))
}

pub async fn move_order(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    Path((id, direction)): Path<(Uuid, String)>,
) -> Result<Json<MoveOutput>, ApiError> {
    let direction = MoveDirection::from_slug(&direction)
        .ok_or_else(|| ServiceError::Validation(format!("unknown direction: {}", direction)))?;
    let moved = ordering::move_adjacent(&state.db, &identity, id, direction).await?;
    Ok(Json(MoveOutput { moved }))
}

pub async fn board_view(
    State(state): State<ServerState>,
    Extension(_identity): Extension<Identity>,
    Query(filters): Query<BoardFilters>,
) -> Result<Json<BoardView>, ApiError> {
    let snapshot = board::board(&state.db, &filters, state.routing.timezone).await?;
    let options = board::filter_options(&state.db).await?;
    Ok(Json(BoardView { snapshot, options }))
}

pub async fn cancelled_view(
    State(state): State<ServerState>,
    Extension(_identity): Extension<Identity>,
    Query(filters): Query<BoardFilters>,
) -> Result<Json<CancelledView>, ApiError> {
    let cancelled = board::cancelled(&state.db, &filters).await?;
    let options = board::filter_options(&state.db).await?;
    Ok(Json(CancelledView { cancelled, options }))
}
