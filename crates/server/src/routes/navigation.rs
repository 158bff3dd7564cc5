use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use service::auth::domain::Identity;
use service::errors::ServiceError;
use service::navigation::{self, ClientProfile};

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

#[derive(Serialize)]
pub struct RouteLinksOutput {
    /// Sequential legs; a single entry means the caller can redirect
    /// straight to it.
    pub urls: Vec<String>,
    /// Services left out for lacking a complete address.
    pub skipped: Vec<Uuid>,
    pub warning: Option<String>,
}

/// Navigation links for the current motorcycle run, shaped for the
/// requesting client (desktop vs. mobile waypoint limits).
#[utoipa::path(get, path = "/route-links", tag = "navigation", responses((status = 200, description = "Navigation URLs"), (status = 400, description = "No origin configured")))]
pub async fn route_links(
    State(state): State<ServerState>,
    Extension(_identity): Extension<Identity>,
    headers: HeaderMap,
) -> Result<Json<RouteLinksOutput>, ApiError> {
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let profile = ClientProfile::from_user_agent(
        user_agent,
        state.routing.waypoint_limit,
        state.routing.waypoint_limit_mobile,
    );

    let snapshot = navigation::en_route_motorcycle(&state.db).await?;
    let (stops, skipped) = navigation::collect_stops(&snapshot);
    if stops.is_empty() {
        // A run with nothing routable is a warning, not a failure.
        return Ok(Json(RouteLinksOutput {
            urls: Vec::new(),
            skipped,
            warning: Some(ServiceError::NoValidAddresses.to_string()),
        }));
    }

    let urls = navigation::build_links(&stops, state.routing.origin.as_deref(), &profile)?;
    let warning = if skipped.is_empty() {
        None
    } else {
        Some(format!("{} service(s) without a complete address were skipped", skipped.len()))
    };
    Ok(Json(RouteLinksOutput { urls, skipped, warning }))
}
