use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use service::auth::domain::Identity;
use service::errors::ServiceError;
use service::reporting::{self, ActivityReport, ReportWindow};

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// "day" (default) or "month".
    pub window: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Restrict to one user's services.
    pub user: Option<String>,
}

/// Windowed activity counts: totals by status and kind, plus
/// per-neighborhood and per-user breakdowns.
#[utoipa::path(get, path = "/dashboard", tag = "dashboard", params(("window" = Option<String>, Query, description = "day or month"), ("year" = Option<i32>, Query, description = "Month window year"), ("month" = Option<u32>, Query, description = "Month window month"), ("user" = Option<String>, Query, description = "Restrict to one username")), responses((status = 200, description = "Activity report")))]
pub async fn report(
    State(state): State<ServerState>,
    Extension(_identity): Extension<Identity>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ActivityReport>, ApiError> {
    let tz = state.routing.timezone;
    let window = match query.window.as_deref().unwrap_or("day") {
        "day" => ReportWindow::today(tz),
        "month" => match (query.year, query.month) {
            (None, None) => ReportWindow::current_month(tz),
            (year, month) => {
                use chrono::Datelike;
                let now = chrono::Utc::now().with_timezone(&tz);
                ReportWindow::Month {
                    year: year.unwrap_or_else(|| now.year()),
                    month: month.unwrap_or_else(|| now.month()),
                }
            }
        },
        other => {
            return Err(ServiceError::Validation(format!("unknown window: {}", other)).into())
        }
    };

    let report =
        reporting::activity_report(&state.db, &window, tz, query.user.as_deref()).await?;
    Ok(Json(report))
}
