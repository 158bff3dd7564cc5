//! Dashboard snapshot queries.
//!
//! These feed the status-column views: registered, en-route (in delivery
//! order), finished today, and the cancelled history. Results are plain
//! data structures; rendering happens elsewhere.

use sea_orm::{
    ActiveEnum, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use models::service::{self, Provider, ServiceStatus};
use models::user;

use crate::errors::ServiceError;
use crate::reporting::ReportWindow;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardFilters {
    pub username: Option<String>,
    pub neighborhood: Option<String>,
    pub provider: Option<Provider>,
}

/// A service plus its owner's name, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCard {
    #[serde(flatten)]
    pub service: service::Model,
    pub username: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub registered: Vec<ServiceCard>,
    pub en_route: Vec<ServiceCard>,
    pub finished_today: Vec<ServiceCard>,
}

/// Filter choices restricted to values that actually occur.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub usernames: Vec<String>,
    pub neighborhoods: Vec<String>,
    pub providers: Vec<Provider>,
}

async fn base_condition(
    db: &DatabaseConnection,
    filters: &BoardFilters,
) -> Result<Option<Condition>, ServiceError> {
    let mut condition = Condition::all();
    if let Some(username) = filters.username.as_deref().filter(|s| !s.is_empty()) {
        match user::find_by_username(db, username).await? {
            Some(u) => condition = condition.add(service::Column::UserId.eq(u.id)),
            // Filtering on a name nobody has matches nothing.
            None => return Ok(None),
        }
    }
    if let Some(neighborhood) = filters.neighborhood.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(service::Column::Neighborhood.eq(neighborhood));
    }
    if let Some(provider) = filters.provider {
        condition = condition.add(service::Column::Provider.eq(provider));
    }
    Ok(Some(condition))
}

async fn with_usernames(
    db: &DatabaseConnection,
    rows: Vec<service::Model>,
) -> Result<Vec<ServiceCard>, ServiceError> {
    let mut ids: Vec<Uuid> = rows.iter().map(|m| m.user_id).collect();
    ids.sort();
    ids.dedup();
    let names: HashMap<Uuid, String> = if ids.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(db)
            .await
            .map_err(ServiceError::db)?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect()
    };
    Ok(rows
        .into_iter()
        .map(|m| {
            let username = names.get(&m.user_id).cloned().unwrap_or_else(|| m.user_id.to_string());
            ServiceCard { service: m, username }
        })
        .collect())
}

/// The three working columns of the home view.
pub async fn board(
    db: &DatabaseConnection,
    filters: &BoardFilters,
    tz: Tz,
) -> Result<BoardSnapshot, ServiceError> {
    let Some(condition) = base_condition(db, filters).await? else {
        return Ok(BoardSnapshot::default());
    };

    let registered = service::Entity::find()
        .filter(condition.clone())
        .filter(service::Column::Status.eq(ServiceStatus::Registered))
        .order_by_desc(service::Column::CreatedAt)
        .all(db)
        .await
        .map_err(ServiceError::db)?;

    let en_route = service::Entity::find()
        .filter(condition.clone())
        .filter(service::Column::Status.eq(ServiceStatus::EnRoute))
        .order_by_asc(service::Column::RouteOrder)
        .order_by_desc(service::Column::EnRouteAt)
        .all(db)
        .await
        .map_err(ServiceError::db)?;

    let (today_start, today_end) = ReportWindow::today(tz).bounds(tz)?;
    let finished_today = service::Entity::find()
        .filter(condition)
        .filter(service::Column::Status.eq(ServiceStatus::Finished))
        .filter(service::Column::FinishedAt.gte(today_start.fixed_offset()))
        .filter(service::Column::FinishedAt.lt(today_end.fixed_offset()))
        .order_by_desc(service::Column::FinishedAt)
        .all(db)
        .await
        .map_err(ServiceError::db)?;

    Ok(BoardSnapshot {
        registered: with_usernames(db, registered).await?,
        en_route: with_usernames(db, en_route).await?,
        finished_today: with_usernames(db, finished_today).await?,
    })
}

/// Cancellation history, newest first.
pub async fn cancelled(
    db: &DatabaseConnection,
    filters: &BoardFilters,
) -> Result<Vec<ServiceCard>, ServiceError> {
    let Some(condition) = base_condition(db, filters).await? else {
        return Ok(Vec::new());
    };
    let rows = service::Entity::find()
        .filter(condition)
        .filter(service::Column::Status.eq(ServiceStatus::Cancelled))
        .order_by_desc(service::Column::CancelledAt)
        .all(db)
        .await
        .map_err(ServiceError::db)?;
    with_usernames(db, rows).await
}

/// Distinct usernames, neighborhoods and providers that occur on services.
pub async fn filter_options(db: &DatabaseConnection) -> Result<FilterOptions, ServiceError> {
    let neighborhoods: Vec<String> = service::Entity::find()
        .select_only()
        .column(service::Column::Neighborhood)
        .distinct()
        .order_by_asc(service::Column::Neighborhood)
        .into_tuple()
        .all(db)
        .await
        .map_err(ServiceError::db)?;

    let provider_values: Vec<String> = service::Entity::find()
        .select_only()
        .column(service::Column::Provider)
        .distinct()
        .order_by_asc(service::Column::Provider)
        .into_tuple()
        .all(db)
        .await
        .map_err(ServiceError::db)?;
    let providers: Vec<Provider> =
        provider_values.iter().filter_map(|v| Provider::try_from_value(v).ok()).collect();

    let user_ids: Vec<Uuid> = service::Entity::find()
        .select_only()
        .column(service::Column::UserId)
        .distinct()
        .into_tuple()
        .all(db)
        .await
        .map_err(ServiceError::db)?;
    let usernames: Vec<String> = if user_ids.is_empty() {
        Vec::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .order_by_asc(user::Column::Username)
            .all(db)
            .await
            .map_err(ServiceError::db)?
            .into_iter()
            .map(|u| u.username)
            .collect()
    };

    Ok(FilterOptions { usernames, neighborhoods, providers })
}
