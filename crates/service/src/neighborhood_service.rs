//! Fee directory: named neighborhoods and their flat delivery fee.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};
use uuid::Uuid;

use models::neighborhood;

use crate::auth::domain::Identity;
use crate::errors::ServiceError;
use crate::policy::{self, Action};

/// Create a neighborhood. Fee arrives as comma-decimal text.
pub async fn create_neighborhood(
    db: &DatabaseConnection,
    actor: &Identity,
    name: &str,
    fee_text: &str,
) -> Result<neighborhood::Model, ServiceError> {
    policy::authorize(actor.role, Action::ManageNeighborhoods, false)?;
    let fee = common::money::parse_amount(fee_text)?;
    neighborhood::validate_fee(fee)?;
    if neighborhood::find_by_name(db, name).await?.is_some() {
        return Err(ServiceError::Validation("neighborhood already registered".into()));
    }
    let created = neighborhood::create(db, name, fee).await?;
    Ok(created)
}

/// Rename a neighborhood and/or change its fee.
///
/// Renaming does not cascade to services that reference the old name;
/// those keep the name that was current when they were written.
pub async fn update_neighborhood(
    db: &DatabaseConnection,
    actor: &Identity,
    id: Uuid,
    name: &str,
    fee_text: &str,
) -> Result<neighborhood::Model, ServiceError> {
    policy::authorize(actor.role, Action::ManageNeighborhoods, false)?;
    neighborhood::validate_name(name)?;
    let fee = common::money::parse_amount(fee_text)?;
    neighborhood::validate_fee(fee)?;

    let found = neighborhood::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db)?
        .ok_or_else(|| ServiceError::not_found("neighborhood"))?;
    if let Some(existing) = neighborhood::find_by_name(db, name).await? {
        if existing.id != found.id {
            return Err(ServiceError::Validation("a neighborhood with that name already exists".into()));
        }
    }

    let mut am = found.into_active_model();
    am.name = Set(name.to_string());
    am.fee = Set(fee);
    let updated = am.update(db).await.map_err(ServiceError::db)?;
    Ok(updated)
}

/// Delete a neighborhood. Services referencing it by name are untouched.
pub async fn delete_neighborhood(
    db: &DatabaseConnection,
    actor: &Identity,
    id: Uuid,
) -> Result<(), ServiceError> {
    policy::authorize(actor.role, Action::ManageNeighborhoods, false)?;
    let res = neighborhood::Entity::delete_by_id(id).exec(db).await.map_err(ServiceError::db)?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("neighborhood"));
    }
    Ok(())
}

pub async fn list_neighborhoods(
    db: &DatabaseConnection,
) -> Result<Vec<neighborhood::Model>, ServiceError> {
    neighborhood::Entity::find()
        .order_by_asc(neighborhood::Column::Name)
        .all(db)
        .await
        .map_err(ServiceError::db)
}

/// The fee for a neighborhood as display text, `"0,00"` when unknown.
pub async fn fee_text_for(db: &DatabaseConnection, name: &str) -> Result<String, ServiceError> {
    let found = neighborhood::find_by_name(db, name).await?;
    Ok(match found {
        Some(n) => common::money::format_amount(n.fee),
        None => "0,00".to_string(),
    })
}
