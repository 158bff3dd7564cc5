//! Staff account management. Admin-only; users never manage themselves.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};
use uuid::Uuid;

use models::user::{self, Role};

use crate::auth::domain::Identity;
use crate::auth::service::hash_password;
use crate::errors::ServiceError;
use crate::policy::{self, Action};

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.len() < 6 {
        return Err(ServiceError::Validation("password too short (>=6)".into()));
    }
    Ok(())
}

pub async fn create_user(
    db: &DatabaseConnection,
    actor: &Identity,
    username: &str,
    password: &str,
    role: Role,
) -> Result<user::Model, ServiceError> {
    policy::authorize(actor.role, Action::ManageUsers, false)?;
    user::validate_username(username)?;
    validate_password(password)?;
    if user::find_by_username(db, username).await?.is_some() {
        return Err(ServiceError::Validation("username already taken".into()));
    }
    let hash = hash_password(password).map_err(|e| ServiceError::Validation(e.to_string()))?;
    let created = user::create(db, username, &hash, role).await?;
    Ok(created)
}

/// Update an account. `password` is optional; omitting it keeps the
/// current credential.
pub async fn update_user(
    db: &DatabaseConnection,
    actor: &Identity,
    id: Uuid,
    username: &str,
    password: Option<&str>,
    role: Role,
) -> Result<user::Model, ServiceError> {
    policy::authorize(actor.role, Action::ManageUsers, false)?;
    user::validate_username(username)?;

    let found = user::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db)?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    if let Some(existing) = user::find_by_username(db, username).await? {
        if existing.id != found.id {
            return Err(ServiceError::Validation("username already taken".into()));
        }
    }

    let mut am = found.into_active_model();
    am.username = Set(username.to_string());
    am.role = Set(role);
    if let Some(password) = password {
        validate_password(password)?;
        let hash = hash_password(password).map_err(|e| ServiceError::Validation(e.to_string()))?;
        am.password_hash = Set(hash);
    }
    let updated = am.update(db).await.map_err(ServiceError::db)?;
    Ok(updated)
}

/// Remove an account. Owned services go with it (FK cascade).
pub async fn delete_user(
    db: &DatabaseConnection,
    actor: &Identity,
    id: Uuid,
) -> Result<(), ServiceError> {
    policy::authorize(actor.role, Action::ManageUsers, false)?;
    let found = user::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db)?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    user::hard_delete(db, found.id).await?;
    Ok(())
}

pub async fn get_user(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<user::Model>, ServiceError> {
    user::Entity::find_by_id(id).one(db).await.map_err(ServiceError::db)
}

pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>, ServiceError> {
    user::Entity::find()
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(ServiceError::db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn admin() -> Identity {
        Identity { id: Uuid::new_v4(), username: "root".into(), role: Role::Admin }
    }

    #[tokio::test]
    async fn user_crud_service() -> anyhow::Result<()> {
        let Some(db) = test_support::try_db().await else { return Ok(()) };

        let actor = admin();
        let username = format!("svc_{}", Uuid::new_v4());
        let u = create_user(&db, &actor, &username, "Secret7", Role::Operator).await?;
        assert_eq!(u.username, username);
        assert_eq!(u.role, Role::Operator);
        assert_ne!(u.password_hash, "Secret7");

        let found = get_user(&db, u.id).await?.unwrap();
        assert_eq!(found.id, u.id);

        let taken = create_user(&db, &actor, &username, "Secret7", Role::Courier).await;
        assert!(matches!(taken, Err(ServiceError::Validation(_))));

        let renamed = format!("svc_{}", Uuid::new_v4());
        let updated = update_user(&db, &actor, u.id, &renamed, None, Role::Courier).await?;
        assert_eq!(updated.username, renamed);
        assert_eq!(updated.role, Role::Courier);
        assert_eq!(updated.password_hash, u.password_hash);

        delete_user(&db, &actor, u.id).await?;
        assert!(get_user(&db, u.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn non_admins_cannot_manage_users() -> anyhow::Result<()> {
        let Some(db) = test_support::try_db().await else { return Ok(()) };

        for role in [Role::Operator, Role::Courier] {
            let actor = Identity { id: Uuid::new_v4(), username: "who".into(), role };
            let denied = create_user(&db, &actor, "newbie", "Secret7", Role::Courier).await;
            assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
        }
        Ok(())
    }

    #[tokio::test]
    async fn short_passwords_are_rejected() -> anyhow::Result<()> {
        let Some(db) = test_support::try_db().await else { return Ok(()) };

        let bad = create_user(&db, &admin(), "shorty", "12345", Role::Operator).await;
        assert!(matches!(bad, Err(ServiceError::Validation(_))));
        Ok(())
    }
}
