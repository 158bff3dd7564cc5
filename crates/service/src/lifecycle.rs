//! Service lifecycle engine.
//!
//! States: `Registered` (initial) -> `EnRoute` -> `Finished`, with
//! `Registered -> Cancelled` and the explicit send-back
//! `EnRoute -> Registered`. Every mutation runs inside one transaction so
//! status, milestone timestamp and route slot change together or not at
//! all; a rejected request leaves the row untouched.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use models::service::{self, Provider, ServiceKind, ServiceStatus};

use crate::auth::domain::Identity;
use crate::errors::ServiceError;
use crate::ordering;
use crate::policy::{self, Action};

/// Optional structured delivery address accompanying a service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressInput {
    pub postal_code: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<i32>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub complement: Option<String>,
}

/// Fields a caller supplies when creating or editing a service.
/// `value` is comma-decimal text ("10,50") as entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInput {
    pub neighborhood: String,
    pub kind: ServiceKind,
    pub document: String,
    pub provider: Provider,
    #[serde(default)]
    pub fee_applied: bool,
    #[serde(default)]
    pub card_machine: bool,
    pub value: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub address: Option<AddressInput>,
}

/// Legality of a status edge, independent of who asks.
pub fn check_transition(from: ServiceStatus, to: ServiceStatus) -> Result<(), ServiceError> {
    use ServiceStatus::*;
    match (from, to) {
        (Registered, EnRoute)
        | (Registered, Cancelled)
        | (EnRoute, Finished)
        | (EnRoute, Registered) => Ok(()),
        _ => Err(ServiceError::InvalidTransition(format!(
            "cannot move a {} service to {}",
            status_label(from),
            status_label(to)
        ))),
    }
}

/// The guarded action a legal edge maps to.
pub fn action_for_transition(from: ServiceStatus, to: ServiceStatus) -> Action {
    use ServiceStatus::*;
    match (from, to) {
        (Registered, EnRoute) => Action::SendToRoute,
        (Registered, Cancelled) => Action::CancelService,
        (EnRoute, Finished) => Action::FinishService,
        (EnRoute, Registered) => Action::ReturnToRegistered,
        // check_transition rejects every other pair first
        _ => Action::EditService,
    }
}

fn status_label(status: ServiceStatus) -> &'static str {
    match status {
        ServiceStatus::Registered => "registered",
        ServiceStatus::EnRoute => "en-route",
        ServiceStatus::Finished => "finished",
        ServiceStatus::Cancelled => "cancelled",
    }
}

async fn validate_input(
    db: &DatabaseConnection,
    input: &ServiceInput,
) -> Result<f64, ServiceError> {
    if input.document.trim().is_empty() {
        return Err(ServiceError::Validation("document required".into()));
    }
    let known = models::neighborhood::find_by_name(db, &input.neighborhood).await?;
    if known.is_none() {
        return Err(ServiceError::Validation(format!(
            "unknown neighborhood: {}",
            input.neighborhood
        )));
    }
    let value = common::money::parse_amount(&input.value)?;
    Ok(value)
}

fn apply_input(am: &mut service::ActiveModel, input: &ServiceInput, value: f64) {
    am.neighborhood = Set(input.neighborhood.clone());
    am.kind = Set(input.kind);
    am.document = Set(input.document.clone());
    am.provider = Set(input.provider);
    am.fee_applied = Set(input.fee_applied);
    am.card_machine = Set(input.card_machine);
    am.value = Set(value);
    am.note = Set(input.note.clone().unwrap_or_default());
    let address = input.address.clone().unwrap_or_default();
    am.postal_code = Set(address.postal_code);
    am.street = Set(address.street);
    am.house_number = Set(address.house_number);
    am.district = Set(address.district);
    am.city = Set(address.city);
    am.state = Set(address.state);
    am.complement = Set(address.complement);
}

/// Register a new service owned by the acting user.
pub async fn create_service(
    db: &DatabaseConnection,
    actor: &Identity,
    input: ServiceInput,
) -> Result<service::Model, ServiceError> {
    policy::authorize(actor.role, Action::CreateService, true)?;
    let value = validate_input(db, &input).await?;

    let mut am = service::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(Utc::now().into()),
        status: Set(ServiceStatus::Registered),
        en_route_at: Set(None),
        finished_at: Set(None),
        cancelled_at: Set(None),
        route_order: Set(None),
        user_id: Set(actor.id),
        ..Default::default()
    };
    apply_input(&mut am, &input, value);

    let created = am.insert(db).await.map_err(ServiceError::db)?;
    info!(service_id = %created.id, user_id = %actor.id, "service_registered");
    Ok(created)
}

/// Edit a registered service's fields, or cancel it when `cancel` is set.
///
/// Editing is only possible while the service is still registered; the
/// cancel flag turns the request into a `Registered -> Cancelled`
/// transition instead of a field update.
pub async fn edit_service(
    db: &DatabaseConnection,
    actor: &Identity,
    id: Uuid,
    input: ServiceInput,
    cancel: bool,
) -> Result<service::Model, ServiceError> {
    let value = if cancel { 0.0 } else { validate_input(db, &input).await? };

    let txn = db.begin().await.map_err(ServiceError::db)?;
    let found = service::Entity::find_by_id(id)
        .one(&txn)
        .await
        .map_err(ServiceError::db)?
        .ok_or_else(|| ServiceError::not_found("service"))?;

    if found.status != ServiceStatus::Registered {
        return Err(ServiceError::InvalidTransition(
            "only registered services can be edited".into(),
        ));
    }
    let owns = found.user_id == actor.id;
    let action = if cancel { Action::CancelService } else { Action::EditService };
    policy::authorize(actor.role, action, owns)?;

    let mut am = found.into_active_model();
    if cancel {
        am.status = Set(ServiceStatus::Cancelled);
        am.cancelled_at = Set(Some(Utc::now().into()));
    } else {
        apply_input(&mut am, &input, value);
    }
    let updated = am.update(&txn).await.map_err(ServiceError::db)?;
    txn.commit().await.map_err(ServiceError::db)?;

    info!(service_id = %updated.id, cancelled = cancel, "service_edited");
    Ok(updated)
}

/// Move a service along one lifecycle edge, applying the edge's side
/// effects atomically.
pub async fn transition_service(
    db: &DatabaseConnection,
    actor: &Identity,
    id: Uuid,
    target: ServiceStatus,
) -> Result<service::Model, ServiceError> {
    let txn = db.begin().await.map_err(ServiceError::db)?;
    let found = service::Entity::find_by_id(id)
        .one(&txn)
        .await
        .map_err(ServiceError::db)?
        .ok_or_else(|| ServiceError::not_found("service"))?;

    let current = found.status;
    check_transition(current, target)?;
    let owns = found.user_id == actor.id;
    policy::authorize(actor.role, action_for_transition(current, target), owns)?;

    let now = Utc::now();
    let mut am = found.into_active_model();
    am.status = Set(target);
    match target {
        ServiceStatus::EnRoute => {
            am.en_route_at = Set(Some(now.into()));
            let slot = ordering::next_route_order(&txn).await?;
            am.route_order = Set(Some(slot));
        }
        ServiceStatus::Finished => {
            am.finished_at = Set(Some(now.into()));
            am.route_order = Set(None);
        }
        ServiceStatus::Cancelled => {
            am.cancelled_at = Set(Some(now.into()));
        }
        ServiceStatus::Registered => {
            // Send-back: the record rejoins the registered column as if it
            // had never been routed.
            am.en_route_at = Set(None);
            am.route_order = Set(None);
        }
    }
    let updated = am.update(&txn).await.map_err(ServiceError::db)?;
    txn.commit().await.map_err(ServiceError::db)?;

    info!(
        service_id = %updated.id,
        from = status_label(current),
        to = status_label(target),
        "service_transitioned"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::user::Role;

    #[test]
    fn only_table_edges_are_legal() {
        use ServiceStatus::*;
        let all = [Registered, EnRoute, Finished, Cancelled];
        let legal = [
            (Registered, EnRoute),
            (Registered, Cancelled),
            (EnRoute, Finished),
            (EnRoute, Registered),
        ];
        for from in all {
            for to in all {
                let res = check_transition(from, to);
                if legal.contains(&(from, to)) {
                    assert!(res.is_ok(), "{from:?} -> {to:?} should be legal");
                } else {
                    assert!(
                        matches!(res, Err(ServiceError::InvalidTransition(_))),
                        "{from:?} -> {to:?} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn edges_map_to_their_guarded_actions() {
        use ServiceStatus::*;
        assert_eq!(action_for_transition(Registered, EnRoute), Action::SendToRoute);
        assert_eq!(action_for_transition(Registered, Cancelled), Action::CancelService);
        assert_eq!(action_for_transition(EnRoute, Finished), Action::FinishService);
        assert_eq!(action_for_transition(EnRoute, Registered), Action::ReturnToRegistered);
    }

    #[test]
    fn routing_someone_elses_service_is_forbidden_for_operators() {
        // Operator B on operator A's registered service: denied before any
        // write is attempted. Admin on the same edge: allowed.
        let action = action_for_transition(ServiceStatus::Registered, ServiceStatus::EnRoute);
        assert!(policy::authorize(Role::Operator, action, false).is_err());
        assert!(policy::authorize(Role::Operator, action, true).is_ok());
        assert!(policy::authorize(Role::Admin, action, false).is_ok());
    }

    #[test]
    fn couriers_finish_anything_but_route_nothing() {
        let finish = action_for_transition(ServiceStatus::EnRoute, ServiceStatus::Finished);
        assert!(policy::authorize(Role::Courier, finish, false).is_ok());
        let route = action_for_transition(ServiceStatus::Registered, ServiceStatus::EnRoute);
        assert!(policy::authorize(Role::Courier, route, false).is_err());
        assert!(policy::authorize(Role::Courier, route, true).is_err());
    }

    mod db {
        use super::super::*;
        use crate::test_support;
        use models::user::Role;

        async fn seed_identity(
            db: &DatabaseConnection,
            role: Role,
        ) -> Result<Identity, ServiceError> {
            let username = format!("lifecycle_{}", Uuid::new_v4());
            let hash = crate::auth::service::hash_password("Passw0rd")
                .map_err(|e| ServiceError::Validation(e.to_string()))?;
            let user = models::user::create(db, &username, &hash, role).await?;
            Ok(Identity { id: user.id, username: user.username, role: user.role })
        }

        fn input_for(neighborhood: &str) -> ServiceInput {
            ServiceInput {
                neighborhood: neighborhood.to_string(),
                kind: ServiceKind::Sale,
                document: "NF-100".into(),
                provider: Provider::Motorcycle,
                fee_applied: true,
                card_machine: false,
                value: "10,50".into(),
                note: None,
                address: None,
            }
        }

        #[tokio::test]
        async fn full_lifecycle_round_trip() -> anyhow::Result<()> {
            let Some(db) = test_support::try_db().await else { return Ok(()) };

            let admin = seed_identity(&db, Role::Admin).await?;
            let operator = seed_identity(&db, Role::Operator).await?;
            let hood = format!("hood_{}", Uuid::new_v4());
            models::neighborhood::create(&db, &hood, 8.0).await?;

            // Operator registers a service; the comma value round-trips.
            let created = create_service(&db, &operator, input_for(&hood)).await?;
            assert_eq!(created.status, ServiceStatus::Registered);
            assert_eq!(common::money::format_amount(created.value), "10,50");

            // Another operator cannot route it; state is unchanged.
            let outsider = seed_identity(&db, Role::Operator).await?;
            let denied =
                transition_service(&db, &outsider, created.id, ServiceStatus::EnRoute).await;
            assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
            let reread = service::Entity::find_by_id(created.id).one(&db).await?.unwrap();
            assert_eq!(reread.status, ServiceStatus::Registered);
            assert!(reread.en_route_at.is_none());

            // The admin routes it; a route slot is assigned.
            let routed =
                transition_service(&db, &admin, created.id, ServiceStatus::EnRoute).await?;
            assert_eq!(routed.status, ServiceStatus::EnRoute);
            assert!(routed.en_route_at.is_some());
            assert!(routed.route_order.is_some());

            // Finishing clears the slot and stamps the milestone.
            let finished =
                transition_service(&db, &admin, created.id, ServiceStatus::Finished).await?;
            assert_eq!(finished.status, ServiceStatus::Finished);
            assert!(finished.finished_at.is_some());
            assert!(finished.route_order.is_none());

            // Terminal: no further edges.
            let stuck = transition_service(&db, &admin, created.id, ServiceStatus::Cancelled).await;
            assert!(matches!(stuck, Err(ServiceError::InvalidTransition(_))));
            Ok(())
        }

        #[tokio::test]
        async fn send_back_clears_route_fields() -> anyhow::Result<()> {
            let Some(db) = test_support::try_db().await else { return Ok(()) };

            let admin = seed_identity(&db, Role::Admin).await?;
            let hood = format!("hood_{}", Uuid::new_v4());
            models::neighborhood::create(&db, &hood, 5.0).await?;

            let created = create_service(&db, &admin, input_for(&hood)).await?;
            transition_service(&db, &admin, created.id, ServiceStatus::EnRoute).await?;
            let back =
                transition_service(&db, &admin, created.id, ServiceStatus::Registered).await?;
            assert_eq!(back.status, ServiceStatus::Registered);
            assert!(back.en_route_at.is_none());
            assert!(back.route_order.is_none());
            Ok(())
        }

        #[tokio::test]
        async fn edit_with_cancel_flag_cancels() -> anyhow::Result<()> {
            let Some(db) = test_support::try_db().await else { return Ok(()) };

            let admin = seed_identity(&db, Role::Admin).await?;
            let hood = format!("hood_{}", Uuid::new_v4());
            models::neighborhood::create(&db, &hood, 5.0).await?;

            let created = create_service(&db, &admin, input_for(&hood)).await?;
            let cancelled =
                edit_service(&db, &admin, created.id, input_for(&hood), true).await?;
            assert_eq!(cancelled.status, ServiceStatus::Cancelled);
            assert!(cancelled.cancelled_at.is_some());

            // Once cancelled, editing is refused.
            let refused = edit_service(&db, &admin, created.id, input_for(&hood), false).await;
            assert!(matches!(refused, Err(ServiceError::InvalidTransition(_))));
            Ok(())
        }
    }
}
