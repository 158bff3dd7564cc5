//! Route ordering among en-route services.
//!
//! Order values are dense ascending integers assigned monotonically
//! (max + 1) when a service enters the route and never reused; a service
//! leaving the route leaves a hole, which is harmless because only the
//! relative order of the live set is ever read.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use models::service::{self, ServiceStatus};

use crate::auth::domain::Identity;
use crate::errors::ServiceError;
use crate::policy::{self, Action};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

/// Next free route slot: one past the current maximum among en-route rows.
pub async fn next_route_order<C: ConnectionTrait>(conn: &C) -> Result<i32, ServiceError> {
    let max: Option<Option<i32>> = service::Entity::find()
        .select_only()
        .column_as(service::Column::RouteOrder.max(), "max_order")
        .filter(service::Column::Status.eq(ServiceStatus::EnRoute))
        .into_tuple()
        .one(conn)
        .await
        .map_err(ServiceError::db)?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

/// Where a swap would land, over the (order, id)-sorted en-route snapshot.
///
/// Returns the two positions to exchange, or `None` when the target is
/// already at the requested boundary (a silent no-op, not an error).
pub fn plan_swap(
    snapshot: &[(Uuid, i32)],
    target: Uuid,
    direction: MoveDirection,
) -> Option<(usize, usize)> {
    let position = snapshot.iter().position(|(id, _)| *id == target)?;
    match direction {
        MoveDirection::Up if position > 0 => Some((position, position - 1)),
        MoveDirection::Down if position + 1 < snapshot.len() => Some((position, position + 1)),
        _ => None,
    }
}

/// Swap a service with its neighbor in the en-route ordering.
///
/// Returns whether anything moved. Both rows are written in one
/// transaction so concurrent reorders cannot interleave half a swap.
pub async fn move_adjacent(
    db: &DatabaseConnection,
    actor: &Identity,
    id: Uuid,
    direction: MoveDirection,
) -> Result<bool, ServiceError> {
    policy::authorize(actor.role, Action::ReorderRoute, false)?;

    let txn = db.begin().await.map_err(ServiceError::db)?;
    let target = service::Entity::find_by_id(id)
        .one(&txn)
        .await
        .map_err(ServiceError::db)?
        .ok_or_else(|| ServiceError::not_found("service"))?;
    if target.status != ServiceStatus::EnRoute {
        return Err(ServiceError::InvalidTransition(
            "only en-route services can be reordered".into(),
        ));
    }

    let rows = service::Entity::find()
        .filter(service::Column::Status.eq(ServiceStatus::EnRoute))
        .order_by_asc(service::Column::RouteOrder)
        .order_by_asc(service::Column::Id)
        .all(&txn)
        .await
        .map_err(ServiceError::db)?;
    let snapshot: Vec<(Uuid, i32)> =
        rows.iter().map(|m| (m.id, m.route_order.unwrap_or(0))).collect();

    let Some((from, to)) = plan_swap(&snapshot, id, direction) else {
        // Already at the top/bottom.
        txn.commit().await.map_err(ServiceError::db)?;
        return Ok(false);
    };

    let (from_order, to_order) = (snapshot[from].1, snapshot[to].1);
    let mut first = rows[from].clone().into_active_model();
    first.route_order = Set(Some(to_order));
    first.update(&txn).await.map_err(ServiceError::db)?;
    let mut second = rows[to].clone().into_active_model();
    second.route_order = Set(Some(from_order));
    second.update(&txn).await.map_err(ServiceError::db)?;
    txn.commit().await.map_err(ServiceError::db)?;

    info!(service_id = %id, ?direction, "route_order_swapped");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn swaps_with_the_previous_row_on_up() {
        let ids = ids(3);
        let snapshot = vec![(ids[0], 1), (ids[1], 2), (ids[2], 3)];
        assert_eq!(plan_swap(&snapshot, ids[1], MoveDirection::Up), Some((1, 0)));
        assert_eq!(plan_swap(&snapshot, ids[1], MoveDirection::Down), Some((1, 2)));
    }

    #[test]
    fn boundaries_are_silent_no_ops() {
        let ids = ids(2);
        let snapshot = vec![(ids[0], 1), (ids[1], 2)];
        assert_eq!(plan_swap(&snapshot, ids[0], MoveDirection::Up), None);
        assert_eq!(plan_swap(&snapshot, ids[1], MoveDirection::Down), None);
    }

    #[test]
    fn unknown_target_plans_nothing() {
        let ids = ids(2);
        let snapshot = vec![(ids[0], 1), (ids[1], 2)];
        assert_eq!(plan_swap(&snapshot, Uuid::new_v4(), MoveDirection::Up), None);
    }

    #[test]
    fn single_row_cannot_move() {
        let id = Uuid::new_v4();
        let snapshot = vec![(id, 7)];
        assert_eq!(plan_swap(&snapshot, id, MoveDirection::Up), None);
        assert_eq!(plan_swap(&snapshot, id, MoveDirection::Down), None);
    }

    #[test]
    fn direction_slugs_parse() {
        assert_eq!(MoveDirection::from_slug("up"), Some(MoveDirection::Up));
        assert_eq!(MoveDirection::from_slug("down"), Some(MoveDirection::Down));
        assert_eq!(MoveDirection::from_slug("sideways"), None);
    }

    mod db {
        use super::super::*;
        use crate::auth::domain::Identity;
        use crate::lifecycle::{self, ServiceInput};
        use crate::test_support;
        use models::service::{Provider, ServiceKind};
        use models::user::Role;

        async fn seed_identity(
            db: &DatabaseConnection,
            role: Role,
        ) -> Result<Identity, ServiceError> {
            let username = format!("ordering_{}", Uuid::new_v4());
            let hash = crate::auth::service::hash_password("Passw0rd")
                .map_err(|e| ServiceError::Validation(e.to_string()))?;
            let user = models::user::create(db, &username, &hash, role).await?;
            Ok(Identity { id: user.id, username: user.username, role: user.role })
        }

        #[tokio::test]
        async fn swap_exchanges_order_values() -> anyhow::Result<()> {
            let Some(db) = test_support::try_db().await else { return Ok(()) };

            let admin = seed_identity(&db, Role::Admin).await?;
            let hood = format!("hood_{}", Uuid::new_v4());
            models::neighborhood::create(&db, &hood, 5.0).await?;

            let input = ServiceInput {
                neighborhood: hood.clone(),
                kind: ServiceKind::Sale,
                document: "NF-1".into(),
                provider: Provider::Motorcycle,
                fee_applied: false,
                card_machine: false,
                value: "0,00".into(),
                note: None,
                address: None,
            };
            let a = lifecycle::create_service(&db, &admin, input.clone()).await?;
            let b = lifecycle::create_service(&db, &admin, input).await?;
            let a = lifecycle::transition_service(&db, &admin, a.id, ServiceStatus::EnRoute).await?;
            let b = lifecycle::transition_service(&db, &admin, b.id, ServiceStatus::EnRoute).await?;
            assert!(b.route_order.unwrap_or_default() > a.route_order.unwrap_or_default());

            // Bubble the later service to the top; other tests may hold
            // rows in the shared database, so walk until the boundary
            // no-op fires.
            let mut hops = 0;
            while move_adjacent(&db, &admin, b.id, MoveDirection::Up).await? {
                hops += 1;
                assert!(hops < 100, "reordering never reached the top");
            }
            assert!(hops >= 1, "expected at least one swap");

            let a2 = service::Entity::find_by_id(a.id).one(&db).await?.unwrap();
            let b2 = service::Entity::find_by_id(b.id).one(&db).await?.unwrap();
            // Relative ranking swapped, both still hold distinct slots.
            assert!(b2.route_order.unwrap() < a2.route_order.unwrap());
            assert_ne!(a2.route_order, b2.route_order);
            Ok(())
        }

        #[tokio::test]
        async fn operators_cannot_reorder() -> anyhow::Result<()> {
            let Some(db) = test_support::try_db().await else { return Ok(()) };

            let operator = seed_identity(&db, Role::Operator).await?;
            let denied =
                move_adjacent(&db, &operator, Uuid::new_v4(), MoveDirection::Up).await;
            assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
            Ok(())
        }
    }
}
