//! Authorization policy: one table keyed by (action, role, ownership).
//!
//! Every mutating operation consults [`authorize`] exactly once; nothing
//! else in the codebase tests roles directly.

use models::user::Role;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateService,
    EditService,
    CancelService,
    SendToRoute,
    FinishService,
    ReturnToRegistered,
    ReorderRoute,
    ManageUsers,
    ManageNeighborhoods,
}

/// Capability table. `owns` is whether the acting user owns the target
/// service; it is ignored for actions that are not ownership-scoped.
pub fn allows(role: Role, action: Action, owns: bool) -> bool {
    use Action::*;
    match (role, action) {
        (Role::Admin, _) => true,

        (Role::Operator, CreateService) => true,
        (
            Role::Operator,
            EditService | CancelService | SendToRoute | FinishService | ReturnToRegistered,
        ) => owns,
        (Role::Operator, ReorderRoute | ManageUsers | ManageNeighborhoods) => false,

        // Couriers only close out deliveries and rearrange the active run.
        (Role::Courier, FinishService | ReorderRoute) => true,
        (Role::Courier, _) => false,
    }
}

pub fn authorize(role: Role, action: Action, owns: bool) -> Result<(), ServiceError> {
    if allows(role, action, owns) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(denial_message(action)))
    }
}

fn denial_message(action: Action) -> String {
    use Action::*;
    let msg = match action {
        CreateService => "couriers cannot create services",
        EditService => "you can only edit your own services",
        CancelService => "you can only cancel your own services",
        SendToRoute => "operators can only route their own services",
        FinishService => "operators can only finish their own services",
        ReturnToRegistered => "operators can only send back their own services",
        ReorderRoute => "operators cannot reorder services",
        ManageUsers => "only administrators can manage users",
        ManageNeighborhoods => "only administrators can manage neighborhoods",
    };
    msg.to_string()
}
