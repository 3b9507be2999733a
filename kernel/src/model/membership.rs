use crate::model::{
    id::{ProjectId, UserId},
    project::event::ProjectUserInput,
    role::Role,
};
use std::collections::HashSet;

/// Join record between a project and a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Membership {
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: Role,
}

/// A membership about to be attached to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewMembership {
    pub user_id: UserId,
    pub role: Role,
}

impl NewMembership {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn owner(user_id: UserId) -> Self {
        Self::new(user_id, Role::Owner)
    }
}

/// Ids of the users holding a membership in `current` but missing from
/// `desired`. Owner memberships are never reported.
pub fn missing_users(current: &[Membership], desired: &[ProjectUserInput]) -> Vec<UserId> {
    let kept: HashSet<UserId> = desired.iter().filter_map(|u| u.id).collect();
    let mut seen = HashSet::new();
    current
        .iter()
        .filter(|m| !m.role.is_owner() && !kept.contains(&m.user_id))
        .filter(|m| seen.insert(m.user_id))
        .map(|m| m.user_id)
        .collect()
}

/// Entries of the desired list that a full update may write.
///
/// Owner entries are dropped, as are entries carrying an id that has no
/// membership in `current`: an id can only refer to a user already on the
/// project.
pub fn writable_users(
    current: &[Membership],
    desired: Vec<ProjectUserInput>,
) -> Vec<ProjectUserInput> {
    desired
        .into_iter()
        .filter(|u| !u.role.is_owner())
        .filter(|u| match u.id {
            None => true,
            Some(id) => current.iter().any(|m| m.user_id == id),
        })
        .collect()
}
