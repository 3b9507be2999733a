use crate::model::{
    id::{EventId, ProjectId, UserId},
    role::Role,
    user::User,
};
use chrono::{DateTime, Utc};

pub mod event;

#[derive(Debug, Clone)]
pub struct Project {
    pub id: ProjectId,
    pub event_id: EventId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub org: Option<String>,
    pub org_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub members: Vec<ProjectMember>,
}

/// A user together with the role they hold in a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMember {
    pub user: User,
    pub role: Role,
}

impl Project {
    pub fn owner(&self) -> Option<&ProjectMember> {
        self.members_with_role(Role::Owner).next()
    }

    pub fn supervisor(&self) -> Option<&ProjectMember> {
        self.members_with_role(Role::Supervisor).next()
    }

    pub fn members_with_role(&self, role: Role) -> impl Iterator<Item = &ProjectMember> {
        self.members.iter().filter(move |m| m.role == role)
    }

    /// Every member except the owner.
    pub fn users(&self) -> impl Iterator<Item = &ProjectMember> {
        self.members.iter().filter(|m| !m.role.is_owner())
    }

    pub fn role_of(&self, user_id: UserId) -> Option<Role> {
        self.members
            .iter()
            .filter(|m| m.user.id == user_id)
            .map(|m| m.role)
            .max_by_key(|role| role.can_edit())
    }

    pub fn can_be_edited_by(&self, user_id: UserId) -> bool {
        self.role_of(user_id).is_some_and(Role::can_edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::UserProfile;

    fn member(role: Role) -> ProjectMember {
        ProjectMember {
            user: User {
                id: UserId::new(),
                profile: UserProfile {
                    first_name: format!("{role:?}"),
                    last_name: "one".into(),
                    ..Default::default()
                },
            },
            role,
        }
    }

    fn project(members: Vec<ProjectMember>) -> Project {
        Project {
            id: ProjectId::new(),
            event_id: EventId::new(),
            name: "MyLittleProject".into(),
            category: "Flash".into(),
            description: String::new(),
            org: None,
            org_ref: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            members,
        }
    }

    #[test]
    fn role_accessors_pick_the_singular_relations() {
        let owner = member(Role::Owner);
        let supervisor = member(Role::Supervisor);
        let plain = member(Role::Member);
        let p = project(vec![owner.clone(), plain.clone(), supervisor.clone()]);

        assert_eq!(p.owner(), Some(&owner));
        assert_eq!(p.supervisor(), Some(&supervisor));
        let users: Vec<_> = p.users().collect();
        assert_eq!(users, vec![&plain, &supervisor]);
    }

    #[test]
    fn only_owner_or_supervisor_can_edit() {
        let owner = member(Role::Owner);
        let supervisor = member(Role::Supervisor);
        let plain = member(Role::Member);
        let p = project(vec![owner.clone(), plain.clone(), supervisor.clone()]);

        assert!(p.can_be_edited_by(owner.user.id));
        assert!(p.can_be_edited_by(supervisor.user.id));
        assert!(!p.can_be_edited_by(plain.user.id));
        assert!(!p.can_be_edited_by(UserId::new()));
    }
}
