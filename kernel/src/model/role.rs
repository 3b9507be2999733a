use strum::{AsRefStr, EnumString};

/// Role a user holds inside a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Owner,
    Supervisor,
    Member,
}

impl Role {
    pub fn is_owner(self) -> bool {
        self == Role::Owner
    }

    /// Owners and supervisors may edit a project and its member list.
    pub fn can_edit(self) -> bool {
        matches!(self, Role::Owner | Role::Supervisor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_column_value() {
        assert_eq!(Role::Supervisor.as_ref(), "supervisor");
        assert_eq!("owner".parse::<Role>().unwrap(), Role::Owner);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn only_owner_and_supervisor_edit() {
        assert!(Role::Owner.can_edit());
        assert!(Role::Supervisor.can_edit());
        assert!(!Role::Member.can_edit());
    }
}
