use crate::model::{
    id::{EventId, ProjectId, UserId},
    role::Role,
    user::UserProfile,
};
use derive_new::new;

/// The whitelisted project fields of a registration.
#[derive(Debug, Clone, new)]
pub struct NewProject {
    pub event_id: EventId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub org: Option<String>,
    pub org_ref: Option<String>,
}

/// A user submitted on the registration form, tagged with a role.
#[derive(Debug, Clone, new)]
pub struct CandidateUser {
    pub role: Role,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, new)]
pub struct CreateProject {
    pub creator: UserId,
    pub project: NewProject,
    pub users: Vec<CandidateUser>,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub project_id: ProjectId,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub org: Option<String>,
    pub org_ref: Option<String>,
}

/// An entry of the desired member list of a full update.
#[derive(Debug, Clone, new)]
pub struct ProjectUserInput {
    pub id: Option<UserId>,
    pub role: Role,
    pub profile: UserProfile,
}

/// Full update: project fields plus the complete desired member list.
#[derive(Debug, Clone, new)]
pub struct ReplaceProject {
    pub fields: UpdateProject,
    pub users: Vec<ProjectUserInput>,
}

#[derive(Debug, Clone, new)]
pub struct RemoveProjectUsers {
    pub project_id: ProjectId,
    pub user_ids: Vec<UserId>,
}
