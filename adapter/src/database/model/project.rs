use chrono::{DateTime, Utc};
use kernel::model::{
    id::{EventId, ProjectId, UserId},
    membership::Membership,
    project::{Project, ProjectMember},
    role::Role,
    user::User,
};
use shared::error::{AppError, AppResult};
use sqlx::FromRow;

use super::user::UserRow;

#[derive(FromRow)]
pub struct ProjectRow {
    pub project_id: ProjectId,
    pub event_id: EventId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub org: Option<String>,
    pub org_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// From トレイトの代わりに、メンバー一覧を引数にとる into_project を定義する
impl ProjectRow {
    pub fn into_project(self, members: Vec<ProjectMember>) -> Project {
        let ProjectRow {
            project_id,
            event_id,
            name,
            category,
            description,
            org,
            org_ref,
            created_at,
            updated_at,
        } = self;
        Project {
            id: project_id,
            event_id,
            name,
            category,
            description,
            org,
            org_ref,
            created_at,
            updated_at,
            members,
        }
    }
}

#[derive(FromRow)]
pub struct MembershipRow {
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: String,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = AppError;

    fn try_from(value: MembershipRow) -> AppResult<Self> {
        let MembershipRow {
            project_id,
            user_id,
            role,
        } = value;
        Ok(Membership {
            project_id,
            user_id,
            role: parse_role(&role)?,
        })
    }
}

/// A membership joined with the user it points to.
#[derive(FromRow)]
pub struct ProjectMemberRow {
    pub project_id: ProjectId,
    pub role: String,
    #[sqlx(flatten)]
    pub user: UserRow,
}

impl ProjectMemberRow {
    pub fn into_member(self) -> AppResult<(ProjectId, ProjectMember)> {
        let ProjectMemberRow {
            project_id,
            role,
            user,
        } = self;
        let member = ProjectMember {
            user: User::from(user),
            role: parse_role(&role)?,
        };
        Ok((project_id, member))
    }
}

fn parse_role(value: &str) -> AppResult<Role> {
    value
        .parse()
        .map_err(|_| AppError::ConversionEntityError(format!("unknown project role: {value}")))
}
