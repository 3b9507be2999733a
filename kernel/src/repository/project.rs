use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    id::{EventId, ProjectId, UserId},
    list::{ProjectListOptions, ProjectPage},
    membership::{Membership, NewMembership},
    project::{
        event::{NewProject, UpdateProject},
        Project,
    },
    role::Role,
    user::{event::SaveUser, User},
};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Opens a unit of work; nothing it writes is visible before `commit`.
    async fn begin(&self) -> AppResult<Box<dyn ProjectUnitOfWork>>;
    // プロジェクトをメンバー込みで取得する
    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<Project>>;
    async fn find_by_event(
        &self,
        event_id: EventId,
        options: ProjectListOptions,
    ) -> AppResult<ProjectPage>;
}

/// Transaction-scoped writes of the project association workflows.
/// Dropping it without `commit` discards every write.
#[async_trait]
pub trait ProjectUnitOfWork: Send {
    async fn insert_project(&mut self, project: &NewProject) -> AppResult<Project>;
    async fn update_project(&mut self, event: &UpdateProject) -> AppResult<()>;
    async fn find_user_id_by_email(&mut self, email: &str) -> AppResult<Option<UserId>>;
    async fn save_user(&mut self, event: SaveUser) -> AppResult<User>;
    async fn find_memberships(&mut self, project_id: ProjectId) -> AppResult<Vec<Membership>>;
    /// Inserts every membership in one statement.
    async fn attach_members(
        &mut self,
        project_id: ProjectId,
        members: &[NewMembership],
    ) -> AppResult<()>;
    async fn change_role(
        &mut self,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()>;
    /// Deletes the non-owner memberships of the given users, returning how
    /// many rows went away.
    async fn remove_members(&mut self, project_id: ProjectId, user_ids: &[UserId])
        -> AppResult<u64>;
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
