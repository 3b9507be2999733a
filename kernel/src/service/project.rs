use std::sync::Arc;

use derive_new::new;
use shared::error::{AppError, AppResult};

use crate::{
    model::{
        id::ProjectId,
        membership::{missing_users, writable_users, NewMembership},
        project::{
            event::{CreateProject, RemoveProjectUsers, ReplaceProject, UpdateProject},
            Project, ProjectMember,
        },
        user::{event::SaveUser, User, UserProfile},
    },
    repository::project::{ProjectRepository, ProjectUnitOfWork},
};

/// Write workflows over projects, their users and memberships.
///
/// Each workflow runs in a single unit of work. Storage failures come back as
/// [`AppError::ProjectSaveError`]; the original error is only logged.
#[derive(new)]
pub struct ProjectAssociationService {
    repository: Arc<dyn ProjectRepository>,
}

impl ProjectAssociationService {
    pub async fn create(&self, event: CreateProject) -> AppResult<Project> {
        self.create_project(event)
            .await
            .map_err(AppError::into_project_save_error)
    }

    pub async fn update(&self, event: UpdateProject) -> AppResult<Project> {
        let project_id = event.project_id;
        self.update_project(event)
            .await
            .map_err(AppError::into_project_save_error)?;
        self.reload(project_id).await
    }

    pub async fn replace(&self, event: ReplaceProject) -> AppResult<Project> {
        let project_id = event.fields.project_id;
        self.replace_project(event)
            .await
            .map_err(AppError::into_project_save_error)?;
        self.reload(project_id).await
    }

    pub async fn remove_users(&self, event: RemoveProjectUsers) -> AppResult<u64> {
        self.remove_project_users(event)
            .await
            .map_err(AppError::into_project_save_error)
    }

    async fn create_project(&self, event: CreateProject) -> AppResult<Project> {
        let CreateProject {
            creator,
            project,
            users,
        } = event;

        if users.iter().any(|u| u.role.is_owner()) {
            return Err(AppError::UnprocessableEntity(
                "The owner role is reserved for the creator of the project.".into(),
            ));
        }

        let mut uow = self.repository.begin().await?;
        // プロジェクトの保存に失敗した場合、ユーザーは一切書き込まない
        let mut created = uow.insert_project(&project).await?;

        let mut memberships: Vec<NewMembership> = Vec::with_capacity(users.len() + 1);
        for candidate in users {
            let user = upsert_by_email(&mut uow, candidate.profile).await?;
            let membership = NewMembership::new(user.id, candidate.role);
            if memberships.contains(&membership) {
                continue;
            }
            memberships.push(membership);
            created.members.push(ProjectMember {
                user,
                role: candidate.role,
            });
        }
        // The owner is attached but stays out of the returned users.
        memberships.push(NewMembership::owner(creator));

        uow.attach_members(created.id, &memberships).await?;
        uow.commit().await?;

        tracing::info!(
            project_id = %created.id,
            event_id = %created.event_id,
            memberships = memberships.len(),
            "Project registered"
        );
        Ok(created)
    }

    async fn update_project(&self, event: UpdateProject) -> AppResult<()> {
        let mut uow = self.repository.begin().await?;
        uow.update_project(&event).await?;
        uow.commit().await
    }

    async fn replace_project(&self, event: ReplaceProject) -> AppResult<()> {
        let ReplaceProject { fields, users } = event;
        let project_id = fields.project_id;

        let mut uow = self.repository.begin().await?;
        uow.update_project(&fields).await?;

        let current = uow.find_memberships(project_id).await?;

        let missing = missing_users(&current, &users);
        if !missing.is_empty() {
            uow.remove_members(project_id, &missing).await?;
            // ユーザー自体は削除しない
            tracing::info!(
                %project_id,
                released_users = ?missing,
                "Users released from project"
            );
        }

        let mut attached: Vec<NewMembership> = Vec::new();
        for input in writable_users(&current, users) {
            match input.id {
                Some(user_id) => {
                    uow.save_user(SaveUser::new(Some(user_id), input.profile))
                        .await?;
                    let holds_role = current
                        .iter()
                        .any(|m| m.user_id == user_id && m.role == input.role);
                    let changeable = current
                        .iter()
                        .any(|m| m.user_id == user_id && !m.role.is_owner());
                    if !holds_role && changeable {
                        uow.change_role(project_id, user_id, input.role).await?;
                    }
                }
                None => {
                    let user = upsert_by_email(&mut uow, input.profile).await?;
                    let already_member = current.iter().any(|m| m.user_id == user.id)
                        || attached.iter().any(|m| m.user_id == user.id);
                    if !already_member {
                        attached.push(NewMembership::new(user.id, input.role));
                    }
                }
            }
        }
        if !attached.is_empty() {
            uow.attach_members(project_id, &attached).await?;
        }

        uow.commit().await
    }

    async fn remove_project_users(&self, event: RemoveProjectUsers) -> AppResult<u64> {
        if event.user_ids.is_empty() {
            return Ok(0);
        }
        let mut uow = self.repository.begin().await?;
        let removed = uow
            .remove_members(event.project_id, &event.user_ids)
            .await?;
        uow.commit().await?;
        Ok(removed)
    }

    async fn reload(&self, project_id: ProjectId) -> AppResult<Project> {
        self.repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(format!("Project {project_id} not found")))
    }
}

/// Saves a user, reusing the identity of an existing user with the same
/// email.
async fn upsert_by_email(
    uow: &mut Box<dyn ProjectUnitOfWork>,
    profile: UserProfile,
) -> AppResult<User> {
    let id = match profile.email.as_deref() {
        Some(email) => uow.find_user_id_by_email(email).await?,
        None => None,
    };
    uow.save_user(SaveUser::new(id, profile)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        id::{EventId, UserId},
        list::{PaginatedList, ProjectListOptions, ProjectPage},
        membership::Membership,
        project::event::{CandidateUser, NewProject, ProjectUserInput},
        role::Role,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Store {
        projects: Vec<Project>,
        users: Vec<User>,
        memberships: Vec<Membership>,
        attach_batches: Vec<Vec<NewMembership>>,
        removed_rows: u64,
    }

    impl Store {
        fn load(&self, project_id: ProjectId) -> Option<Project> {
            let mut project = self.projects.iter().find(|p| p.id == project_id)?.clone();
            project.members = self
                .memberships
                .iter()
                .filter(|m| m.project_id == project_id)
                .filter_map(|m| {
                    let user = self.users.iter().find(|u| u.id == m.user_id)?.clone();
                    Some(ProjectMember { user, role: m.role })
                })
                .collect();
            Some(project)
        }
    }

    #[derive(Default, Clone, Copy)]
    struct Faults {
        project_insert: bool,
        user_save: bool,
    }

    #[derive(Default)]
    struct InMemoryProjects {
        store: Arc<Mutex<Store>>,
        faults: Faults,
    }

    impl InMemoryProjects {
        fn snapshot(&self) -> Store {
            self.store.lock().unwrap().clone()
        }

        fn seed_user(&self, profile: UserProfile) -> UserId {
            let id = UserId::new();
            self.store.lock().unwrap().users.push(User { id, profile });
            id
        }
    }

    struct InMemoryUnitOfWork {
        shared: Arc<Mutex<Store>>,
        working: Store,
        faults: Faults,
    }

    fn query_failed() -> AppError {
        AppError::NoRowsAffectedError("simulated failure".into())
    }

    #[async_trait]
    impl ProjectRepository for InMemoryProjects {
        async fn begin(&self) -> AppResult<Box<dyn ProjectUnitOfWork>> {
            Ok(Box::new(InMemoryUnitOfWork {
                shared: self.store.clone(),
                working: self.snapshot(),
                faults: self.faults,
            }))
        }

        async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<Project>> {
            Ok(self.snapshot().load(project_id))
        }

        async fn find_by_event(
            &self,
            event_id: EventId,
            _options: ProjectListOptions,
        ) -> AppResult<ProjectPage> {
            let store = self.snapshot();
            let items: Vec<Project> = store
                .projects
                .iter()
                .filter(|p| p.event_id == event_id)
                .filter_map(|p| store.load(p.id))
                .collect();
            Ok(PaginatedList {
                total: items.len() as i64,
                items,
            })
        }
    }

    #[async_trait]
    impl ProjectUnitOfWork for InMemoryUnitOfWork {
        async fn insert_project(&mut self, project: &NewProject) -> AppResult<Project> {
            if self.faults.project_insert {
                return Err(query_failed());
            }
            let now = Utc::now();
            let created = Project {
                id: ProjectId::new(),
                event_id: project.event_id,
                name: project.name.clone(),
                category: project.category.clone(),
                description: project.description.clone(),
                org: project.org.clone(),
                org_ref: project.org_ref.clone(),
                created_at: now,
                updated_at: now,
                members: Vec::new(),
            };
            self.working.projects.push(created.clone());
            Ok(created)
        }

        async fn update_project(&mut self, event: &UpdateProject) -> AppResult<()> {
            let project = self
                .working
                .projects
                .iter_mut()
                .find(|p| p.id == event.project_id)
                .ok_or_else(query_failed)?;
            if let Some(name) = &event.name {
                project.name = name.clone();
            }
            if let Some(category) = &event.category {
                project.category = category.clone();
            }
            if let Some(description) = &event.description {
                project.description = description.clone();
            }
            project.updated_at = Utc::now();
            Ok(())
        }

        async fn find_user_id_by_email(&mut self, email: &str) -> AppResult<Option<UserId>> {
            Ok(self
                .working
                .users
                .iter()
                .find(|u| u.email() == Some(email))
                .map(|u| u.id))
        }

        async fn save_user(&mut self, event: SaveUser) -> AppResult<User> {
            if self.faults.user_save {
                return Err(query_failed());
            }
            match event.id {
                Some(id) => {
                    let user = self
                        .working
                        .users
                        .iter_mut()
                        .find(|u| u.id == id)
                        .ok_or_else(|| AppError::EntityNotFound("user".into()))?;
                    user.profile = event.profile;
                    Ok(user.clone())
                }
                None => {
                    let user = User {
                        id: UserId::new(),
                        profile: event.profile,
                    };
                    self.working.users.push(user.clone());
                    Ok(user)
                }
            }
        }

        async fn find_memberships(&mut self, project_id: ProjectId) -> AppResult<Vec<Membership>> {
            Ok(self
                .working
                .memberships
                .iter()
                .filter(|m| m.project_id == project_id)
                .copied()
                .collect())
        }

        async fn attach_members(
            &mut self,
            project_id: ProjectId,
            members: &[NewMembership],
        ) -> AppResult<()> {
            self.working.attach_batches.push(members.to_vec());
            self.working
                .memberships
                .extend(members.iter().map(|m| Membership {
                    project_id,
                    user_id: m.user_id,
                    role: m.role,
                }));
            Ok(())
        }

        async fn change_role(
            &mut self,
            project_id: ProjectId,
            user_id: UserId,
            role: Role,
        ) -> AppResult<()> {
            self.working
                .memberships
                .iter_mut()
                .filter(|m| m.project_id == project_id && m.user_id == user_id)
                .filter(|m| !m.role.is_owner())
                .for_each(|m| m.role = role);
            Ok(())
        }

        async fn remove_members(
            &mut self,
            project_id: ProjectId,
            user_ids: &[UserId],
        ) -> AppResult<u64> {
            let before = self.working.memberships.len();
            self.working.memberships.retain(|m| {
                m.project_id != project_id || m.role.is_owner() || !user_ids.contains(&m.user_id)
            });
            let removed = (before - self.working.memberships.len()) as u64;
            self.working.removed_rows += removed;
            Ok(removed)
        }

        async fn commit(self: Box<Self>) -> AppResult<()> {
            *self.shared.lock().unwrap() = self.working;
            Ok(())
        }
    }

    fn profile(first_name: &str, email: Option<&str>) -> UserProfile {
        UserProfile {
            first_name: first_name.into(),
            last_name: "one".into(),
            email: email.map(Into::into),
            ..Default::default()
        }
    }

    fn new_project() -> NewProject {
        NewProject::new(
            EventId::new(),
            "MyLittleProject".into(),
            "Flash".into(),
            "A little project".into(),
            None,
            None,
        )
    }

    fn service(repository: &Arc<InMemoryProjects>) -> ProjectAssociationService {
        ProjectAssociationService::new(repository.clone())
    }

    #[tokio::test]
    async fn create_attaches_one_membership_per_user_plus_owner() -> anyhow::Result<()> {
        let repository = Arc::new(InMemoryProjects::default());
        let creator = repository.seed_user(profile("creator", Some("creator@example.com")));

        let users = vec![
            CandidateUser::new(Role::Member, profile("member", None)),
            CandidateUser::new(Role::Member, profile("other", None)),
            CandidateUser::new(Role::Supervisor, profile("supervisor", Some("s@example.com"))),
        ];
        let created = service(&repository)
            .create(CreateProject::new(creator, new_project(), users))
            .await?;

        let store = repository.snapshot();
        let memberships: Vec<_> = store
            .memberships
            .iter()
            .filter(|m| m.project_id == created.id)
            .collect();
        assert_eq!(memberships.len(), 4);
        assert_eq!(store.attach_batches.len(), 1);
        assert!(memberships
            .iter()
            .any(|m| m.user_id == creator && m.role == Role::Owner));

        assert_eq!(created.members.len(), 3);
        assert!(created.owner().is_none());
        assert!(created.members.iter().all(|m| m.user.id != creator));
        Ok(())
    }

    #[tokio::test]
    async fn create_reuses_users_matched_by_email() -> anyhow::Result<()> {
        let repository = Arc::new(InMemoryProjects::default());
        let creator = repository.seed_user(profile("creator", None));
        let user2 = repository.seed_user(profile("old name", Some("a@aa.a")));

        let mut supervisor = profile("supervisor", Some("a@aa.a"));
        supervisor.phone = Some("01234567".into());
        let users = vec![
            CandidateUser::new(Role::Member, profile("member", None)),
            CandidateUser::new(Role::Supervisor, supervisor),
        ];
        let created = service(&repository)
            .create(CreateProject::new(creator, new_project(), users))
            .await?;

        let store = repository.snapshot();
        let batch = &store.attach_batches[0];
        let user1 = created.members[0].user.id;
        assert_ne!(user1, user2);
        assert_eq!(
            batch,
            &vec![
                NewMembership::new(user1, Role::Member),
                NewMembership::new(user2, Role::Supervisor),
                NewMembership::owner(creator),
            ]
        );

        // 既存ユーザーはメールアドレスで特定され、内容が更新される
        let updated = store.users.iter().find(|u| u.id == user2).unwrap();
        assert_eq!(updated.profile.first_name, "supervisor");
        assert_eq!(updated.profile.phone.as_deref(), Some("01234567"));
        assert_eq!(store.users.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn create_fails_without_writing_users_when_project_save_fails() {
        let repository = Arc::new(InMemoryProjects {
            faults: Faults {
                project_insert: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let creator = repository.seed_user(profile("creator", None));

        let res = service(&repository)
            .create(CreateProject::new(
                creator,
                new_project(),
                vec![CandidateUser::new(Role::Member, profile("member", None))],
            ))
            .await;

        let err = res.unwrap_err();
        assert!(matches!(err, AppError::ProjectSaveError));
        assert_eq!(err.to_string(), "Error while saving your project.");
        let store = repository.snapshot();
        assert_eq!(store.users.len(), 1);
        assert!(store.projects.is_empty());
        assert!(store.memberships.is_empty());
    }

    #[tokio::test]
    async fn create_leaves_no_partial_state_when_a_user_save_fails() {
        let repository = Arc::new(InMemoryProjects {
            faults: Faults {
                user_save: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let creator = repository.seed_user(profile("creator", None));

        let err = service(&repository)
            .create(CreateProject::new(
                creator,
                new_project(),
                vec![CandidateUser::new(Role::Member, profile("member", None))],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ProjectSaveError));
        let store = repository.snapshot();
        assert!(store.projects.is_empty());
        assert!(store.memberships.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_an_owner_candidate() {
        let repository = Arc::new(InMemoryProjects::default());
        let creator = repository.seed_user(profile("creator", None));

        let err = service(&repository)
            .create(CreateProject::new(
                creator,
                new_project(),
                vec![CandidateUser::new(Role::Owner, profile("intruder", None))],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        assert!(repository.snapshot().projects.is_empty());
    }

    async fn registered(
        repository: &Arc<InMemoryProjects>,
    ) -> Result<(UserId, Project), AppError> {
        let creator = repository.seed_user(profile("creator", None));
        let created = service(repository)
            .create(CreateProject::new(
                creator,
                new_project(),
                vec![
                    CandidateUser::new(Role::Member, profile("member", None)),
                    CandidateUser::new(Role::Supervisor, profile("supervisor", Some("s@a.a"))),
                ],
            ))
            .await?;
        Ok((creator, created))
    }

    fn as_inputs(project: &Project) -> Vec<ProjectUserInput> {
        project
            .users()
            .map(|m| ProjectUserInput::new(Some(m.user.id), m.role, m.user.profile.clone()))
            .collect()
    }

    fn fields(project_id: ProjectId) -> UpdateProject {
        UpdateProject {
            project_id,
            name: Some("Renamed".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn replace_with_unchanged_users_touches_no_membership() -> anyhow::Result<()> {
        let repository = Arc::new(InMemoryProjects::default());
        let (_, created) = registered(&repository).await?;
        let before = repository.snapshot();

        let project = service(&repository)
            .replace(ReplaceProject::new(fields(created.id), as_inputs(&created)))
            .await?;

        let after = repository.snapshot();
        assert_eq!(after.memberships, before.memberships);
        assert_eq!(after.attach_batches.len(), before.attach_batches.len());
        assert_eq!(after.removed_rows, 0);
        assert_eq!(project.name, "Renamed");
        assert_eq!(project.members.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn replace_diffs_members_and_keeps_the_owner() -> anyhow::Result<()> {
        let repository = Arc::new(InMemoryProjects::default());
        let (creator, created) = registered(&repository).await?;
        let supervisor = created.supervisor().unwrap().user.id;

        // メンバーを外し、新しいメンバーを追加する。オーナーは一覧に含めない
        let users = vec![
            ProjectUserInput::new(
                Some(supervisor),
                Role::Supervisor,
                profile("supervisor", Some("s@a.a")),
            ),
            ProjectUserInput::new(None, Role::Member, profile("newcomer", None)),
            ProjectUserInput::new(Some(UserId::new()), Role::Member, profile("spoof", None)),
        ];
        let project = service(&repository)
            .replace(ReplaceProject::new(fields(created.id), users))
            .await?;

        assert_eq!(project.owner().map(|m| m.user.id), Some(creator));
        assert_eq!(project.supervisor().map(|m| m.user.id), Some(supervisor));
        let names: Vec<_> = project
            .members_with_role(Role::Member)
            .map(|m| m.user.profile.first_name.as_str())
            .collect();
        assert_eq!(names, vec!["newcomer"]);
        assert_eq!(repository.snapshot().removed_rows, 1);
        assert!(!repository
            .snapshot()
            .users
            .iter()
            .any(|u| u.profile.first_name == "spoof"));
        Ok(())
    }

    #[tokio::test]
    async fn replace_changes_the_role_of_an_existing_member() -> anyhow::Result<()> {
        let repository = Arc::new(InMemoryProjects::default());
        let (_, created) = registered(&repository).await?;

        let mut users = as_inputs(&created);
        for user in users.iter_mut() {
            user.role = match user.role {
                Role::Member => Role::Supervisor,
                _ => Role::Member,
            };
        }
        let project = service(&repository)
            .replace(ReplaceProject::new(fields(created.id), users))
            .await?;

        assert_eq!(project.members_with_role(Role::Supervisor).count(), 1);
        assert_eq!(project.members_with_role(Role::Member).count(), 1);
        assert_eq!(project.members_with_role(Role::Owner).count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn remove_users_never_deletes_the_owner() -> anyhow::Result<()> {
        let repository = Arc::new(InMemoryProjects::default());
        let (creator, created) = registered(&repository).await?;
        let member = created.members_with_role(Role::Member).next().unwrap().user.id;

        let removed = service(&repository)
            .remove_users(RemoveProjectUsers::new(created.id, vec![creator, member]))
            .await?;

        assert_eq!(removed, 1);
        let project = repository.find_by_id(created.id).await?.unwrap();
        assert_eq!(project.owner().map(|m| m.user.id), Some(creator));
        assert_eq!(project.members.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn update_only_writes_given_fields() -> anyhow::Result<()> {
        let repository = Arc::new(InMemoryProjects::default());
        let (_, created) = registered(&repository).await?;

        let project = service(&repository).update(fields(created.id)).await?;

        assert_eq!(project.name, "Renamed");
        assert_eq!(project.category, created.category);
        assert_eq!(project.members.len(), 3);
        Ok(())
    }
}
