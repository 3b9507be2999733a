use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{EventId, ProjectId, UserId},
    list::{Pagination, ProjectListOptions, ProjectOrderBy, ProjectPage, DEFAULT_PAGE_SIZE},
    project::{
        event::{CreateProject, NewProject, RemoveProjectUsers, ReplaceProject, UpdateProject},
        Project,
    },
};
use serde::{Deserialize, Serialize};

use super::user::{ProjectUserRequest, ProjectUserResponse};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(length(min = 1))]
    pub category: String,
    #[garde(skip)]
    #[serde(default)]
    pub description: String,
    #[garde(skip)]
    pub org: Option<String>,
    #[garde(skip)]
    pub org_ref: Option<String>,
    #[garde(dive)]
    #[serde(default)]
    pub users: Vec<ProjectUserRequest>,
}

#[derive(new)]
pub struct CreateProjectRequestWithIds(EventId, UserId, CreateProjectRequest);

impl From<CreateProjectRequestWithIds> for CreateProject {
    fn from(value: CreateProjectRequestWithIds) -> Self {
        let CreateProjectRequestWithIds(
            event_id,
            creator,
            CreateProjectRequest {
                name,
                category,
                description,
                org,
                org_ref,
                users,
            },
        ) = value;
        CreateProject {
            creator,
            project: NewProject::new(event_id, name, category, description, org, org_ref),
            users: users.into_iter().map(Into::into).collect(),
        }
    }
}

// 部分更新用の型。指定された項目だけを更新する
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[garde(length(min = 1))]
    pub name: Option<String>,
    #[garde(length(min = 1))]
    pub category: Option<String>,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(skip)]
    pub org: Option<String>,
    #[garde(skip)]
    pub org_ref: Option<String>,
}

#[derive(new)]
pub struct UpdateProjectRequestWithIds(ProjectId, UpdateProjectRequest);

impl From<UpdateProjectRequestWithIds> for UpdateProject {
    fn from(value: UpdateProjectRequestWithIds) -> Self {
        let UpdateProjectRequestWithIds(
            project_id,
            UpdateProjectRequest {
                name,
                category,
                description,
                org,
                org_ref,
            },
        ) = value;
        UpdateProject {
            project_id,
            name,
            category,
            description,
            org,
            org_ref,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceProjectRequest {
    #[garde(dive)]
    #[serde(flatten)]
    pub project: UpdateProjectRequest,
    #[garde(dive)]
    pub users: Vec<ProjectUserRequest>,
}

#[derive(new)]
pub struct ReplaceProjectRequestWithIds(ProjectId, ReplaceProjectRequest);

impl From<ReplaceProjectRequestWithIds> for ReplaceProject {
    fn from(value: ReplaceProjectRequestWithIds) -> Self {
        let ReplaceProjectRequestWithIds(project_id, ReplaceProjectRequest { project, users }) =
            value;
        ReplaceProject {
            fields: UpdateProjectRequestWithIds::new(project_id, project).into(),
            users: users.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoveProjectUsersRequest {
    #[garde(length(min = 1))]
    pub user_ids: Vec<UserId>,
}

#[derive(new)]
pub struct RemoveProjectUsersRequestWithIds(ProjectId, RemoveProjectUsersRequest);

impl From<RemoveProjectUsersRequestWithIds> for RemoveProjectUsers {
    fn from(value: RemoveProjectUsersRequestWithIds) -> Self {
        let RemoveProjectUsersRequestWithIds(project_id, RemoveProjectUsersRequest { user_ids }) =
            value;
        RemoveProjectUsers::new(project_id, user_ids)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedUsersResponse {
    pub removed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    #[default]
    Json,
    Csv,
}

const fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

const fn default_page() -> i64 {
    1
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListQuery {
    #[garde(skip)]
    pub event_id: Option<EventId>,
    #[garde(skip)]
    pub query: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub order_by: ProjectOrderBy,
    #[garde(skip)]
    pub ascending: Option<String>,
    #[garde(range(min = 1, max = 1000))]
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[garde(range(min = 1))]
    #[serde(default = "default_page")]
    pub page: i64,
    #[garde(skip)]
    #[serde(default)]
    pub format: ListFormat,
}

impl ProjectListQuery {
    /// The CSV export returns every matching project instead of a page.
    pub fn is_export(&self) -> bool {
        self.format == ListFormat::Csv
    }
}

impl From<ProjectListQuery> for ProjectListOptions {
    fn from(value: ProjectListQuery) -> Self {
        let pagination = (!value.is_export()).then_some(Pagination {
            limit: value.limit,
            page: value.page,
        });
        let ProjectListQuery {
            query,
            order_by,
            ascending,
            ..
        } = value;
        ProjectListOptions {
            query,
            order_by,
            ascending: matches!(ascending.as_deref(), Some("1" | "true")),
            pagination,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: ProjectId,
    pub event_id: EventId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub org: Option<String>,
    pub org_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<ProjectUserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor: Option<ProjectUserResponse>,
    pub users: Vec<ProjectUserResponse>,
}

impl From<Project> for ProjectResponse {
    fn from(value: Project) -> Self {
        let owner = value.owner().map(ProjectUserResponse::from);
        let supervisor = value.supervisor().map(ProjectUserResponse::from);
        let users = value.users().map(ProjectUserResponse::from).collect();
        let Project {
            id,
            event_id,
            name,
            category,
            description,
            org,
            org_ref,
            created_at,
            updated_at,
            members: _,
        } = value;
        Self {
            id,
            event_id,
            name,
            category,
            description,
            org,
            org_ref,
            created_at,
            updated_at,
            owner,
            supervisor,
            users,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedProjectResponse {
    pub data: Vec<ProjectResponse>,
    pub count: i64,
}

impl From<ProjectPage> for PaginatedProjectResponse {
    fn from(value: ProjectPage) -> Self {
        let ProjectPage { total, items } = value;
        Self {
            data: items.into_iter().map(ProjectResponse::from).collect(),
            count: total,
        }
    }
}
