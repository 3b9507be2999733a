use crate::model::project::Project;
use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Columns a project listing may be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectOrderBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Category,
}

impl ProjectOrderBy {
    pub fn column(self) -> &'static str {
        match self {
            ProjectOrderBy::CreatedAt => "created_at",
            ProjectOrderBy::UpdatedAt => "updated_at",
            ProjectOrderBy::Name => "name",
            ProjectOrderBy::Category => "category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl Pagination {
    /// `None` when the page lies beyond what an OFFSET can express.
    pub fn offset(&self) -> Option<i64> {
        (self.page.max(1) - 1).checked_mul(self.limit)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectListOptions {
    /// Free text matched against the project name and its owner/supervisor.
    pub query: Option<String>,
    pub order_by: ProjectOrderBy,
    pub ascending: bool,
    /// `None` returns every matching project.
    pub pagination: Option<Pagination>,
}

#[derive(Debug)]
pub struct PaginatedList<T> {
    pub total: i64,
    pub items: Vec<T>,
}

pub type ProjectPage = PaginatedList<Project>;
