use std::collections::HashMap;

use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{EventId, ProjectId, UserId},
    list::{PaginatedList, ProjectListOptions, ProjectPage},
    membership::{Membership, NewMembership},
    project::{
        event::{NewProject, UpdateProject},
        Project, ProjectMember,
    },
    role::Role,
    user::{event::SaveUser, User},
};
use kernel::repository::project::{ProjectRepository, ProjectUnitOfWork};
use shared::error::{AppError, AppResult};
use sqlx::{Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::database::{
    model::{
        project::{MembershipRow, ProjectMemberRow, ProjectRow},
        user::UserRow,
    },
    ConnectionPool,
};

const PROJECT_COLUMNS: &str = r#"
    project_id, event_id, name, category, description, org, org_ref, created_at, updated_at
"#;

const USER_COLUMNS: &str = r#"
    user_id, first_name, last_name, email, phone, dob, gender, country, special_requirements
"#;

#[derive(new)]
pub struct ProjectRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ProjectRepository for ProjectRepositoryImpl {
    async fn begin(&self) -> AppResult<Box<dyn ProjectUnitOfWork>> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgProjectUnitOfWork { tx }))
    }

    async fn find_by_id(&self, project_id: ProjectId) -> AppResult<Option<Project>> {
        Ok(self.load_projects(&[project_id]).await?.pop())
    }

    async fn find_by_event(
        &self,
        event_id: EventId,
        options: ProjectListOptions,
    ) -> AppResult<ProjectPage> {
        let ProjectListOptions {
            query,
            order_by,
            ascending,
            pagination,
        } = options;

        let query = query.filter(|q| !q.trim().is_empty());
        let offset = match pagination {
            Some(pagination) => Some(pagination.offset().ok_or_else(|| {
                AppError::InvalidRequest("The requested page is out of range.".into())
            })?),
            None => None,
        };

        // 件数はページの範囲に関係なく数える
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects AS p");
        push_filters(&mut count, event_id, query.as_deref());
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT p.project_id FROM projects AS p");
        push_filters(&mut builder, event_id, query.as_deref());

        let direction = if ascending { "ASC" } else { "DESC" };
        builder
            .push(" ORDER BY p.")
            .push(order_by.column())
            .push(" ")
            .push(direction)
            .push(", p.project_id ")
            .push(direction);

        if let (Some(pagination), Some(offset)) = (pagination, offset) {
            builder
                .push(" LIMIT ")
                .push_bind(pagination.limit)
                .push(" OFFSET ")
                .push_bind(offset);
        }

        let project_ids: Vec<ProjectId> = builder
            .build_query_scalar()
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;
        let items = self.load_projects(&project_ids).await?;

        Ok(PaginatedList { total, items })
    }
}

impl ProjectRepositoryImpl {
    /// Loads projects with their members, keeping the order of `project_ids`.
    async fn load_projects(&self, project_ids: &[ProjectId]) -> AppResult<Vec<Project>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw_ids = raw_ids(project_ids);

        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ANY($1)"
        ))
        .bind(&raw_ids)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let member_rows: Vec<ProjectMemberRow> = sqlx::query_as(
            r#"
                SELECT
                    pu.project_id,
                    pu.type AS role,
                    u.user_id,
                    u.first_name,
                    u.last_name,
                    u.email,
                    u.phone,
                    u.dob,
                    u.gender,
                    u.country,
                    u.special_requirements
                FROM project_users AS pu
                INNER JOIN users AS u ON u.user_id = pu.user_id
                WHERE pu.project_id = ANY($1)
                ORDER BY pu.created_at ASC, u.last_name ASC, u.first_name ASC
            "#,
        )
        .bind(&raw_ids)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let mut members: HashMap<ProjectId, Vec<ProjectMember>> = HashMap::new();
        for row in member_rows {
            let (project_id, member) = row.into_member()?;
            members.entry(project_id).or_default().push(member);
        }

        let mut rows: HashMap<ProjectId, ProjectRow> =
            rows.into_iter().map(|r| (r.project_id, r)).collect();

        Ok(project_ids
            .iter()
            .filter_map(|id| {
                let row = rows.remove(id)?;
                Some(row.into_project(members.remove(id).unwrap_or_default()))
            })
            .collect())
    }
}

// オーナーとスーパーバイザーの名前・メールアドレスも検索対象にする
fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    event_id: EventId,
    query: Option<&str>,
) {
    builder.push(" WHERE p.event_id = ").push_bind(event_id);

    if let Some(query) = query {
        let pattern = format!("%{}%", query.trim());
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(
                " OR EXISTS (SELECT 1 FROM project_users AS pu \
                 INNER JOIN users AS u ON u.user_id = pu.user_id \
                 WHERE pu.project_id = p.project_id \
                 AND pu.type IN ('owner', 'supervisor') AND (u.email ILIKE ",
            )
            .push_bind(pattern.clone())
            .push(" OR u.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.last_name ILIKE ")
            .push_bind(pattern)
            .push(")))");
    }
}

fn raw_ids<T: Copy + Into<Uuid>>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|id| (*id).into()).collect()
}

/// Project writes sharing one database transaction.
pub struct PgProjectUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ProjectUnitOfWork for PgProjectUnitOfWork {
    async fn insert_project(&mut self, project: &NewProject) -> AppResult<Project> {
        let row: ProjectRow = sqlx::query_as(&format!(
            r#"
                INSERT INTO projects (event_id, name, category, description, org, org_ref)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(project.event_id)
        .bind(&project.name)
        .bind(&project.category)
        .bind(&project.description)
        .bind(&project.org)
        .bind(&project.org_ref)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.into_project(Vec::new()))
    }

    async fn update_project(&mut self, event: &UpdateProject) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE projects
                SET
                    name = COALESCE($2, name),
                    category = COALESCE($3, category),
                    description = COALESCE($4, description),
                    org = COALESCE($5, org),
                    org_ref = COALESCE($6, org_ref)
                WHERE project_id = $1
            "#,
        )
        .bind(event.project_id)
        .bind(&event.name)
        .bind(&event.category)
        .bind(&event.description)
        .bind(&event.org)
        .bind(&event.org_ref)
        .execute(&mut *self.tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "Project {} not found",
                event.project_id
            )));
        }
        Ok(())
    }

    async fn find_user_id_by_email(&mut self, email: &str) -> AppResult<Option<UserId>> {
        sqlx::query_scalar("SELECT user_id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::SpecificOperationError)
    }

    async fn save_user(&mut self, event: SaveUser) -> AppResult<User> {
        let SaveUser { id, profile } = event;
        let row: Option<UserRow> = match id {
            None => sqlx::query_as(&format!(
                r#"
                    INSERT INTO users
                    (first_name, last_name, email, phone, dob, gender, country, special_requirements)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.email)
            .bind(&profile.phone)
            .bind(profile.dob)
            .bind(&profile.gender)
            .bind(&profile.country)
            .bind(&profile.special_requirements)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::SpecificOperationError)?,
            // 未入力の項目は既存の値を保持する
            Some(user_id) => sqlx::query_as(&format!(
                r#"
                    UPDATE users
                    SET
                        first_name = $2,
                        last_name = $3,
                        email = COALESCE($4, email),
                        phone = COALESCE($5, phone),
                        dob = COALESCE($6, dob),
                        gender = COALESCE($7, gender),
                        country = COALESCE($8, country),
                        special_requirements = COALESCE($9, special_requirements)
                    WHERE user_id = $1
                    RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(user_id)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.email)
            .bind(&profile.phone)
            .bind(profile.dob)
            .bind(&profile.gender)
            .bind(&profile.country)
            .bind(&profile.special_requirements)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::SpecificOperationError)?,
        };

        row.map(User::from).ok_or_else(|| {
            AppError::EntityNotFound(format!(
                "User {} not found",
                id.map(|id| id.to_string()).unwrap_or_default()
            ))
        })
    }

    async fn find_memberships(&mut self, project_id: ProjectId) -> AppResult<Vec<Membership>> {
        let rows: Vec<MembershipRow> = sqlx::query_as(
            r#"
                SELECT project_id, user_id, type AS role
                FROM project_users
                WHERE project_id = $1
                ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn attach_members(
        &mut self,
        project_id: ProjectId,
        members: &[NewMembership],
    ) -> AppResult<()> {
        if members.is_empty() {
            return Ok(());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO project_users (project_id, user_id, type) ");
        builder.push_values(members.iter(), |mut b, member| {
            b.push_bind(project_id)
                .push_bind(member.user_id)
                .push_bind(member.role.as_ref().to_string());
        });

        let res = builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < members.len() as u64 {
            return Err(AppError::NoRowsAffectedError(
                "Not every project_users record has been created".into(),
            ));
        }
        Ok(())
    }

    async fn change_role(
        &mut self,
        project_id: ProjectId,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
                UPDATE project_users
                SET type = $3
                WHERE project_id = $1 AND user_id = $2 AND type <> 'owner'
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role.as_ref())
        .execute(&mut *self.tx)
        .await
        .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    async fn remove_members(
        &mut self,
        project_id: ProjectId,
        user_ids: &[UserId],
    ) -> AppResult<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        // オーナーの関連は削除対象に含めない
        let res = sqlx::query(
            r#"
                DELETE FROM project_users
                WHERE project_id = $1 AND user_id = ANY($2) AND type <> 'owner'
            "#,
        )
        .bind(project_id)
        .bind(raw_ids(user_ids))
        .execute(&mut *self.tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(res.rows_affected())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(AppError::TransactionError)
    }
}
