use crate::{
    extractor::AuthorizedUser,
    model::{
        export::projects_to_csv,
        project::{
            CreateProjectRequest, CreateProjectRequestWithIds, PaginatedProjectResponse,
            ProjectListQuery, ProjectResponse, RemoveProjectUsersRequest,
            RemoveProjectUsersRequestWithIds, RemovedUsersResponse, ReplaceProjectRequest,
            ReplaceProjectRequestWithIds, UpdateProjectRequest, UpdateProjectRequestWithIds,
        },
    },
};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use garde::Validate;
use kernel::{
    mailing::WelcomeMail,
    model::{
        id::{EventId, ProjectId},
        list::ProjectListOptions,
        project::Project,
    },
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn register_project(
    user: AuthorizedUser,
    WithRejection(Path(event_id), _): WithRejection<Path<EventId>, AppError>,
    State(registry): State<AppRegistry>,
    WithRejection(Json(req), _): WithRejection<Json<CreateProjectRequest>, AppError>,
) -> AppResult<Json<ProjectResponse>> {
    req.validate(&())?;

    let event = registry
        .event_repository()
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound("The event was not found.".into()))?;

    let project = registry
        .project_service()
        .create(CreateProjectRequestWithIds::new(event_id, user.id(), req).into())
        .await?;

    // メール送信の失敗は登録結果に影響させない
    match WelcomeMail::for_registration(&user.user, &event, &project) {
        Some(mail) => {
            if let Err(e) = registry.mailer().send_welcome(mail).await {
                tracing::warn!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    project_id = %project.id,
                    "Failed to send the welcome mail"
                );
            }
        }
        None => tracing::debug!(user_id = %user.id(), "Creator has no email, welcome mail skipped"),
    }

    Ok(Json(project.into()))
}

pub async fn show_project(
    _user: AuthorizedUser,
    WithRejection(Path(project_id), _): WithRejection<Path<ProjectId>, AppError>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ProjectResponse>> {
    find_project(&registry, project_id)
        .await
        .map(ProjectResponse::from)
        .map(Json)
}

pub async fn update_project(
    user: AuthorizedUser,
    WithRejection(Path(project_id), _): WithRejection<Path<ProjectId>, AppError>,
    State(registry): State<AppRegistry>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProjectRequest>, AppError>,
) -> AppResult<Json<ProjectResponse>> {
    req.validate(&())?;
    ensure_editor(&registry, project_id, &user).await?;

    registry
        .project_service()
        .update(UpdateProjectRequestWithIds::new(project_id, req).into())
        .await
        .map(ProjectResponse::from)
        .map(Json)
}

pub async fn replace_project(
    user: AuthorizedUser,
    WithRejection(Path(project_id), _): WithRejection<Path<ProjectId>, AppError>,
    State(registry): State<AppRegistry>,
    WithRejection(Json(req), _): WithRejection<Json<ReplaceProjectRequest>, AppError>,
) -> AppResult<Json<ProjectResponse>> {
    req.validate(&())?;
    ensure_editor(&registry, project_id, &user).await?;

    registry
        .project_service()
        .replace(ReplaceProjectRequestWithIds::new(project_id, req).into())
        .await
        .map(ProjectResponse::from)
        .map(Json)
}

pub async fn remove_project_users(
    user: AuthorizedUser,
    WithRejection(Path(project_id), _): WithRejection<Path<ProjectId>, AppError>,
    State(registry): State<AppRegistry>,
    WithRejection(Json(req), _): WithRejection<Json<RemoveProjectUsersRequest>, AppError>,
) -> AppResult<Json<RemovedUsersResponse>> {
    req.validate(&())?;
    ensure_editor(&registry, project_id, &user).await?;

    registry
        .project_service()
        .remove_users(RemoveProjectUsersRequestWithIds::new(project_id, req).into())
        .await
        .map(|removed| Json(RemovedUsersResponse { removed }))
}

pub async fn show_project_list(
    _user: AuthorizedUser,
    WithRejection(Query(query), _): WithRejection<Query<ProjectListQuery>, AppError>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    let event_id = query
        .event_id
        .ok_or_else(|| AppError::InvalidRequest("eventId is required.".into()))?;
    list_projects(&registry, event_id, query).await
}

pub async fn show_event_project_list(
    _user: AuthorizedUser,
    WithRejection(Path(event_id), _): WithRejection<Path<EventId>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<ProjectListQuery>, AppError>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    list_projects(&registry, event_id, query).await
}

async fn list_projects(
    registry: &AppRegistry,
    event_id: EventId,
    query: ProjectListQuery,
) -> AppResult<Response> {
    query.validate(&())?;
    let is_export = query.is_export();

    let page = registry
        .project_repository()
        .find_by_event(event_id, ProjectListOptions::from(query))
        .await?;

    if is_export {
        let body = projects_to_csv(&page.items)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"projects.csv\""),
            ],
            body,
        )
            .into_response())
    } else {
        Ok(Json(PaginatedProjectResponse::from(page)).into_response())
    }
}

async fn find_project(registry: &AppRegistry, project_id: ProjectId) -> AppResult<Project> {
    registry
        .project_repository()
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound("The project was not found.".into()))
}

// 編集できるのはオーナーかスーパーバイザーのみ
async fn ensure_editor(
    registry: &AppRegistry,
    project_id: ProjectId,
    user: &AuthorizedUser,
) -> AppResult<()> {
    let project = find_project(registry, project_id).await?;
    if project.can_be_edited_by(user.id()) {
        Ok(())
    } else {
        Err(AppError::ForbiddenOperation)
    }
}
