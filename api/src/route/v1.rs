use super::{health::build_health_check_routers, project::build_project_routers};
use axum::Router;
use registry::AppRegistry;
use shared::error::AppError;

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_health_check_routers())
        .merge(build_project_routers());
    Router::new()
        .nest("/api/v1", router)
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::EntityNotFound("Not found.".into())
}
