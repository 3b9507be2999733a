use axum::{
    routing::{delete, get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::project::{
    register_project, remove_project_users, replace_project, show_event_project_list,
    show_project, show_project_list, update_project,
};

pub fn build_project_routers() -> Router<AppRegistry> {
    let projects_routers = Router::new()
        .route("/", get(show_project_list))
        .route(
            "/:project_id",
            get(show_project).patch(update_project).put(replace_project),
        )
        .route("/:project_id/users", delete(remove_project_users));

    let events_routers = Router::new().route(
        "/:event_id/projects",
        post(register_project).get(show_event_project_list),
    );

    Router::new()
        .nest("/projects", projects_routers)
        .nest("/events", events_routers)
}
