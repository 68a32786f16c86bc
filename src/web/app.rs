use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{ApiResult, handlers, state::AppState};

/// Routes of the dashboard API.
///
/// `/api/projects/summary` is a static segment and takes precedence over
/// `/api/projects/{id}`, so a project whose id is literally `summary` cannot be
/// read, updated or deleted over HTTP. Ids assigned here are UUIDs and never
/// collide with it.
pub fn build_router(state: AppState) -> Router {
    let projects = Router::new()
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route("/api/projects/summary", get(handlers::project_summary))
        .route(
            "/api/projects/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), ensure_seeded));

    Router::new()
        .route("/health", get(handlers::healthcheck))
        .merge(projects)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Inserts the seed projects before the first project request is served.
async fn ensure_seeded(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    state.projects.ensure_seed(&state.seed).await?;
    Ok(next.run(request).await)
}
