use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{ApiError, ApiResponse, ApiResult, DeletedRecord, PROJECT_NOT_FOUND, state::AppState};
use crate::domain::{Project, ProjectSummary, parse_new_project, parse_project_patch};

type Reply<T> = ApiResult<Json<ApiResponse<T>>>;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

pub async fn healthcheck() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::ok(HealthStatus { status: "ok" }))
}

pub async fn list_projects(State(state): State<AppState>) -> Reply<Vec<Project>> {
    let projects = state.projects.list().await?;
    Ok(Json(ApiResponse::ok(projects)))
}

pub async fn project_summary(State(state): State<AppState>) -> Reply<ProjectSummary> {
    let projects = state.projects.list().await?;
    Ok(Json(ApiResponse::ok(ProjectSummary::from_projects(
        &projects,
    ))))
}

pub async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Reply<Project> {
    let Json(body) = payload?;
    let draft = parse_new_project(body)?;

    let project = state
        .projects
        .create(draft.into_project(Uuid::new_v4().to_string()))
        .await?;
    info!(id = %project.id, name = %project.name, "project created");

    Ok(Json(ApiResponse::ok(project)))
}

pub async fn get_project(State(state): State<AppState>, Path(id): Path<String>) -> Reply<Project> {
    if !state.projects.exists(&id).await? {
        return Err(ApiError::not_found(PROJECT_NOT_FOUND));
    }

    let project = state.projects.get_state(&id).await?;
    Ok(Json(ApiResponse::ok(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Reply<Project> {
    if !state.projects.exists(&id).await? {
        return Err(ApiError::not_found(PROJECT_NOT_FOUND));
    }

    let Json(body) = payload?;
    let patch = parse_project_patch(body)?;
    if !patch.has_changes() {
        let project = state.projects.get_state(&id).await?;
        return Ok(Json(ApiResponse::ok(project)));
    }

    let project = state
        .projects
        .mutate(&id, |current| patch.apply(current))
        .await?
        .ok_or_else(|| ApiError::not_found(PROJECT_NOT_FOUND))?;
    info!(id = %project.id, "project updated");

    Ok(Json(ApiResponse::ok(project)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Reply<DeletedRecord> {
    if !state.projects.delete(&id).await? {
        return Err(ApiError::not_found(PROJECT_NOT_FOUND));
    }
    info!(id = %id, "project deleted");

    Ok(Json(ApiResponse::ok(DeletedRecord::new(id))))
}
