//! Project endpoints, plus the intersections and relations owned by a project

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use zit_core::models::{
    Description, IntersectionName, Paginated, Pagination, PaginationParams, ProjectName,
    RelationInput,
};
use zit_core::repos::{Intersection, IntersectionRepo, Project, ProjectRepo, Relation, RelationRepo};

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidId};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Partial update; omitted fields keep their value.
#[derive(Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateIntersectionRequest {
    pub number: i64,
    #[serde(default)]
    pub name: String,
}

/// GET /projects - list projects with pagination, newest first
async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Project>>, ApiError> {
    let page = Pagination::from(params);
    let result = ProjectRepo::new(&state.db).list(page).await?;
    Ok(Json(result))
}

/// POST /projects
async fn create_project(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let name = ProjectName::new(&req.name)?;
    let description = Description::new(&req.description)?;
    let project = ProjectRepo::new(&state.db).create(&name, &description).await?;

    tracing::info!(project_id = project.id, user_id = current.user.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /projects/{id}
async fn get_project(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(ProjectRepo::new(&state.db).get(id).await?))
}

/// PATCH /projects/{id}
async fn update_project(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    _current: CurrentUser,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let projects = ProjectRepo::new(&state.db);
    let existing = projects.get(id).await?;

    let name = ProjectName::new(req.name.as_deref().unwrap_or(&existing.name))?;
    let description =
        Description::new(req.description.as_deref().unwrap_or(&existing.description))?;

    Ok(Json(projects.update(id, &name, &description).await?))
}

/// DELETE /projects/{id} - only projects without intersections
async fn delete_project(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    current: CurrentUser,
) -> Result<StatusCode, ApiError> {
    ProjectRepo::new(&state.db).delete(id).await?;
    tracing::info!(project_id = id, user_id = current.user.id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /projects/{id}/intersections - ordered by intersection number
async fn list_intersections(
    State(state): State<Arc<AppState>>,
    ValidId(project_id): ValidId,
) -> Result<Json<Vec<Intersection>>, ApiError> {
    let intersections = IntersectionRepo::new(&state.db)
        .list_for_project(project_id)
        .await?;
    Ok(Json(intersections))
}

/// POST /projects/{id}/intersections
async fn create_intersection(
    State(state): State<Arc<AppState>>,
    ValidId(project_id): ValidId,
    _current: CurrentUser,
    Json(req): Json<CreateIntersectionRequest>,
) -> Result<(StatusCode, Json<Intersection>), ApiError> {
    let name = IntersectionName::new(&req.name)?;
    let intersection = IntersectionRepo::new(&state.db)
        .create(project_id, req.number, &name)
        .await?;
    Ok((StatusCode::CREATED, Json(intersection)))
}

/// GET /projects/{id}/relations
async fn list_relations(
    State(state): State<Arc<AppState>>,
    ValidId(project_id): ValidId,
) -> Result<Json<Vec<Relation>>, ApiError> {
    ProjectRepo::new(&state.db).get(project_id).await?;
    let relations = RelationRepo::new(&state.db)
        .list_for_project(project_id)
        .await?;
    Ok(Json(relations))
}

/// POST /projects/{id}/relations - both ends must be intersections of this project
async fn create_relation(
    State(state): State<Arc<AppState>>,
    ValidId(project_id): ValidId,
    _current: CurrentUser,
    Json(req): Json<RelationInput>,
) -> Result<(StatusCode, Json<Relation>), ApiError> {
    req.validate()?;
    let relation = RelationRepo::new(&state.db).create(project_id, &req).await?;
    Ok((StatusCode::CREATED, Json(relation)))
}

/// Project routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project)
                .patch(update_project)
                .delete(delete_project),
        )
        .route(
            "/projects/{id}/intersections",
            get(list_intersections).post(create_intersection),
        )
        .route(
            "/projects/{id}/relations",
            get(list_relations).post(create_relation),
        )
}
