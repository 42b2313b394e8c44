//! Intersection endpoints: approach flows and the stored timing output

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use zit_core::models::{FlowInput, TimingOutput};
use zit_core::repos::{Flow, FlowRepo, Intersection, IntersectionRepo, Output, OutputRepo};

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidId};
use crate::state::AppState;

/// GET /intersections/{id}
async fn get_intersection(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Intersection>, ApiError> {
    Ok(Json(IntersectionRepo::new(&state.db).get(id).await?))
}

/// DELETE /intersections/{id} - only intersections without dependent data
async fn delete_intersection(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    _current: CurrentUser,
) -> Result<StatusCode, ApiError> {
    IntersectionRepo::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /intersections/{id}/flows
async fn list_flows(
    State(state): State<Arc<AppState>>,
    ValidId(intersection_id): ValidId,
) -> Result<Json<Vec<Flow>>, ApiError> {
    IntersectionRepo::new(&state.db).get(intersection_id).await?;
    let flows = FlowRepo::new(&state.db)
        .list_for_intersection(intersection_id)
        .await?;
    Ok(Json(flows))
}

/// POST /intersections/{id}/flows
async fn create_flow(
    State(state): State<Arc<AppState>>,
    ValidId(intersection_id): ValidId,
    _current: CurrentUser,
    Json(req): Json<FlowInput>,
) -> Result<(StatusCode, Json<Flow>), ApiError> {
    req.validate()?;
    let flow = FlowRepo::new(&state.db).create(intersection_id, &req).await?;
    Ok((StatusCode::CREATED, Json(flow)))
}

/// DELETE /flows/{id}
async fn delete_flow(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    _current: CurrentUser,
) -> Result<StatusCode, ApiError> {
    FlowRepo::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /intersections/{id}/output
async fn get_output(
    State(state): State<Arc<AppState>>,
    ValidId(intersection_id): ValidId,
) -> Result<Json<Output>, ApiError> {
    IntersectionRepo::new(&state.db).get(intersection_id).await?;
    let output = OutputRepo::new(&state.db)
        .get_for_intersection(intersection_id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "output for intersection",
            id: intersection_id.to_string(),
        })?;
    Ok(Json(output))
}

/// PUT /intersections/{id}/output - store timing as given, replacing any previous one
async fn put_output(
    State(state): State<Arc<AppState>>,
    ValidId(intersection_id): ValidId,
    _current: CurrentUser,
    Json(req): Json<TimingOutput>,
) -> Result<Json<Output>, ApiError> {
    req.validate()?;
    let output = OutputRepo::new(&state.db)
        .upsert(intersection_id, &req)
        .await?;
    Ok(Json(output))
}

/// Intersection routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/intersections/{id}",
            get(get_intersection).delete(delete_intersection),
        )
        .route(
            "/intersections/{id}/flows",
            get(list_flows).post(create_flow),
        )
        .route(
            "/intersections/{id}/output",
            get(get_output).put(put_output),
        )
        .route("/flows/{id}", delete(delete_flow))
}
