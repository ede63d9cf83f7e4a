//! Tree Endpoints
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `GET /api/tree` - Whole tree as a one-element array holding the root
//! - `POST /api/tree` - Insert a child: `{"parent": <id>, "label": "<text>"}`
//! - `DELETE /api/tree/:id` - Delete a leaf animal
//! - `PUT /api/tree/:id` - Move an animal: `{"currentId": <new parent id>}`
//!
//! Mutations answer `200` with an empty body; callers re-fetch the tree to
//! observe the result.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, HttpError};
use animaltree_core::AnimalId;

/// Body of `POST /api/tree`
///
/// A missing `parent` reads as `0`, which no animal has, so it is rejected
/// as a missing parent rather than as a malformed body.
#[derive(Debug, Deserialize)]
pub struct InsertAnimalRequest {
    /// Identity of the existing parent
    #[serde(default)]
    pub parent: AnimalId,
    /// Label of the new animal; omitted means empty
    #[serde(default)]
    pub label: String,
}

/// Body of `PUT /api/tree/:id`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReparentRequest {
    /// Identity of the new parent; missing reads as `0`
    #[serde(default)]
    pub current_id: AnimalId,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:5000/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Fetch the whole tree
///
/// ```bash
/// curl http://localhost:5000/api/tree
/// # [{"1":{"label":"root","children":[{"2":{"label":"dog","children":[]}}]}}]
/// ```
async fn get_tree(State(state): State<AppState>) -> Result<Response, HttpError> {
    let body = state.tree_service.render_tree().await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Insert a new animal under an existing parent
///
/// ```bash
/// curl -X POST http://localhost:5000/api/tree \
///   -H "Content-Type: application/json" \
///   -d '{"parent": 1, "label": "dog"}'
/// ```
async fn insert_animal(
    State(state): State<AppState>,
    Json(request): Json<InsertAnimalRequest>,
) -> Result<StatusCode, HttpError> {
    state
        .tree_service
        .insert_child(request.parent, &request.label)
        .await?;
    Ok(StatusCode::OK)
}

/// Delete a leaf animal
async fn delete_animal(
    State(state): State<AppState>,
    Path(id): Path<AnimalId>,
) -> Result<StatusCode, HttpError> {
    state.tree_service.delete_animal(id).await?;
    Ok(StatusCode::OK)
}

/// Move an animal under a new parent
///
/// ```bash
/// curl -X PUT http://localhost:5000/api/tree/3 \
///   -H "Content-Type: application/json" \
///   -d '{"currentId": 2}'
/// ```
async fn reparent_animal(
    State(state): State<AppState>,
    Path(id): Path<AnimalId>,
    Json(request): Json<ReparentRequest>,
) -> Result<StatusCode, HttpError> {
    state
        .tree_service
        .reparent_animal(id, request.current_id)
        .await?;
    Ok(StatusCode::OK)
}

/// Create router with all tree endpoints
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/tree", get(get_tree).post(insert_animal))
        .route("/api/tree/:id", put(reparent_animal).delete(delete_animal))
        .with_state(state)
}
