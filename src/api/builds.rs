//! PC build configurator endpoints.
//!
//! Creating a build does not touch the cart: the storefront chains a
//! separate add-to-cart call per selected part after a successful create
//! and shows a partial-success warning if some of those fail.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{self, AuthenticatedUser, BuildItemInput, BuildView};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::validate_build_name;

#[derive(Debug, Deserialize)]
pub struct CreateBuildRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<BuildItemInput>,
}

#[derive(Debug, Serialize)]
pub struct BuildResponse {
    pub build: BuildView,
}

#[derive(Debug, Serialize)]
pub struct ListBuildsResponse {
    pub builds: Vec<BuildView>,
}

/// List the account's builds, newest first
pub async fn list_builds(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<ListBuildsResponse>, ApiError> {
    let builds = db::list_builds(&state.db, &user.id).await?;
    Ok(Json(ListBuildsResponse { builds }))
}

/// Create a build with its items as one unit
pub async fn create_build(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(req): Json<CreateBuildRequest>,
) -> Result<(StatusCode, Json<BuildResponse>), ApiError> {
    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "My PC Build".to_string());

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_build_name(&name) {
        errors.add("name", &e);
    }
    errors.finish()?;

    let build = db::create_build(&state.db, &user.id, &name, &req.items).await?;

    tracing::info!(build = %build.id, parts = build.items.len(), "Build created");

    Ok((StatusCode::CREATED, Json(BuildResponse { build })))
}
