//! Repository metadata and switching.
//!
//! - GET /api/v1/repository
//! - POST /api/v1/repository/switch { path: string }
//!   Opens the repository containing `path` and makes it the active one.
//!   A path outside any repository leaves the current one active.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::git::SharedRepo;
use crate::models::RepositoryInfo;
use crate::routes::run_blocking;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/v1/repository", get(get_repository_info))
        .route("/api/v1/repository/switch", post(switch_repository))
        .with_state(repo)
}

async fn get_repository_info(State(repo): State<SharedRepo>) -> Result<Json<RepositoryInfo>> {
    let info = run_blocking(repo, |git| git.info()).await?;
    Ok(Json(info))
}

#[derive(Debug, Deserialize)]
struct SwitchRepoRequest {
    path: String,
}

async fn switch_repository(
    State(repo): State<SharedRepo>,
    Json(request): Json<SwitchRepoRequest>,
) -> Result<Json<RepositoryInfo>> {
    let info = tokio::task::spawn_blocking(move || repo.switch(&request.path))
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))??;
    Ok(Json(info))
}
