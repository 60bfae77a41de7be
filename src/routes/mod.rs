//! API route handlers - maps HTTP endpoints to engine operations.
//!
//! Each submodule defines routes for a feature area:
//! - `repository`: Repo info and repository switching
//! - `branches`: Branch listing and checkout
//! - `tree`: Directory listing, full tree, file content, raw blobs
//! - `commits`: Commit history with author filtering, single commit lookup
//! - `diff`: Diff between revisions or against the working tree, working tree status
//! - `blame`: Per-line author attribution
//! - `status`: Directory statistics
//!
//! Handlers never touch libgit2 directly: they hand a closure to `run_blocking`,
//! which holds the repository lock on the blocking pool.

pub mod blame;
pub mod branches;
pub mod commits;
pub mod diff;
pub mod repository;
pub mod status;
pub mod tree;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::git::{GitRepository, SharedRepo};

pub fn create_router(repo: SharedRepo) -> Router {
    Router::new()
        .merge(repository::routes(repo.clone()))
        .merge(branches::routes(repo.clone()))
        .merge(tree::routes(repo.clone()))
        .merge(commits::routes(repo.clone()))
        .merge(diff::routes(repo.clone()))
        .merge(blame::routes(repo.clone()))
        .merge(status::routes(repo))
}

/// Run `f` against the active repository on the blocking pool.
///
/// The cancellation token is cancelled when this future is dropped (client
/// gone), which stops any ancestry walk inside `f` at the next commit.
pub(crate) async fn run_blocking<F, T>(repo: SharedRepo, f: F) -> Result<T>
where
    F: FnOnce(&GitRepository) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let token = CancellationToken::new();
    let _guard = token.clone().drop_guard();

    tokio::task::spawn_blocking(move || repo.with_repo_cancellable(token, f))
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}
