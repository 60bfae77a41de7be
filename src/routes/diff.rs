//! Diff endpoints.
//!
//! - GET /api/v1/repository/diff?from=&to=&path=&exclude_authors=&include_authors=
//!   `to=WORKING_TREE` compares against the working directory.
//! - GET /api/v1/repository/working-tree/status?path=

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::{AuthorFilter, SharedRepo};
use crate::models::{DiffResponse, WorkingTreeStatus};
use crate::routes::run_blocking;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/v1/repository/diff", get(get_diff))
        .route("/api/v1/repository/working-tree/status", get(get_working_tree_status))
        .with_state(repo)
}

#[derive(Debug, Deserialize)]
struct DiffQuery {
    from: Option<String>,
    to: String,
    path: Option<String>,
    exclude_authors: Option<String>,
    include_authors: Option<String>,
}

async fn get_diff(
    State(repo): State<SharedRepo>,
    Query(query): Query<DiffQuery>,
) -> Result<Json<DiffResponse>> {
    let filter = AuthorFilter::from_query(
        query.exclude_authors.as_deref(),
        query.include_authors.as_deref(),
    );

    let response = run_blocking(repo, move |git| {
        git.get_diff(
            query.from.as_deref(),
            &query.to,
            query.path.as_deref(),
            filter.as_ref(),
        )
    })
    .await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    path: Option<String>,
}

async fn get_working_tree_status(
    State(repo): State<SharedRepo>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<WorkingTreeStatus>> {
    let status =
        run_blocking(repo, move |git| git.get_working_tree_status(query.path.as_deref())).await?;
    Ok(Json(status))
}
