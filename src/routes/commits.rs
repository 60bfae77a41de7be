//! Commit history endpoints.
//!
//! - GET /api/v1/repository/commits?path=&rev=&limit=&offset=&exclude_authors=&include_authors=
//!   Author lists are comma-separated emails; `include_authors` wins when both
//!   are given.
//! - GET /api/v1/repository/commit/{rev}

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::{AuthorFilter, SharedRepo};
use crate::models::{CommitDetail, CommitListResponse};
use crate::routes::run_blocking;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/v1/repository/commits", get(get_commits))
        .route("/api/v1/repository/commit/{rev}", get(get_commit))
        .with_state(repo)
}

#[derive(Debug, Deserialize)]
struct CommitsQuery {
    path: Option<String>,
    rev: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
    exclude_authors: Option<String>,
    include_authors: Option<String>,
}

fn default_limit() -> usize {
    50
}

async fn get_commits(
    State(repo): State<SharedRepo>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<CommitListResponse>> {
    let filter = AuthorFilter::from_query(
        query.exclude_authors.as_deref(),
        query.include_authors.as_deref(),
    );

    let response = run_blocking(repo, move |git| {
        git.get_commits(
            query.rev.as_deref(),
            query.path.as_deref(),
            query.limit,
            query.offset,
            filter.as_ref(),
        )
    })
    .await?;
    Ok(Json(response))
}

async fn get_commit(
    State(repo): State<SharedRepo>,
    Path(rev): Path<String>,
) -> Result<Json<CommitDetail>> {
    let commit = run_blocking(repo, move |git| git.get_commit(&rev)).await?;
    Ok(Json(commit))
}
