//! Tree browsing endpoints.
//!
//! - GET /api/v1/repository/tree?path=&rev=&include_last_commit=true
//! - GET /api/v1/repository/tree/full?rev=
//! - GET /api/v1/repository/file?path=&rev=
//! - GET /api/v1/repository/blob/{oid} (raw bytes)

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::{FullTreeEntry, TreeEntry};
use crate::routes::run_blocking;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/v1/repository/tree", get(get_tree))
        .route("/api/v1/repository/tree/full", get(get_full_tree))
        .route("/api/v1/repository/file", get(get_file_content))
        .route("/api/v1/repository/blob/{oid}", get(get_blob))
        .with_state(repo)
}

#[derive(Debug, Deserialize)]
struct TreeQuery {
    path: Option<String>,
    rev: Option<String>,
    #[serde(default = "default_true")]
    include_last_commit: bool,
}

fn default_true() -> bool {
    true
}

async fn get_tree(
    State(repo): State<SharedRepo>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<Vec<TreeEntry>>> {
    let entries = run_blocking(repo, move |git| {
        git.get_tree_entries(
            query.rev.as_deref(),
            query.path.as_deref(),
            query.include_last_commit,
        )
    })
    .await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
struct FullTreeQuery {
    rev: Option<String>,
}

async fn get_full_tree(
    State(repo): State<SharedRepo>,
    Query(query): Query<FullTreeQuery>,
) -> Result<Json<Vec<FullTreeEntry>>> {
    let tree = run_blocking(repo, move |git| git.get_full_tree(query.rev.as_deref())).await?;
    Ok(Json(tree))
}

#[derive(Debug, Deserialize)]
struct FileQuery {
    path: String,
    rev: Option<String>,
}

async fn get_file_content(
    State(repo): State<SharedRepo>,
    Query(query): Query<FileQuery>,
) -> Result<Json<String>> {
    let content = run_blocking(repo, move |git| {
        git.get_file_content(query.rev.as_deref(), &query.path)
    })
    .await?;
    Ok(Json(content))
}

async fn get_blob(
    State(repo): State<SharedRepo>,
    Path(oid): Path<String>,
) -> Result<impl IntoResponse> {
    let bytes = run_blocking(repo, move |git| git.read_blob(&oid)).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    use crate::git::test_support::{TestRepo, ALICE, BOB};
    use crate::routes::test_client::{get, router, send};

    #[tokio::test]
    async fn tree_file_and_blob() {
        let fixture = TestRepo::new();
        fixture.write("src/main.rs", "fn main() {}\n");
        fixture.write("README.md", "v1\n");
        let c1 = fixture.commit("init", ALICE, 1_000);
        fixture.write("README.md", "v2\n");
        fixture.commit("docs", BOB, 2_000);
        let app = router(&fixture);

        let (status, entries) = get(app.clone(), "/api/v1/repository/tree").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entries[0]["name"], "src");
        assert_eq!(entries[0]["entry_type"], "directory");
        assert_eq!(entries[1]["last_commit"]["message"], "docs");

        let uri = "/api/v1/repository/tree?path=src&include_last_commit=false";
        let (_, entries) = get(app.clone(), uri).await;
        assert_eq!(entries[0]["path"], "src/main.rs");
        assert!(entries[0].get("last_commit").is_none());

        let (status, _) = get(app.clone(), "/api/v1/repository/tree?path=nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, full) = get(app.clone(), "/api/v1/repository/tree/full").await;
        assert_eq!(full[0]["children"][0]["name"], "main.rs");

        let uri = format!("/api/v1/repository/file?path=README.md&rev={}", c1);
        let (_, content) = get(app.clone(), &uri).await;
        assert_eq!(content, "v1\n");

        let (status, _) = get(app.clone(), "/api/v1/repository/file?path=src").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let blob_id = fixture
            .repo
            .find_commit(c1)
            .unwrap()
            .tree()
            .unwrap()
            .get_name("README.md")
            .unwrap()
            .id();
        let request = Request::builder()
            .uri(format!("/api/v1/repository/blob/{}", blob_id))
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"v1\n");

        let (status, _) = get(app, "/api/v1/repository/blob/not-hex").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
