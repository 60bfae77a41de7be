//! Directory status/info endpoint.
//!
//! GET /api/v1/repository/directory-info?path=&rev=
//!
//! Returns directory statistics:
//! - File and directory counts
//! - Total size
//! - Contributors (who committed to files in this directory)
//! - First and latest commit

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::DirectoryInfo;
use crate::routes::run_blocking;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/v1/repository/directory-info", get(get_directory_info))
        .with_state(repo)
}

#[derive(Debug, Deserialize)]
struct DirectoryQuery {
    path: Option<String>,
    rev: Option<String>,
}

async fn get_directory_info(
    State(repo): State<SharedRepo>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<DirectoryInfo>> {
    let info = run_blocking(repo, move |git| {
        git.get_directory_info(query.rev.as_deref(), query.path.as_deref())
    })
    .await?;
    Ok(Json(info))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::git::test_support::{TestRepo, ALICE, BOB};
    use crate::routes::test_client::{get, router};

    #[tokio::test]
    async fn directory_statistics() {
        let fixture = TestRepo::new();
        fixture.write("src/a.rs", "a\n");
        fixture.commit("c1", ALICE, 1_000);
        fixture.write("src/b.rs", "bb\n");
        fixture.commit("c2", BOB, 2_000);
        let app = router(&fixture);

        let (status, info) = get(app.clone(), "/api/v1/repository/directory-info?path=src").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(info["file_count"], 2);
        assert_eq!(info["total_size"], 5);
        assert_eq!(info["latest_commit"]["message"], "c2");
        assert_eq!(info["first_commit"]["message"], "c1");

        let (status, _) = get(app, "/api/v1/repository/directory-info?rev=nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
