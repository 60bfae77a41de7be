//! Blame endpoint.
//!
//! GET /api/v1/repository/blame?path=<path>&commit=<optional>
//!
//! Returns per-line author attribution for a file at a specific commit:
//! - Line number, author name/email, commit OID, timestamp

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::BlameResponse;
use crate::routes::run_blocking;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/v1/repository/blame", get(get_blame))
        .with_state(repo)
}

#[derive(Debug, Deserialize)]
struct BlameQuery {
    path: String,
    commit: Option<String>,
}

async fn get_blame(
    State(repo): State<SharedRepo>,
    Query(query): Query<BlameQuery>,
) -> Result<Json<BlameResponse>> {
    let response = run_blocking(repo, move |git| {
        git.get_blame(&query.path, query.commit.as_deref())
    })
    .await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::git::test_support::{TestRepo, ALICE, BOB};
    use crate::routes::test_client::{get, router};

    #[tokio::test]
    async fn blame_lines_and_missing_file() {
        let fixture = TestRepo::new();
        fixture.write("a.txt", "one\ntwo\n");
        let c1 = fixture.commit("c1", ALICE, 1_000);
        fixture.write("a.txt", "one\n2\n");
        let c2 = fixture.commit("c2", BOB, 2_000);
        let app = router(&fixture);

        let (status, blame) = get(app.clone(), "/api/v1/repository/blame?path=a.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(blame["commit"], c2.to_string());
        assert_eq!(blame["lines"][0]["commit_oid"], c1.to_string());
        assert_eq!(blame["lines"][1]["author_email"], "bob@x");
        assert_eq!(blame["lines"][1]["line_number"], 2);

        let uri = format!("/api/v1/repository/blame?path=a.txt&commit={}", c1);
        let (_, blame) = get(app.clone(), &uri).await;
        assert_eq!(blame["lines"][1]["commit_oid"], c1.to_string());

        let (status, _) = get(app, "/api/v1/repository/blame?path=nope.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
