//! Branch listing and checkout endpoints.
//!
//! - GET /api/v1/repository/branches
//!   Lists all local and remote branches with current branch flagged.
//!
//! - POST /api/v1/repository/checkout { branch: string }
//!   Switches to a local branch. Refused while tracked files are dirty.
//!
//! - POST /api/v1/repository/checkout-remote { remote_branch: string, local_name: string }
//!   Creates a local tracking branch from a remote and checks it out.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedRepo;
use crate::models::BranchInfo;
use crate::routes::run_blocking;

pub fn routes(repo: SharedRepo) -> Router {
    Router::new()
        .route("/api/v1/repository/branches", get(list_branches))
        .route("/api/v1/repository/checkout", post(checkout_branch))
        .route("/api/v1/repository/checkout-remote", post(checkout_remote_branch))
        .with_state(repo)
}

async fn list_branches(State(repo): State<SharedRepo>) -> Result<Json<Vec<BranchInfo>>> {
    let branches = run_blocking(repo, |git| git.list_branches()).await?;
    Ok(Json(branches))
}

#[derive(Debug, Deserialize)]
struct CheckoutRequest {
    branch: String,
}

async fn checkout_branch(
    State(repo): State<SharedRepo>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<()>> {
    run_blocking(repo, move |git| git.checkout_branch(&request.branch)).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct CheckoutRemoteRequest {
    remote_branch: String,
    local_name: String,
}

async fn checkout_remote_branch(
    State(repo): State<SharedRepo>,
    Json(request): Json<CheckoutRemoteRequest>,
) -> Result<Json<()>> {
    run_blocking(repo, move |git| {
        git.checkout_remote_branch(&request.remote_branch, &request.local_name)
    })
    .await?;
    Ok(Json(()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::git::test_support::{TestRepo, ALICE, BOB};
    use crate::routes::test_client::{get, post, router};

    #[tokio::test]
    async fn list_and_checkout() {
        let fixture = TestRepo::new();
        fixture.write("a.txt", "one\n");
        let c1 = fixture.commit("one", ALICE, 1_000);
        fixture.branch("feature", c1);
        fixture.write("a.txt", "two\n");
        fixture.commit("two", BOB, 2_000);
        let app = router(&fixture);

        let (status, branches) = get(app.clone(), "/api/v1/repository/branches").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(branches[0]["name"], "master");
        assert_eq!(branches[0]["is_current"], true);
        assert_eq!(branches[1]["name"], "feature");

        let checkout = json!({ "branch": "feature" });
        let (status, _) = post(app.clone(), "/api/v1/repository/checkout", checkout).await;
        assert_eq!(status, StatusCode::OK);
        let (_, info) = get(app.clone(), "/api/v1/repository").await;
        assert_eq!(info["head_branch"], "feature");
        assert_eq!(info["head_commit"]["oid"], c1.to_string());

        let checkout = json!({ "branch": "ghost" });
        let (status, body) = post(app.clone(), "/api/v1/repository/checkout", checkout).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("ghost"));

        fixture.write("a.txt", "dirty\n");
        let checkout = json!({ "branch": "master" });
        let (status, body) = post(app, "/api/v1/repository/checkout", checkout).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("a.txt"));
    }
}
