//! git-lens - a version-control data engine served over HTTP/JSON
//!
//! # Usage
//! ```bash
//! git-lens /path/to/repository              # Serve on 127.0.0.1:3001
//! git-lens . --port 8080 --context-lines 5  # Custom port and diff context
//! ```

mod config;
mod error;
mod git;
mod models;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::EngineConfig;
use git::{GitRepository, RepoHandle};

/// Browse a git repository's trees, history, diffs and blame over HTTP
#[derive(Parser)]
#[command(name = "git-lens")]
#[command(about = "A version-control data engine with an HTTP/JSON API", long_about = None)]
struct Cli {
    /// Path inside the git repository to serve
    #[arg(value_name = "REPO_PATH", default_value = ".")]
    repo_path: String,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to run the server on
    #[arg(short, long, env = "GIT_LENS_PORT", default_value = "3001")]
    port: u16,

    /// Context lines around each diff hunk
    #[arg(long, default_value = "3")]
    context_lines: u32,

    /// Similarity percentage for rename and copy detection
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u16).range(0..=100))]
    rename_threshold: u16,

    /// Largest history page a client may request
    #[arg(long, default_value = "500")]
    max_page_size: usize,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            context_lines: self.context_lines,
            rename_threshold: self.rename_threshold,
            max_page_size: self.max_page_size,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (quieter for production)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Open the git repository
    let repo = match GitRepository::open(&cli.repo_path, cli.engine_config()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("✗ Failed to open repository: {}", e);
            eprintln!("  Path: {}", cli.repo_path);
            std::process::exit(1);
        }
    };

    let canonical_path = std::fs::canonicalize(&repo.path)
        .unwrap_or_else(|_| PathBuf::from(&repo.path))
        .to_string_lossy()
        .to_string();

    let shared_repo = Arc::new(RepoHandle::new(repo));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(shared_repo))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to {}: {}", addr, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    println!();
    println!("  git-lens");
    println!();
    println!("  Repository: {}", canonical_path);
    println!("  API:        http://{}/api/v1/repository", addr);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
        println!("\n  Shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_engine_defaults() {
        let cli = Cli::parse_from(["git-lens"]);
        assert_eq!(cli.repo_path, ".");
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.engine_config(), EngineConfig::default());
    }

    #[test]
    fn rename_threshold_is_a_percentage() {
        assert!(Cli::try_parse_from(["git-lens", "--rename-threshold", "101"]).is_err());
        let cli = Cli::try_parse_from(["git-lens", "repo", "--rename-threshold", "80"]).unwrap();
        assert_eq!(cli.engine_config().rename_threshold, 80);
        assert_eq!(cli.repo_path, "repo");
    }
}
