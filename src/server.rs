//! Axum HTTP server for the homepage.
//!
//! Serves the rendered page, the site configuration and the site's own images, stylesheets and scripts.

use std::net::SocketAddr;
use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use github_client::GithubClient;
use homepage::ProfileAssembler;
use log::{debug, error, info};

use crate::config::Config;
use crate::page;

/// Extensions served from the site directory.
const SERVED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "svg", "css", "js"];

/// Shared state for all handlers.
pub struct AppState {
    pub assembler: ProfileAssembler<GithubClient>,
    pub config: Config,
    /// Site directory files and the background image are served from.
    pub root: PathBuf,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/config", get(config_handler))
        .route("/{*file}", get(file_handler))
        .with_state(state)
}

/// Start the HTTP server and serve until the process ends.
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    let bound_addr = listener.local_addr().context("reading bound address")?;
    info!("Serving homepage on http://{}", bound_addr);
    axum::serve(listener, router(state)).await.context("serving homepage")?;
    Ok(())
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let profile = state.assembler.assemble().await;
    let background = page::locate_background(&state.root, &state.config);
    match page::render(&profile, &state.config, Utc::now(), background.as_deref()) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!("Failed to render homepage: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn config_handler(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config.redacted())
}

async fn file_handler(State(state): State<Arc<AppState>>, Path(file): Path<String>) -> Response {
    let Some((path, content_type)) = resolve_static_file(&state.root, &file) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(err) => {
            debug!("Cannot serve {}: {}", path.display(), err);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Path and content type of a servable file, or `None` for other extensions and paths leaving `root`.
fn resolve_static_file(root: &FsPath, file: &str) -> Option<(PathBuf, &'static str)> {
    let relative = FsPath::new(file);
    if !relative.components().all(|component| matches!(component, Component::Normal(_))) {
        return None;
    }
    let extension = relative.extension()?.to_str()?.to_ascii_lowercase();
    if !SERVED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    Some((root.join(relative), content_type(&extension)))
}

fn content_type(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[test]
fn resolve_static_file_test() {
    let root = FsPath::new("/site");
    assert_eq!(
        resolve_static_file(root, "background.JPG"),
        Some((PathBuf::from("/site/background.JPG"), "image/jpeg"))
    );
    assert_eq!(
        resolve_static_file(root, "static/app.js").map(|(_, content_type)| content_type),
        Some("text/javascript; charset=utf-8")
    );
    assert_eq!(resolve_static_file(root, "config.json"), None);
    assert_eq!(resolve_static_file(root, "github_token.txt"), None);
    assert_eq!(resolve_static_file(root, "../secret.png"), None);
    assert_eq!(resolve_static_file(root, "/etc/logo.png"), None);
    assert_eq!(resolve_static_file(root, "Makefile"), None);
}
