//! HTTP server for the browser UI
//!
//! `GET /config.js` is generated from the resolved machine config; every
//! other path is a file under the static directory.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use hb_engine::MachineConfig;

#[derive(Clone)]
struct AppState {
    config_js: Arc<str>,
    root: Arc<PathBuf>,
}

impl AppState {
    fn new(config: &MachineConfig, root: PathBuf) -> Result<Self> {
        Ok(Self {
            config_js: config_script(config)?.into(),
            root: Arc::new(root),
        })
    }
}

pub async fn run_server(config: MachineConfig, port: u16, dir: PathBuf) -> Result<()> {
    config.validate().context("Refusing to serve an invalid config")?;
    if !dir.is_dir() {
        log::warn!("Static directory {} does not exist; only /config.js will resolve", dir.display());
    }

    let label = config.setting.label.clone();
    let app = router(AppState::new(&config, dir.clone())?);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    log::info!("Serving [{label}] at http://localhost:{port} from {}", dir.display());
    log::info!("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::info!("Stopping server...");
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/config.js", get(config_js))
        .fallback(static_file)
        .with_state(state)
}

/// Script the UI loads before its game code
fn config_script(config: &MachineConfig) -> Result<String> {
    let json = serde_json::to_string(config)?;
    Ok(format!(
        "const SETTING_LEVEL = {};\nconst MACHINE_CONFIG = {json};\n",
        config.setting.level
    ))
}

// ═══════════════════════════════════════════════════════════════
// GET /config.js
// ═══════════════════════════════════════════════════════════════

async fn config_js(State(st): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        st.config_js.to_string(),
    )
}

// ═══════════════════════════════════════════════════════════════
// Static files
// ═══════════════════════════════════════════════════════════════

async fn static_file(State(st): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = match resolve_path(&st.root, uri.path()) {
        Ok(path) => path,
        Err(status) => {
            log::warn!("Rejected path {}", uri.path());
            return status.into_response();
        }
    };

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return StatusCode::NOT_FOUND.into_response(),
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response(),
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Map a request path under `root`. `/` and trailing slashes serve
/// `index.html`; any `..` segment is a bad request.
fn resolve_path(root: &Path, request: &str) -> Result<PathBuf, StatusCode> {
    let relative = request.trim_start_matches('/');
    let mut path = root.to_path_buf();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(StatusCode::BAD_REQUEST);
            }
        }
    }

    if relative.is_empty() || relative.ends_with('/') {
        path.push("index.html");
    }
    Ok(path)
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn state_with_files() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Hibiscus</h1>").unwrap();
        std::fs::create_dir(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images").join("lamp.svg"), "<svg/>").unwrap();
        let config = MachineConfig::for_setting(6).unwrap();
        let state = AppState::new(&config, dir.path().to_path_buf()).unwrap();
        (dir, state)
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/srv/static");
        assert_eq!(resolve_path(root, "/"), Ok(root.join("index.html")));
        assert_eq!(resolve_path(root, "/game.js"), Ok(root.join("game.js")));
        assert_eq!(
            resolve_path(root, "/images/"),
            Ok(root.join("images").join("index.html"))
        );
        assert_eq!(resolve_path(root, "/../etc/passwd"), Err(StatusCode::BAD_REQUEST));
        assert_eq!(resolve_path(root, "/images/../../x"), Err(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type(Path::new("a.HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("game.js")), "application/javascript");
        assert_eq!(content_type(Path::new("lamp.svg")), "image/svg+xml");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn test_config_script() {
        let config = MachineConfig::for_setting(5).unwrap();
        let script = config_script(&config).unwrap();
        assert!(script.starts_with("const SETTING_LEVEL = 5;\nconst MACHINE_CONFIG = {"));
        assert!(script.trim_end().ends_with("};"));
    }

    #[tokio::test]
    async fn test_config_js_response() {
        let (_dir, state) = state_with_files();
        let response = config_js(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/javascript"
        );
        assert!(body_text(response).await.starts_with("const SETTING_LEVEL = 6;"));
    }

    #[tokio::test]
    async fn test_static_index_and_nested_file() {
        let (_dir, state) = state_with_files();

        let index = static_file(State(state.clone()), Method::GET, Uri::from_static("/")).await;
        assert_eq!(index.status(), StatusCode::OK);
        assert_eq!(index.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body_text(index).await, "<h1>Hibiscus</h1>");

        let svg = static_file(State(state), Method::GET, Uri::from_static("/images/lamp.svg")).await;
        assert_eq!(svg.headers()[header::CONTENT_TYPE], "image/svg+xml");
    }

    #[tokio::test]
    async fn test_static_errors() {
        let (_dir, state) = state_with_files();

        let missing = static_file(State(state.clone()), Method::GET, Uri::from_static("/nope.js")).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let dir = static_file(State(state.clone()), Method::GET, Uri::from_static("/images")).await;
        assert_eq!(dir.status(), StatusCode::NOT_FOUND);

        let post = static_file(State(state), Method::POST, Uri::from_static("/")).await;
        assert_eq!(post.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (_dir, state) = state_with_files();
        let response = static_file(State(state), Method::GET, Uri::from_static("/../Cargo.toml")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_config_refused() {
        let mut config = MachineConfig::for_setting(1).unwrap();
        config.setting.level = 4;
        let result = run_server(config, 0, PathBuf::from("static")).await;
        assert!(result.is_err());
    }
}
