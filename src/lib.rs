pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod routes;

use std::{path::PathBuf, sync::Arc};

use axum::{handler::Handler, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use config::{ServerConfig, PORT};
pub use error::{AppError, ServerError};
pub use payload::{ConfigPayload, EnvSource, ProcessEnv};

/// Path answered with the config payload instead of a file.
pub const CONFIG_PATH: &str = "/api/config";

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub env: Arc<dyn EnvSource>,
    pub root: PathBuf,
}

impl AppState {
    pub fn new(env: Arc<dyn EnvSource>, root: impl Into<PathBuf>) -> Self {
        Self {
            env,
            root: root.into(),
        }
    }
}

/// `/api/config` first, static files for everything else, and the
/// no-cache/CORS headers on every response.
pub fn build_router(state: AppState) -> Router {
    let files = ServeDir::new(&state.root)
        .fallback(routes::static_files::list_directory.with_state(state.clone()));

    let router = Router::new()
        .route(CONFIG_PATH, get(routes::config::get_config))
        .fallback_service(files)
        .with_state(state);

    headers::with_override_headers(router).layer(TraceLayer::new_for_http())
}

/// Serves `router` on an already bound listener until the process ends.
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), ServerError> {
    axum::serve(listener, router)
        .await
        .map_err(ServerError::Serve)
}

/// Starts the development server on `0.0.0.0:9000`, serving the directory
/// that holds the executable.
pub async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::locate()?;
    config::load_dotenv(&config.root);

    std::env::set_current_dir(&config.root).map_err(|source| ServerError::ChangeDir {
        path: config.root.clone(),
        source,
    })?;

    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr,
            source,
        })?;

    tracing::info!(root = %config.root.display(), "Serving files");
    tracing::info!("Server running at http://localhost:{}/", config.addr.port());
    tracing::info!(
        "Open http://localhost:{}/index.html in your browser",
        config.addr.port()
    );

    let state = AppState::new(Arc::new(ProcessEnv), config.root);
    serve(listener, build_router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use std::{collections::HashMap, fs, path::Path};
    use tower::ServiceExt;

    struct TempRoot(PathBuf);

    impl TempRoot {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir()
                .join(format!("config-dev-server-{}-{name}", std::process::id()));
            fs::remove_dir_all(&path).ok();
            fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        fn write(&self, relative: &str, contents: &str) {
            let path = self.0.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, contents).unwrap();
        }

        fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempRoot {
        fn drop(&mut self) {
            fs::remove_dir_all(&self.0).ok();
        }
    }

    fn router(root: &Path, env: &[(&str, &str)]) -> Router {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        build_router(AppState::new(Arc::new(env), root))
    }

    async fn send(router: Router, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_override_headers(response: &Response) {
        for (name, value) in headers::OVERRIDE_HEADERS {
            let values: Vec<_> = response.headers().get_all(&name).iter().collect();
            assert_eq!(values, [value], "header {name}");
        }
    }

    #[tokio::test]
    async fn test_config_with_empty_environment() {
        let root = TempRoot::new("config-empty");
        let response = send(router(root.path(), &[]), Method::GET, "/api/config").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_override_headers(&response);
        assert_eq!(
            body_string(response).await,
            r#"{"businessPortfolioId": "", "accessToken": "", "facebookAppId": "", "facebookConfigId": ""}"#
        );
    }

    #[tokio::test]
    async fn test_config_values_appear_verbatim() {
        let root = TempRoot::new("config-values");
        let env = [
            ("BUSINESS_PORTFOLIO_ID", "abc123"),
            ("ACCESS_TOKEN", "EAAG-token"),
            ("FACEBOOK_APP_ID", "987654321"),
            ("FACEBOOK_CONFIG_ID", "cfg_1"),
        ];
        let response = send(router(root.path(), &env), Method::GET, "/api/config").await;

        assert_eq!(
            body_string(response).await,
            r#"{"businessPortfolioId": "abc123", "accessToken": "EAAG-token", "facebookAppId": "987654321", "facebookConfigId": "cfg_1"}"#
        );
    }

    #[tokio::test]
    async fn test_config_path_never_reads_disk() {
        let root = TempRoot::new("config-shadow");
        root.write("api/config", "from disk");

        let response = send(router(root.path(), &[]), Method::GET, "/api/config").await;

        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert!(!body_string(response).await.contains("from disk"));
    }

    #[tokio::test]
    async fn test_existing_file_is_served() {
        let root = TempRoot::new("static-file");
        root.write("index.html", "<h1>hello</h1>");

        let response = send(router(root.path(), &[]), Method::GET, "/index.html").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_override_headers(&response);
        assert_eq!(body_string(response).await, "<h1>hello</h1>");
    }

    #[tokio::test]
    async fn test_root_serves_index_html() {
        let root = TempRoot::new("static-index");
        root.write("index.html", "home");

        let response = send(router(root.path(), &[]), Method::GET, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "home");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let root = TempRoot::new("static-missing");

        let response = send(router(root.path(), &[]), Method::GET, "/nope.js").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_override_headers(&response);
    }

    #[tokio::test]
    async fn test_directory_without_index_is_listed() {
        let root = TempRoot::new("static-listing");
        root.write("components/App.js", "");
        root.write("components/widgets/Button.js", "");

        let response = send(router(root.path(), &[]), Method::GET, "/components/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_override_headers(&response);
        let html = body_string(response).await;
        assert!(html.contains("Directory listing for /components/"));
        assert!(html.contains(r#"<a href="App.js">App.js</a>"#));
        assert!(html.contains(r#"<a href="widgets/">widgets/</a>"#));
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let root = TempRoot::new("static-redirect");
        root.write("components/App.js", "");

        let response = send(router(root.path(), &[]), Method::GET, "/components").await;

        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/components/");
    }

    #[tokio::test]
    async fn test_unsupported_method_is_rejected() {
        let root = TempRoot::new("method");
        root.write("index.html", "home");

        let response = send(router(root.path(), &[]), Method::POST, "/index.html").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_override_headers(&response);

        let response = send(router(root.path(), &[]), Method::POST, "/api/config").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_override_headers(&response);
    }
}
