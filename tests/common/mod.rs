//! Common test utilities for integration tests.

pub mod fixtures;
pub mod onnx;

use lesionscan::auth::hash_password;
use lesionscan::config::LesionConfig;
use lesionscan::server::{self, AppState};
use lesionscan::shutdown::ShutdownCoordinator;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub use fixtures::*;

/// Admin account used by every test server.
pub const ADMIN_USERNAME: &str = "medicalSociety";
pub const ADMIN_PASSWORD: &str = "medicalsociety1298!";
pub const SIGNING_KEY: &str = "integration-test-signing-key";

/// Test environment that manages temporary directories and cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub frontend_dir: PathBuf,
}

impl TestEnv {
    /// Create a temp dir holding a small frontend bundle.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let frontend_dir = temp_dir.path().join("dist");

        std::fs::create_dir_all(frontend_dir.join("assets")).expect("Failed to create dist");
        std::fs::write(
            frontend_dir.join("index.html"),
            "<!doctype html><title>lesionscan</title>",
        )
        .expect("Failed to write index.html");
        std::fs::write(frontend_dir.join("assets/app.js"), "console.log('ok');")
            .expect("Failed to write app.js");

        // Outside the bundle; must never be served.
        std::fs::write(temp_dir.path().join("secret.txt"), "do not serve")
            .expect("Failed to write secret");

        Self {
            temp_dir,
            frontend_dir,
        }
    }

    /// Configuration pointing at this environment.
    pub fn config(&self) -> LesionConfig {
        let mut config = LesionConfig::default();
        config.auth.signing_key = SIGNING_KEY.to_string();
        config.auth.admin_username = ADMIN_USERNAME.to_string();
        config.auth.admin_password_hash = hash_password(ADMIN_PASSWORD);
        config.frontend.dir = self.frontend_dir.clone();
        config.server.max_upload_bytes = 1024 * 1024;
        config
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub env: TestEnv,
    pub base_url: String,
    pub model: Arc<StubClassifier>,
    pub client: reqwest::Client,
    coordinator: ShutdownCoordinator,
    handle: Option<JoinHandle<lesionscan::Result<()>>>,
}

impl TestServer {
    /// Start a server with the default stub classifier.
    pub async fn start() -> Self {
        Self::start_with(StubClassifier::default(), |_| {}).await
    }

    /// Start a server with a custom classifier and config tweaks.
    pub async fn start_with(
        model: StubClassifier,
        configure: impl FnOnce(&mut LesionConfig),
    ) -> Self {
        let env = TestEnv::new();
        let mut config = env.config();
        configure(&mut config);
        config.validate().expect("Invalid test configuration");

        // A handle from an uninstalled recorder keeps tests independent of
        // the process-wide metrics registry.
        let metrics = config
            .observability
            .metrics_enabled
            .then(|| PrometheusBuilder::new().build_recorder().handle());

        let model = Arc::new(model);
        let state = AppState::from_config(&config, model.clone(), metrics)
            .expect("Failed to build app state");
        let router = server::build_router(state, config.server.max_upload_bytes);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");

        let coordinator = ShutdownCoordinator::with_timeout(Duration::from_secs(5));
        let handle = tokio::spawn(server::serve(listener, router, coordinator.clone()));

        Self {
            env,
            base_url: format!("http://{}", addr),
            model,
            client: reqwest::Client::new(),
            coordinator,
            handle: Some(handle),
        }
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in with the given credentials.
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Token request failed")
    }

    /// Log in as the admin and return the access token.
    pub async fn admin_token(&self) -> String {
        let response = self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.expect("Token body");
        body["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }

    /// Upload `bytes` as the `file` part of `/predict`.
    pub async fn predict(&self, token: Option<&str>, bytes: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(bytes).file_name("lesion.png");
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.client.post(self.url("/predict")).multipart(form);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Predict request failed")
    }

    /// Trigger graceful shutdown and wait for the server task.
    pub async fn stop(mut self) -> lesionscan::Result<()> {
        self.coordinator.shutdown();
        match self.handle.take() {
            Some(handle) => handle.await.expect("Server task panicked"),
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.coordinator.shutdown();
    }
}
