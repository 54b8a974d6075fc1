//! Shared helpers for the HTTP API tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use tempfile::TempDir;

use docdesk::web::handlers::AppState;
use docdesk::web::router::create_router;
use docdesk::Config;

/// Secret shared with the editor in signed-mode tests.
pub const SECRET: &str = "test-editor-secret";

/// Public base URL used in every test configuration.
pub const APP_BASE: &str = "http://docs.test";

/// A running router with its own storage directory.
pub struct TestApp {
    pub server: TestServer,
    pub storage: TempDir,
}

impl TestApp {
    /// Path of a stored document.
    pub fn path(&self, name: &str) -> PathBuf {
        self.storage.path().join(name)
    }

    /// Write a document directly into storage.
    pub fn seed(&self, name: &str, content: &[u8]) {
        std::fs::write(self.path(name), content).expect("Failed to seed document");
    }

    /// Read a stored document back.
    pub fn read(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.path(name)).expect("Failed to read document")
    }
}

/// Build a test configuration rooted at `storage`.
pub fn test_config(storage: &TempDir, secret: Option<&str>) -> Config {
    let mut config = Config::default();
    config.storage.path = storage.path().to_string_lossy().into_owned();
    config.app.base_url = Some(APP_BASE.to_string());
    config.editor.base_url = "http://editor.test".to_string();
    config.editor.jwt_secret = secret.unwrap_or_default().to_string();
    config.web.cors_origins = vec![];
    config
}

/// Start an app from a prepared configuration.
pub fn spawn_with(config: Config, storage: TempDir) -> TestApp {
    let state = AppState::from_config(&config).expect("Failed to build app state");
    let router = create_router(Arc::new(state), &config.web.cors_origins);
    let server = TestServer::new(router).expect("Failed to create test server");
    TestApp { server, storage }
}

/// Start an app, signed when `secret` is given.
pub fn spawn_app(secret: Option<&str>) -> TestApp {
    let storage = TempDir::new().expect("Failed to create storage dir");
    let config = test_config(&storage, secret);
    spawn_with(config, storage)
}

/// Multipart form with a single "file" part.
pub fn upload_form(file_name: &str, content: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec())
            .file_name(file_name)
            .mime_type("application/octet-stream"),
    )
}
