//! Web server for docdesk.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::{DocError, Result};

use super::handlers::AppState;
use super::router::create_router;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed browser origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server, preparing storage and editor integration.
    pub fn new(config: &Config) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| DocError::Config(format!("invalid listen address: {e}")))?;

        let app_state = AppState::from_config(config)?;
        tracing::info!(
            "Document storage at: {}",
            app_state.registry.root().display()
        );

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            cors_origins: config.web.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn into_parts(self) -> (SocketAddr, Router) {
        let router = create_router(self.app_state, &self.cors_origins);
        (self.addr, router)
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let (addr, router) = self.into_parts();

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (addr, router) = self.into_parts();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config(storage: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.storage.path = storage.path().to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_web_server_new() {
        let storage = TempDir::new().unwrap();
        let server = WebServer::new(&create_test_config(&storage)).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_web_server_rejects_bad_host() {
        let storage = TempDir::new().unwrap();
        let mut config = create_test_config(&storage);
        config.server.host = "not a host".to_string();

        assert!(matches!(WebServer::new(&config), Err(DocError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let storage = TempDir::new().unwrap();
        std::fs::write(storage.path().join("a.docx"), b"hello").unwrap();

        let server = WebServer::new(&create_test_config(&storage)).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");

        let resp = client
            .get(format!("http://{}/files/a.docx", addr))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.bytes().await.unwrap().as_ref(), b"hello");
    }
}
