//! API handlers.

pub mod editor;
pub mod file;

pub use editor::*;
pub use file::*;

use std::sync::Arc;

use axum::Json;
use serde_json::{json, Value};

use crate::config::Config;
use crate::editor::{
    CallbackReceiver, DocumentFetcher, SessionIssuer, SessionSettings, TokenSigner,
};
use crate::file::FileRegistry;
use crate::Result;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Document registry.
    pub registry: Arc<FileRegistry>,
    /// Editor session issuer.
    pub issuer: SessionIssuer,
    /// Editor callback receiver.
    pub receiver: CallbackReceiver,
    /// Maximum upload size in bytes.
    pub max_upload_size: usize,
}

impl AppState {
    /// Wire every component from the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Arc::new(FileRegistry::new(
            &config.storage.path,
            config.app_base_url(),
        )?);
        let signer = TokenSigner::from_config(&config.editor)?;

        if signer.is_none() {
            tracing::warn!(
                "Editor signing secret not set: callbacks are accepted without verification"
            );
        }

        let issuer = SessionIssuer::new(
            registry.clone(),
            SessionSettings::from_config(config),
            signer.clone(),
        );
        let receiver = CallbackReceiver::new(
            registry.clone(),
            signer,
            config.editor.header_name()?,
            DocumentFetcher::from_config(&config.editor)?,
        );

        Ok(Self {
            registry,
            issuer,
            receiver,
            max_upload_size: config.max_upload_bytes(),
        })
    }
}

/// GET /health - Liveness check.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
