//! Editor session configuration issued to the browser.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::signing::TokenSigner;
use crate::config::Config;
use crate::file::{extension_of, family_of, DocumentFamily, DocumentRecord, FileRegistry};
use crate::{DocError, Result};

/// Document section of the editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDescriptor {
    /// Extension without the dot.
    pub file_type: String,
    /// Content-derived cache key.
    pub key: String,
    /// Title shown in the editor.
    pub title: String,
    /// Address the editor downloads the document from.
    pub url: String,
    /// What the user may do.
    pub permissions: Permissions,
}

/// Document permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub edit: bool,
    pub download: bool,
    pub print: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            edit: true,
            download: true,
            print: true,
        }
    }
}

/// Editor behaviour section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    pub mode: String,
    pub lang: String,
    /// Where the editor posts status callbacks.
    pub callback_url: String,
    pub customization: Customization,
}

/// Editor UI customization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub autosave: bool,
    pub spellcheck: bool,
}

/// Configuration object passed to the external editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub document: DocumentDescriptor,
    pub document_type: DocumentFamily,
    pub editor_config: EditorSettings,
    pub height: String,
    pub width: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Signature over all other fields, present when signing is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Response for an editor session request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSession {
    pub config: SessionConfig,
    pub external_editor_base_url: String,
}

/// Addresses and presentation settings used when building sessions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Base URL the editor uses to reach this service.
    pub editor_app_base_url: String,
    /// Base address of the editor itself.
    pub editor_base_url: String,
    /// Editor UI language.
    pub lang: String,
}

impl SessionSettings {
    /// Take the session settings from the application configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            editor_app_base_url: config.editor_app_base_url(),
            editor_base_url: config.editor_base_url(),
            lang: config.editor.lang.clone(),
        }
    }
}

/// Cache key for a document state: hex SHA-256 of `"{name}-{modified_nanos}"`.
///
/// The editor caches converted documents by key, so any content change must
/// produce a new one. The full-precision mtime is used so that two saves
/// within the same millisecond still get distinct keys.
pub fn document_key(name: &str, modified_nanos: i64) -> String {
    let digest = Sha256::digest(format!("{name}-{modified_nanos}").as_bytes());
    format!("{digest:x}")
}

/// Builds (and signs) editor configurations from registry state.
#[derive(Debug, Clone)]
pub struct SessionIssuer {
    registry: Arc<FileRegistry>,
    settings: SessionSettings,
    signer: Option<TokenSigner>,
}

impl SessionIssuer {
    /// Create an issuer. Without a signer configs are returned unsigned.
    pub fn new(
        registry: Arc<FileRegistry>,
        settings: SessionSettings,
        signer: Option<TokenSigner>,
    ) -> Self {
        Self {
            registry,
            settings,
            signer,
        }
    }

    /// Issue a session for a stored document.
    pub async fn issue(&self, id: &str) -> Result<EditorSession> {
        let record = self.registry.stat(id).await?;
        let mut config = self.build_config(&record)?;

        if let Some(signer) = &self.signer {
            config.token = Some(signer.sign(&config)?);
        }

        tracing::debug!(
            name = %record.name,
            key = %config.document.key,
            signed = config.token.is_some(),
            "Issued editor session"
        );

        Ok(EditorSession {
            config,
            external_editor_base_url: self.settings.editor_base_url.clone(),
        })
    }

    fn build_config(&self, record: &DocumentRecord) -> Result<SessionConfig> {
        let (file_type, family) = match (extension_of(&record.name), family_of(&record.name)) {
            (Some(ext), Some(family)) => (ext, family),
            _ => return Err(DocError::UnsupportedType(record.name.clone())),
        };
        let encoded = urlencoding::encode(&record.name);
        let base = &self.settings.editor_app_base_url;

        Ok(SessionConfig {
            document: DocumentDescriptor {
                file_type,
                key: document_key(&record.name, record.modified_nanos),
                title: record.name.clone(),
                url: format!("{base}/files/{encoded}"),
                permissions: Permissions::default(),
            },
            document_type: family,
            editor_config: EditorSettings {
                mode: "edit".to_string(),
                lang: self.settings.lang.clone(),
                callback_url: format!("{base}/api/editor-callback/{encoded}"),
                customization: Customization {
                    autosave: true,
                    spellcheck: false,
                },
            },
            height: "100%".to_string(),
            width: "100%".to_string(),
            kind: "desktop".to_string(),
            token: None,
        })
    }
}
