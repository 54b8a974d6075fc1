//! Status callbacks posted by the external editor.
//!
//! A callback is trusted only after its token verifies against the shared
//! secret. Without a secret every callback body is taken at face value, which
//! is safe only when the editor is on an isolated network.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName};
use serde_json::Value;

use super::fetcher::DocumentFetcher;
use super::signing::TokenSigner;
use crate::file::FileRegistry;
use crate::{DocError, Result};

/// Document status reported by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    /// 0: no document with the key was found.
    KeyNotFound,
    /// 1: the document is being edited.
    Editing,
    /// 2: ready for saving after all editors closed it.
    MustSave,
    /// 3: an error occurred while saving.
    Corrupted,
    /// 4: closed without changes.
    Closed,
    /// 6: force-save requested while editing continues.
    MustForceSave,
    /// 7: an error occurred during force-save.
    ForceSaveError,
    /// Any code this service does not know.
    Other(i64),
}

impl CallbackStatus {
    /// Whether this status carries a document that must be stored.
    pub fn requires_save(&self) -> bool {
        matches!(self, CallbackStatus::MustSave | CallbackStatus::MustForceSave)
    }

    /// Numeric code on the wire.
    pub fn code(&self) -> i64 {
        match self {
            CallbackStatus::KeyNotFound => 0,
            CallbackStatus::Editing => 1,
            CallbackStatus::MustSave => 2,
            CallbackStatus::Corrupted => 3,
            CallbackStatus::Closed => 4,
            CallbackStatus::MustForceSave => 6,
            CallbackStatus::ForceSaveError => 7,
            CallbackStatus::Other(code) => *code,
        }
    }
}

impl From<i64> for CallbackStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => CallbackStatus::KeyNotFound,
            1 => CallbackStatus::Editing,
            2 => CallbackStatus::MustSave,
            3 => CallbackStatus::Corrupted,
            4 => CallbackStatus::Closed,
            6 => CallbackStatus::MustForceSave,
            7 => CallbackStatus::ForceSaveError,
            other => CallbackStatus::Other(other),
        }
    }
}

/// Fields of a trusted callback payload this service acts on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallbackPayload {
    pub status: Option<CallbackStatus>,
    pub url: Option<String>,
    pub key: Option<String>,
}

impl CallbackPayload {
    /// Pick the known fields out of a JSON payload, ignoring wrong types.
    pub fn from_value(value: &Value) -> Self {
        let text = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Self {
            status: value
                .get("status")
                .and_then(Value::as_i64)
                .map(CallbackStatus::from),
            url: text("url"),
            key: text("key"),
        }
    }
}

/// What a handled callback did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The stored document was replaced.
    Saved { bytes: usize },
    /// Nothing to store for this status.
    Acknowledged(Option<CallbackStatus>),
}

/// Token from a header value, with an optional `Bearer` prefix removed.
pub fn extract_header_token(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();

    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") && !rest.trim().is_empty() => {
            rest.trim()
        }
        _ => value,
    };

    (!token.is_empty()).then(|| token.to_string())
}

/// Token carried in the callback body.
fn extract_body_token(body: &Value) -> Option<&str> {
    body.get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}

/// Verifies editor callbacks and stores saved documents.
#[derive(Debug, Clone)]
pub struct CallbackReceiver {
    registry: Arc<FileRegistry>,
    signer: Option<TokenSigner>,
    header: HeaderName,
    fetcher: DocumentFetcher,
}

impl CallbackReceiver {
    /// Create a receiver. Without a signer callbacks are not verified.
    pub fn new(
        registry: Arc<FileRegistry>,
        signer: Option<TokenSigner>,
        header: HeaderName,
        fetcher: DocumentFetcher,
    ) -> Self {
        Self {
            registry,
            signer,
            header,
            fetcher,
        }
    }

    /// Determine the trusted payload of a callback.
    ///
    /// The body token is tried before the header token; the first one that
    /// verifies wins.
    pub fn resolve_payload(&self, body: Value, header_token: Option<&str>) -> Result<Value> {
        let Some(signer) = &self.signer else {
            return Ok(body);
        };

        let candidates: Vec<&str> = extract_body_token(&body)
            .into_iter()
            .chain(header_token.filter(|t| !t.is_empty()))
            .collect();

        if candidates.is_empty() {
            return Err(DocError::forbidden("callback token missing"));
        }

        let mut last_error = None;
        for token in candidates {
            match signer.verify(token) {
                Ok(claims) => return Ok(unwrap_nested_payload(claims)),
                Err(e) => {
                    tracing::debug!("Callback token rejected: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(DocError::Forbidden {
            message: "callback token verification failed".to_string(),
            source: last_error,
        })
    }

    /// Handle one callback for the document `id`.
    pub async fn handle(&self, id: &str, body: Value, headers: &HeaderMap) -> Result<CallbackOutcome> {
        tracing::debug!(file = %id, body = %body, "Editor callback received");

        let header_token = extract_header_token(headers, &self.header);
        let trusted = self.resolve_payload(body, header_token.as_deref())?;
        let payload = CallbackPayload::from_value(&trusted);

        tracing::info!(
            file = %id,
            status = payload.status.map(|s| s.code()),
            key = payload.key.as_deref().unwrap_or(""),
            has_url = payload.url.is_some(),
            "Editor callback"
        );

        let status = match payload.status {
            Some(status) if status.requires_save() => status,
            other => return Ok(CallbackOutcome::Acknowledged(other)),
        };

        let url = payload.url.ok_or_else(|| {
            DocError::Validation("callback download url missing".to_string())
        })?;

        let content = self.fetcher.fetch(&url).await?;
        self.registry.overwrite(id, &content).await?;

        tracing::info!(
            file = %id,
            status = status.code(),
            size = content.len(),
            "Stored edited document"
        );

        Ok(CallbackOutcome::Saved {
            bytes: content.len(),
        })
    }
}

/// Header tokens wrap the callback body in a `payload` claim.
fn unwrap_nested_payload(claims: Value) -> Value {
    if claims.get("status").is_none() {
        if let Some(inner @ Value::Object(_)) = claims.get("payload") {
            return inner.clone();
        }
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::Algorithm;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "S";

    fn signer() -> TokenSigner {
        TokenSigner::new(SECRET, Algorithm::HS256)
    }

    fn setup(signer: Option<TokenSigner>) -> (TempDir, Arc<FileRegistry>, CallbackReceiver) {
        let temp_dir = TempDir::new().unwrap();
        let registry =
            Arc::new(FileRegistry::new(temp_dir.path(), "http://localhost:4000").unwrap());
        let fetcher = DocumentFetcher::new(Duration::from_secs(5), 1024 * 1024).unwrap();
        let receiver = CallbackReceiver::new(
            registry.clone(),
            signer,
            HeaderName::from_static("authorization"),
            fetcher,
        );
        (temp_dir, registry, receiver)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(CallbackStatus::from(2), CallbackStatus::MustSave);
        assert_eq!(CallbackStatus::from(6), CallbackStatus::MustForceSave);
        assert_eq!(CallbackStatus::from(5), CallbackStatus::Other(5));
        assert_eq!(CallbackStatus::from(7).code(), 7);
        assert!(CallbackStatus::MustSave.requires_save());
        assert!(CallbackStatus::MustForceSave.requires_save());
        assert!(!CallbackStatus::Editing.requires_save());
        assert!(!CallbackStatus::ForceSaveError.requires_save());
    }

    #[test]
    fn test_payload_from_value() {
        let payload = CallbackPayload::from_value(&json!({
            "status": 2, "url": "http://e/x", "key": "k", "users": ["u1"]
        }));
        assert_eq!(payload.status, Some(CallbackStatus::MustSave));
        assert_eq!(payload.url.as_deref(), Some("http://e/x"));
        assert_eq!(payload.key.as_deref(), Some("k"));

        let loose = CallbackPayload::from_value(&json!({"status": "2", "url": ""}));
        assert_eq!(loose, CallbackPayload::default());
    }

    #[test]
    fn test_extract_header_token() {
        let name = HeaderName::from_static("authorization");
        assert_eq!(extract_header_token(&bearer("abc"), &name).as_deref(), Some("abc"));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("bearer   xyz "));
        assert_eq!(extract_header_token(&headers, &name).as_deref(), Some("xyz"));

        headers.insert("authorization", HeaderValue::from_static("raw.token.value"));
        assert_eq!(
            extract_header_token(&headers, &name).as_deref(),
            Some("raw.token.value")
        );

        headers.insert("authorization", HeaderValue::from_static("   "));
        assert_eq!(extract_header_token(&headers, &name), None);

        assert_eq!(extract_header_token(&HeaderMap::new(), &name), None);
    }

    #[test]
    fn test_custom_header_name() {
        let name = HeaderName::from_static("x-editor-token");
        let mut headers = bearer("ignored");
        headers.insert("x-editor-token", HeaderValue::from_static("Bearer mine"));
        assert_eq!(extract_header_token(&headers, &name).as_deref(), Some("mine"));
    }

    #[test]
    fn test_unsigned_mode_trusts_body() {
        let (_temp_dir, _registry, receiver) = setup(None);
        let body = json!({"status": 1});
        assert_eq!(receiver.resolve_payload(body.clone(), None).unwrap(), body);
    }

    #[test]
    fn test_missing_token_is_forbidden() {
        let (_temp_dir, _registry, receiver) = setup(Some(signer()));

        let result = receiver.resolve_payload(json!({"status": 2}), None);
        assert!(matches!(result, Err(DocError::Forbidden { source: None, .. })));

        let result = receiver.resolve_payload(json!({"status": 2, "token": ""}), Some(""));
        assert!(matches!(result, Err(DocError::Forbidden { .. })));
    }

    #[test]
    fn test_body_token_verified() {
        let (_temp_dir, _registry, receiver) = setup(Some(signer()));
        let token = signer().sign(&json!({"status": 1, "key": "k"})).unwrap();

        // Unsigned body fields are replaced by the signed claims.
        let trusted = receiver
            .resolve_payload(json!({"status": 2, "token": token}), None)
            .unwrap();
        assert_eq!(trusted["status"], 1);
    }

    #[test]
    fn test_wrong_secret_rejected_with_cause() {
        let (_temp_dir, _registry, receiver) = setup(Some(signer()));
        let forged = TokenSigner::new("other", Algorithm::HS256)
            .sign(&json!({"status": 2}))
            .unwrap();

        let result = receiver.resolve_payload(json!({"token": forged}), None);
        assert!(matches!(result, Err(DocError::Forbidden { source: Some(_), .. })));
    }

    // The fallback accepts whichever source verifies: a forged body token does
    // not stop a valid header token, and a valid body token wins over the header.
    #[test]
    fn test_header_token_used_when_body_token_fails() {
        let (_temp_dir, _registry, receiver) = setup(Some(signer()));
        let forged = TokenSigner::new("other", Algorithm::HS256)
            .sign(&json!({"status": 2, "url": "http://evil"}))
            .unwrap();
        let header = signer().sign(&json!({"status": 4})).unwrap();

        let trusted = receiver
            .resolve_payload(json!({"token": forged}), Some(&header))
            .unwrap();
        assert_eq!(trusted["status"], 4);
    }

    #[test]
    fn test_body_token_preferred_over_header() {
        let (_temp_dir, _registry, receiver) = setup(Some(signer()));
        let body = signer().sign(&json!({"status": 1})).unwrap();
        let header = signer().sign(&json!({"status": 4})).unwrap();

        let trusted = receiver
            .resolve_payload(json!({"token": body}), Some(&header))
            .unwrap();
        assert_eq!(trusted["status"], 1);
    }

    #[test]
    fn test_header_token_nested_payload() {
        let (_temp_dir, _registry, receiver) = setup(Some(signer()));
        let header = signer()
            .sign(&json!({"payload": {"status": 2, "url": "http://e/x"}}))
            .unwrap();

        let trusted = receiver.resolve_payload(json!({}), Some(&header)).unwrap();
        assert_eq!(trusted["status"], 2);
        assert_eq!(trusted["url"], "http://e/x");
    }

    #[tokio::test]
    async fn test_handle_save_overwrites() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/saved.docx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"edited".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let (temp_dir, registry, receiver) = setup(Some(signer()));
        registry.store(b"original", "a.docx").await.unwrap();
        let url = format!("{}/saved.docx", server.uri());
        let token = signer().sign(&json!({"status": 2, "url": url})).unwrap();

        let outcome = receiver
            .handle("a.docx", json!({"status": 2, "url": url, "token": token}), &HeaderMap::new())
            .await
            .unwrap();

        assert_eq!(outcome, CallbackOutcome::Saved { bytes: 6 });
        assert_eq!(std::fs::read(temp_dir.path().join("a.docx")).unwrap(), b"edited");
    }

    #[tokio::test]
    async fn test_handle_force_save_via_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"forced".to_vec()))
            .mount(&server)
            .await;

        let (temp_dir, registry, receiver) = setup(Some(signer()));
        registry.store(b"original", "b.xlsx").await.unwrap();
        let token = signer()
            .sign(&json!({"payload": {"status": 6, "url": server.uri()}}))
            .unwrap();

        let outcome = receiver
            .handle("b.xlsx", json!({"status": 6}), &bearer(&token))
            .await
            .unwrap();

        assert_eq!(outcome, CallbackOutcome::Saved { bytes: 6 });
        assert_eq!(std::fs::read(temp_dir.path().join("b.xlsx")).unwrap(), b"forced");
    }

    #[tokio::test]
    async fn test_handle_editing_is_noop() {
        let (temp_dir, registry, receiver) = setup(None);
        registry.store(b"original", "a.docx").await.unwrap();

        let outcome = receiver
            .handle("a.docx", json!({"status": 1, "url": "http://unused"}), &HeaderMap::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CallbackOutcome::Acknowledged(Some(CallbackStatus::Editing))
        );
        assert_eq!(std::fs::read(temp_dir.path().join("a.docx")).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_handle_save_without_url() {
        let (_temp_dir, _registry, receiver) = setup(None);

        let result = receiver
            .handle("a.docx", json!({"status": 2}), &HeaderMap::new())
            .await;

        assert!(matches!(result, Err(DocError::Validation(_))));
    }

    #[tokio::test]
    async fn test_handle_upstream_failure_keeps_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (temp_dir, registry, receiver) = setup(None);
        registry.store(b"original", "a.docx").await.unwrap();

        let result = receiver
            .handle("a.docx", json!({"status": 2, "url": server.uri()}), &HeaderMap::new())
            .await;

        assert!(matches!(result, Err(DocError::Upstream(_))));
        assert_eq!(std::fs::read(temp_dir.path().join("a.docx")).unwrap(), b"original");
    }
}
