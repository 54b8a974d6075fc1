//! Editor session and callback handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::editor::{CallbackOutcome, EditorSession};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::DocError;

/// Acknowledgement the editor expects from a callback.
#[derive(Debug, Serialize)]
pub struct CallbackAck {
    pub error: u8,
}

/// GET /api/editor/:id - Editor configuration for a stored document.
pub async fn get_editor_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EditorSession>, ApiError> {
    let session = state.issuer.issue(&id).await?;
    Ok(Json(session))
}

/// POST /api/editor-callback/:id - Status notification from the editor.
///
/// An empty body is treated as `{}`. Rejected callbacks carry `"error": 1`
/// so the editor reports them instead of retrying silently.
pub async fn editor_callback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CallbackAck>, ApiError> {
    let body = parse_callback_body(&body)?;

    match state.receiver.handle(&id, body, &headers).await {
        Ok(CallbackOutcome::Saved { bytes }) => {
            tracing::debug!(file = %id, bytes, "Editor callback saved document");
            Ok(Json(CallbackAck { error: 0 }))
        }
        Ok(CallbackOutcome::Acknowledged(_)) => Ok(Json(CallbackAck { error: 0 })),
        Err(DocError::Validation(msg)) => Err(ApiError::bad_request(msg).with_callback_error(1)),
        Err(e) => {
            if !matches!(e, DocError::Forbidden { .. }) {
                tracing::error!(file = %id, error = %e, "Editor callback failed");
            }
            Err(e.into())
        }
    }
}

fn parse_callback_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }

    serde_json::from_slice(body).map_err(|e| {
        ApiError::bad_request(format!("invalid callback body: {e}")).with_callback_error(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::error::ErrorCode;

    #[test]
    fn test_parse_callback_body() {
        assert_eq!(parse_callback_body(b"").unwrap(), serde_json::json!({}));
        assert_eq!(parse_callback_body(b" \n").unwrap(), serde_json::json!({}));
        assert_eq!(
            parse_callback_body(br#"{"status":1}"#).unwrap()["status"],
            1
        );

        let err = parse_callback_body(b"{not json").unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
    }
}
