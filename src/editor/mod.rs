//! Integration with the external collaborative editor.
//!
//! - [`session`]: editor configurations handed to the browser
//! - [`callback`]: verification and handling of status callbacks
//! - [`signing`]: the shared-secret JWT used by both directions
//! - [`fetcher`]: download of saved documents

pub mod callback;
pub mod fetcher;
pub mod session;
pub mod signing;

pub use callback::{
    extract_header_token, CallbackOutcome, CallbackPayload, CallbackReceiver, CallbackStatus,
};
pub use fetcher::DocumentFetcher;
pub use session::{
    document_key, EditorSession, SessionConfig, SessionIssuer, SessionSettings,
};
pub use signing::TokenSigner;
