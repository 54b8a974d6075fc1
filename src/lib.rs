//! docdesk - document hosting for a collaborative office editor.
//!
//! Stores uploaded office documents on disk, hands signed editor
//! configurations to the browser and accepts the editor's save callbacks.

pub mod config;
pub mod editor;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use editor::{CallbackReceiver, SessionIssuer, TokenSigner};
pub use error::{DocError, Result};
pub use file::{DocumentFamily, DocumentRecord, FileRegistry};
pub use web::WebServer;
