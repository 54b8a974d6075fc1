//! Document storage for docdesk.
//!
//! This module provides the filesystem-backed registry:
//! - Supported extensions and their editor families
//! - Client name repair, sanitation and de-duplication
//! - Listing, storing, deleting and overwriting documents

mod kind;
mod naming;
mod record;
mod storage;

pub use kind::{
    extension_of, family_for_extension, family_of, is_supported, DocumentFamily,
    SUPPORTED_EXTENSIONS,
};
pub use naming::{decode_original_name, numbered_name, sanitize_file_name, DEFAULT_EXTENSION};
pub use record::DocumentRecord;
pub use storage::FileRegistry;
