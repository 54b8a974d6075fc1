//! Supported document extensions and their editor families.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Editor family a document opens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFamily {
    /// Word processing (text documents and PDF).
    Word,
    /// Spreadsheets.
    Cell,
}

impl DocumentFamily {
    /// Name used in the editor configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFamily::Word => "word",
            DocumentFamily::Cell => "cell",
        }
    }
}

impl fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allow-list of extensions (lowercase, without dot).
pub const SUPPORTED_EXTENSIONS: &[(&str, DocumentFamily)] = &[
    ("docx", DocumentFamily::Word),
    ("doc", DocumentFamily::Word),
    ("odt", DocumentFamily::Word),
    ("rtf", DocumentFamily::Word),
    ("docm", DocumentFamily::Word),
    ("xls", DocumentFamily::Cell),
    ("xlsx", DocumentFamily::Cell),
    ("xlsm", DocumentFamily::Cell),
    ("ods", DocumentFamily::Cell),
    ("pdf", DocumentFamily::Word),
];

/// Lowercase extension of a file name, without the dot.
///
/// Dot-files such as `.docx` have no extension.
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}

/// Look up the family for an extension (case-insensitive).
pub fn family_for_extension(ext: &str) -> Option<DocumentFamily> {
    let ext = ext.to_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, family)| *family)
}

/// Family of a file name, or `None` when its extension is not supported.
pub fn family_of(name: &str) -> Option<DocumentFamily> {
    extension_of(name).and_then(|ext| family_for_extension(&ext))
}

/// Whether a file name has a supported extension.
pub fn is_supported(name: &str) -> bool {
    family_of(name).is_some()
}
