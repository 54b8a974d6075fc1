//! Client file name repair and sanitation.

use std::borrow::Cow;
use std::path::Path;

use encoding_rs::UTF_8;

/// Extension used when a placeholder name has to be generated.
pub const DEFAULT_EXTENSION: &str = "docx";

/// Repair a file name whose UTF-8 bytes were decoded as Latin-1 in transit.
///
/// Multipart parsers commonly hand over `filename` parameters with each raw
/// byte widened to a code point. When every character fits in a byte and
/// those bytes form valid UTF-8, the re-decoded string is returned; otherwise
/// the name is kept as given.
pub fn decode_original_name(name: &str) -> Cow<'_, str> {
    if name.is_ascii() {
        return Cow::Borrowed(name);
    }

    let mut bytes = Vec::with_capacity(name.len());
    for c in name.chars() {
        match u8::try_from(u32::from(c)) {
            Ok(b) => bytes.push(b),
            Err(_) => return Cow::Borrowed(name),
        }
    }

    match UTF_8.decode_without_bom_handling_and_without_replacement(&bytes) {
        Some(decoded) => Cow::Owned(decoded.into_owned()),
        None => Cow::Borrowed(name),
    }
}

/// Decode, neutralize path separators and trim a client-supplied name.
///
/// Falls back to `document-{millis}.docx` when nothing usable remains.
pub fn sanitize_file_name(name: &str) -> String {
    sanitize_file_name_at(name, chrono::Utc::now().timestamp_millis())
}

fn sanitize_file_name_at(name: &str, now_millis: i64) -> String {
    let decoded = decode_original_name(name);
    let safe = decoded.replace(['/', '\\'], "_");
    let trimmed = safe.trim();

    if matches!(trimmed, "" | "." | "..") {
        format!("document-{now_millis}.{DEFAULT_EXTENSION}")
    } else {
        trimmed.to_string()
    }
}

/// The `n`th alternative for a taken name: `report (n).docx`.
pub fn numbered_name(name: &str, n: u32) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem} ({n}).{ext}"),
        None => format!("{stem} ({n})"),
    }
}
