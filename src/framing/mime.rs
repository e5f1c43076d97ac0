//! Content-type tables shared by the framer and the reassembler.

use std::path::Path;

use crate::wire::DEFAULT_MIME_TYPE;

const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const PDF_MAGIC: &[u8] = &[0x25, 0x50, 0x44, 0x46, 0x2D];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Content type implied by the leading magic bytes, if recognised.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(ZIP_MAGIC) {
        Some("application/zip")
    } else if bytes.starts_with(PDF_MAGIC) {
        Some("application/pdf")
    } else if bytes.starts_with(PNG_MAGIC) {
        Some("image/png")
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some("image/jpeg")
    } else {
        None
    }
}

/// True when `bytes` start with the ZIP local file header signature.
pub fn is_zip_bytes(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Lower-cased extension including the dot, e.g. `.pdf`.
///
/// A dot that is the first or last character of the name does not start an
/// extension, so `.bashrc` and `name.` have none.
pub fn extension_of(name: &str) -> Option<String> {
    let dot = name.rfind('.')?;
    if dot == 0 || dot == name.len() - 1 {
        return None;
    }
    Some(name[dot..].to_ascii_lowercase())
}

/// MIME type registered for a file extension (`.zip`, `.pdf`, ...).
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension {
        ".zip" => "application/zip",
        ".pdf" => "application/pdf",
        ".txt" => "text/plain",
        ".json" => "application/json",
        ".csv" => "text/csv",
        ".xml" => "application/xml",
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        _ => return None,
    };
    Some(mime)
}

/// File extension written for a content type; `.bin` when unknown.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "application/zip" => ".zip",
        "application/pdf" => ".pdf",
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "text/plain" => ".txt",
        "application/json" => ".json",
        _ => ".bin",
    }
}

/// Content type declared for a file being sent.
///
/// The extension table wins; unknown extensions fall back to magic-byte
/// sniffing and finally to `application/octet-stream`.
pub fn resolve_content_type(path: &Path, bytes: &[u8]) -> String {
    let by_extension = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(extension_of)
        .and_then(|ext| mime_for_extension(&ext));

    by_extension
        .or_else(|| sniff_mime(bytes))
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string()
}

/// Declared type cleaned up and checked against the bytes.
///
/// A blank or generic declaration is replaced by the sniffed type.
pub fn normalize_declared_mime(declared: Option<&str>, bytes: &[u8]) -> String {
    let declared = declared.map(|m| m.trim().to_ascii_lowercase());
    match declared {
        Some(m) if !m.is_empty() && m != DEFAULT_MIME_TYPE => m,
        _ => sniff_mime(bytes).unwrap_or(DEFAULT_MIME_TYPE).to_string(),
    }
}
