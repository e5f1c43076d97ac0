//! Output naming and the reassembly entry point.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::{Result, TransferError};
use crate::framing::mime::extension_for_mime;
use crate::reassembly::archive::{extract_zip, is_zip_payload};
use crate::reassembly::payload::{ParsedPayload, combine_chunks, decode_payload};
use crate::wire::is_warmup;

/// Outcome of a successful reassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassembledPayload {
    /// File the payload was written to.
    pub output_path: PathBuf,
    /// Directory the archive was unpacked into, for ZIP payloads.
    pub extracted_dir: Option<PathBuf>,
    /// Data chunks that went into the payload.
    pub chunk_count: usize,
    /// Bytes written.
    pub payload_bytes: usize,
    /// Content type after sniffing.
    pub mime_type: String,
    /// File name carried in the payload tag, unsanitized.
    pub original_file_name: Option<String>,
}

/// Last path component of `name` with unsafe characters replaced.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let normalized = name.replace('\\', "/");
    let base = match normalized.rfind('/') {
        Some(pos) if pos + 1 < normalized.len() => &normalized[pos + 1..],
        _ => normalized.as_str(),
    };
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// True when `name` has a dot that is neither its first nor last character.
pub fn has_extension(name: &str) -> bool {
    matches!(name.rfind('.'), Some(dot) if dot > 0 && dot + 1 < name.len())
}

/// `name` without its last extension; unchanged for dot-files.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Name used when the payload carries none, e.g. `18-10-2026_14-03-59`.
pub fn timestamp_name() -> String {
    Local::now().format("%d-%m-%Y_%H-%M-%S").to_string()
}

/// File name for a parsed payload, before collision handling.
pub fn output_file_name(payload: &ParsedPayload) -> String {
    let extension = extension_for_mime(&payload.mime_type);
    match payload.file_name.as_deref().and_then(sanitize_file_name) {
        Some(name) if has_extension(&name) => name,
        Some(name) => format!("{name}{extension}"),
        None => format!("{}{extension}", timestamp_name()),
    }
}

/// First free path for `file_name` in `dir`: `name.ext`, then `name_1.ext`, ...
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, extension) = match file_name.rfind('.') {
        Some(dot) if dot > 0 => file_name.split_at(dot),
        _ => (file_name, ""),
    };
    (1usize..)
        .map(|n| dir.join(format!("{stem}_{n}{extension}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Writes decoded chunks into a directory.
#[derive(Debug, Clone)]
pub struct PayloadReassembler {
    output_dir: PathBuf,
}

impl PayloadReassembler {
    /// Reassembler writing into `output_dir` (created on demand).
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Target directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Concatenate, parse, write and, for archives, unpack.
    ///
    /// Nothing touches the disk until the payload has parsed.
    pub fn reassemble<S: AsRef<str>>(&self, chunks: &[S]) -> Result<ReassembledPayload> {
        let chunk_count = chunks.iter().filter(|c| !is_warmup(c.as_ref())).count();
        let combined = combine_chunks(chunks);
        if chunk_count == 0 || combined.trim().is_empty() {
            return Err(TransferError::EmptyPayload);
        }
        let payload = decode_payload(&combined)?;

        fs::create_dir_all(&self.output_dir)?;
        let output_path = unique_path(&self.output_dir, &output_file_name(&payload));
        fs::write(&output_path, &payload.bytes)?;
        info!(
            path = %output_path.display(),
            bytes = payload.bytes.len(),
            mime = %payload.mime_type,
            chunks = chunk_count,
            "payload written"
        );

        let written_name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extracted_dir = if is_zip_payload(&payload.mime_type, &written_name, &payload.bytes) {
            let dir = self.output_dir.join(strip_extension(&written_name));
            extract_zip(&output_path, &dir)?;
            Some(dir)
        } else {
            None
        };

        Ok(ReassembledPayload {
            output_path,
            extracted_dir,
            chunk_count,
            payload_bytes: payload.bytes.len(),
            mime_type: payload.mime_type,
            original_file_name: payload.file_name,
        })
    }
}

/// Reassemble `chunks` into `output_dir`.
pub fn reassemble<S: AsRef<str>>(chunks: &[S], output_dir: &Path) -> Result<ReassembledPayload> {
    PayloadReassembler::new(output_dir).reassemble(chunks)
}
