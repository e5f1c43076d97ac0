use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use tracing::{debug, info};

use crate::error::{Result, TransferError};
use crate::framing::mime::resolve_content_type;
use crate::wire::{
    CHUNK_SIZE, DEFAULT_FILE_NAME, FILE_PAYLOAD_PREFIX, FILE_PAYLOAD_SEPARATOR, WARMUP_SENTINEL,
    data_chunk_count, split_code_points,
};

/// Turns text or files into the ordered chunk list shown as slides.
///
/// Chunk 0 is always the warmup sentinel. Tagged file payloads are cached per
/// canonical path so generating the same file twice reads it once.
#[derive(Debug)]
pub struct PayloadFramer {
    chunk_size: usize,
    cache: HashMap<PathBuf, String>,
}

impl Default for PayloadFramer {
    fn default() -> Self {
        Self::new(CHUNK_SIZE)
    }
}

impl PayloadFramer {
    /// Framer producing data chunks of at most `chunk_size` code points.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            cache: HashMap::new(),
        }
    }

    /// Code points per data chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunks for a text payload.
    pub fn frame_text(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Err(TransferError::EmptyInput);
        }
        let chunks = self.with_warmup(text);
        debug!(chunks = chunks.len(), "framed text payload");
        Ok(chunks)
    }

    /// Chunks for a file payload, using the cached tagged string when present.
    pub fn frame_file(&mut self, path: &Path) -> Result<Vec<String>> {
        let tagged = self.tagged_payload(path)?;
        Ok(self.with_warmup(&tagged))
    }

    /// Tagged string for `path`, reading the file on first use only.
    pub fn tagged_payload(&mut self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(TransferError::MissingFile(path.to_path_buf()));
        }
        let key = fs::canonicalize(path)?;
        if let Some(cached) = self.cache.get(&key) {
            debug!(path = %key.display(), "reusing cached file payload");
            return Ok(cached.clone());
        }

        let bytes = fs::read(&key)?;
        let tagged = build_file_payload(path, &bytes);
        info!(
            path = %key.display(),
            bytes = bytes.len(),
            chunks = data_chunk_count(&tagged, self.chunk_size),
            "file payload ready"
        );
        self.cache.insert(key, tagged.clone());
        Ok(tagged)
    }

    /// Drop the cached payload of `path`, e.g. after the file changed.
    pub fn forget(&mut self, path: &Path) -> bool {
        match fs::canonicalize(path) {
            Ok(key) => self.cache.remove(&key).is_some(),
            Err(_) => self.cache.remove(path).is_some(),
        }
    }

    /// Data chunks `text` needs, not counting the warmup slide.
    pub fn chunk_count(&self, text: &str) -> usize {
        data_chunk_count(text, self.chunk_size)
    }

    fn with_warmup(&self, text: &str) -> Vec<String> {
        let data = split_code_points(text, self.chunk_size);
        let mut chunks = Vec::with_capacity(data.len() + 1);
        chunks.push(WARMUP_SENTINEL.to_string());
        chunks.extend(data);
        chunks
    }
}

/// `QRFILE1|<mime>|<base64url(name)>|<base64(bytes)>` for a file's contents.
pub fn build_file_payload(path: &Path, bytes: &[u8]) -> String {
    let mime = resolve_content_type(path, bytes);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    tag_payload(&mime, &name, bytes)
}

/// Tagged string from already resolved parts.
pub fn tag_payload(mime: &str, file_name: &str, bytes: &[u8]) -> String {
    let sep = FILE_PAYLOAD_SEPARATOR;
    format!(
        "{FILE_PAYLOAD_PREFIX}{mime}{sep}{}{sep}{}",
        URL_SAFE_NO_PAD.encode(file_name.as_bytes()),
        STANDARD.encode(bytes)
    )
}
