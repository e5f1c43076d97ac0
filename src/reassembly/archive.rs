//! ZIP detection and guarded extraction.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::{Result, TransferError};
use crate::framing::mime::is_zip_bytes;

/// True when the payload should be unpacked after it is written.
pub fn is_zip_payload(mime: &str, file_name: &str, bytes: &[u8]) -> bool {
    mime == "application/zip" || file_name.to_ascii_lowercase().ends_with(".zip") || is_zip_bytes(bytes)
}

/// Where `entry` lands under `target`, or `None` if it would leave `target`.
///
/// Both slash styles separate components. `.` is dropped, `..` pops one
/// level, and popping past `target` is an escape. Absolute names and drive
/// prefixes are escapes as well.
pub fn entry_destination(target: &Path, entry: &str) -> Option<PathBuf> {
    let entry = entry.replace('\\', "/");
    if entry.starts_with('/') {
        return None;
    }
    let mut parts: Vec<&str> = Vec::new();
    for part in entry.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            p if p.contains(':') => return None,
            p => parts.push(p),
        }
    }
    Some(parts.iter().fold(target.to_path_buf(), |acc, p| acc.join(p)))
}

/// Unpack `archive` into `target`, returning the number of files written.
///
/// `target` is always created. A file that does not parse as an archive
/// (for instance a bare local-header signature) extracts nothing and is
/// only logged. Aborts with `UnsafeArchiveEntry` on the first entry that
/// escapes `target`; entries extracted before it stay on disk.
pub fn extract_zip(archive: &Path, target: &Path) -> Result<usize> {
    fs::create_dir_all(target)?;
    let mut zip = match ZipArchive::new(File::open(archive)?) {
        Ok(zip) => zip,
        Err(e) => {
            warn!(archive = %archive.display(), error = %e, "archive unreadable, nothing extracted");
            return Ok(0);
        }
    };

    let mut written = 0usize;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        let Some(dest) = entry_destination(target, &name) else {
            return Err(TransferError::UnsafeArchiveEntry { entry: name });
        };

        if entry.is_dir() || dest == target {
            fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest)?;
        let bytes = io::copy(&mut entry, &mut out)?;
        debug!(entry = %name, bytes, "archive entry extracted");
        written += 1;
    }

    info!(dir = %target.display(), files = written, "archive extracted");
    Ok(written)
}
