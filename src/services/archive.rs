//! Zip extraction into an in-memory [`FileMap`].

use crate::models::{ArchiveSettings, FileMap};
use crate::services::importer::ImportError;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Read every file entry of a zip archive held in memory.
///
/// Text entries (by extension) are decoded as lossy UTF-8. Other entries,
/// entries larger than `max_entry_bytes`, and entries that fail to read are
/// recorded with empty content so the resolver still sees their paths.
///
/// # Errors
///
/// Returns [`ImportError::Archive`] if the bytes are not a readable zip.
pub fn extract_archive(bytes: &[u8], settings: &ArchiveSettings) -> Result<FileMap, ImportError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut files = FileMap::new();

    for index in 0..archive.len() {
        let Some(path) = archive.name_for_index(index).map(normalize_path) else {
            continue;
        };
        if path.is_empty() || path.ends_with('/') {
            continue;
        }

        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Failed to open zip entry {}: {}", path, e);
                files.insert(path, String::new());
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }

        let content = if !is_text_entry(&path, &settings.text_extensions) {
            String::new()
        } else if entry.size() > settings.max_entry_bytes {
            tracing::debug!(
                "Skipping {}: {} bytes exceeds entry limit",
                path,
                entry.size()
            );
            String::new()
        } else {
            read_limited(&mut entry, settings.max_entry_bytes).unwrap_or_else(|e| {
                tracing::debug!("Failed to read {}: {}", path, e);
                String::new()
            })
        };

        files.insert(path, content);
    }

    tracing::debug!("Extracted {} files from archive", files.len());
    Ok(files)
}

/// Turn backslashes into forward slashes, then strip one leading `./`.
pub fn normalize_path(name: &str) -> String {
    let name = name.replace('\\', "/");
    match name.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

fn is_text_entry(path: &str, extensions: &[String]) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

/// Read at most `limit` bytes; a longer stream yields empty content.
///
/// The declared size in the zip header cannot be trusted, so the actual
/// decompressed length is bounded here too.
fn read_limited(reader: &mut impl Read, limit: u64) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut buf)?;

    if buf.len() as u64 > limit {
        tracing::debug!("Entry exceeded {} bytes while decompressing", limit);
        return Ok(String::new());
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
