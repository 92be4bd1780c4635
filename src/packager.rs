//! Output packaging
//!
//! Zips a [`WorkingDirectory`] into memory. The directory is consumed: whatever happens
//! while packaging, it is deleted before [`package`] returns.

use crate::error::{Error, Result};
use crate::types::OutputArchive;
use crate::utils::zip_entry_name;
use crate::workdir::WorkingDirectory;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

/// Zip every file below `work` (relative paths, `/`-separated, sorted by name)
///
/// `file_name` is the suggested download name carried on the returned archive.
pub fn package(work: WorkingDirectory, file_name: impl Into<String>) -> Result<OutputArchive> {
    let file_name = file_name.into();
    let result = zip_dir(work.path());

    // Removed on every path, including a failed zip
    if let Err(e) = work.close() {
        debug!(error = %e, "working directory cleanup reported an error");
    }

    let (bytes, entries) = result?;

    info!(
        archive = %file_name,
        entries = entries.len(),
        bytes = bytes.len(),
        "packaged output archive"
    );

    Ok(OutputArchive {
        file_name,
        bytes,
        entries,
    })
}

/// Zip the files under `root` into memory, returning the bytes and entry names
pub fn zip_dir(root: &Path) -> Result<(Vec<u8>, Vec<String>)> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::packaging(path, e)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(name) = zip_entry_name(root, path) else {
            continue;
        };

        let content =
            std::fs::read(path).map_err(|e| Error::packaging(path, format!("read failed: {e}")))?;

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| Error::packaging(path, e))?;
        writer
            .write_all(&content)
            .map_err(|e| Error::packaging(path, format!("write failed: {e}")))?;

        entries.push(name);
    }

    let cursor = writer.finish().map_err(|e| Error::packaging(root, e))?;
    Ok((cursor.into_inner(), entries))
}
