//! In-memory ZIP reader for BI Publisher containers
//!
//! All three container formats are plain ZIP files. [`ArchiveReader`] opens one from
//! bytes, lists its members in archive order and reads members back as bytes. It never
//! touches the filesystem.
//!
//! Sizes recorded in the ZIP headers are never trusted for allocation: members are
//! streamed into a growing buffer and cut off at the reader's member limit.

use crate::error::{Error, Result};
use std::io::{Cursor, Read};
use tracing::debug;

/// Largest member (uncompressed) read when no other limit is set: 256 MiB
pub const DEFAULT_MAX_MEMBER_BYTES: u64 = 256 * 1024 * 1024;

/// Read-only view over a ZIP archive held in memory
pub struct ArchiveReader<'a> {
    label: String,
    archive: zip::ZipArchive<Cursor<&'a [u8]>>,
    names: Vec<String>,
    member_limit: u64,
}

impl<'a> ArchiveReader<'a> {
    /// Open `bytes` as a ZIP archive
    ///
    /// `label` names the archive in errors and logs (usually the upload or member name).
    pub fn open(label: impl Into<String>, bytes: &'a [u8]) -> Result<Self> {
        let label = label.into();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::corrupt(&label, format!("failed to read ZIP archive: {e}")))?;

        let mut names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i).map_err(|e| {
                Error::corrupt(&label, format!("failed to read entry {i}: {e}"))
            })?;
            names.push(entry.name().to_string());
        }

        debug!(archive = %label, members = names.len(), "opened archive");

        Ok(Self {
            label,
            archive,
            names,
            member_limit: DEFAULT_MAX_MEMBER_BYTES,
        })
    }

    /// Fail reads of members that inflate to more than `limit` bytes
    #[must_use]
    pub fn with_member_limit(mut self, limit: u64) -> Self {
        self.member_limit = limit;
        self
    }

    /// Name used for this archive in errors and logs
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Member names in archive order (directories included, with a trailing `/`)
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the archive has no members
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Read the full contents of the member called `name`
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(name).map_err(|e| {
            Error::corrupt(&self.label, format!("failed to open member {name}: {e}"))
        })?;
        read_member(&self.label, self.member_limit, &mut file)
    }

    /// Read the member at `index` (position in [`names`](Self::names))
    ///
    /// Prefer this over [`read`](Self::read) when walking the archive: an archive may
    /// carry the same name twice and only index access reaches both.
    pub fn read_index(&mut self, index: usize) -> Result<Vec<u8>> {
        let mut file = self.archive.by_index(index).map_err(|e| {
            Error::corrupt(&self.label, format!("failed to open entry {index}: {e}"))
        })?;
        read_member(&self.label, self.member_limit, &mut file)
    }

    /// `(index, name)` of every member whose lower-cased name ends with `suffix`
    ///
    /// `suffix` must be lower-case. Directory entries and macOS metadata never match.
    pub fn members_ending_with(&self, suffix: &str) -> Vec<(usize, String)> {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                !is_directory(name)
                    && !is_macos_metadata(name)
                    && name.to_lowercase().ends_with(suffix)
            })
            .map(|(index, name)| (index, name.clone()))
            .collect()
    }
}

/// Stream one member into memory, failing once it passes `limit` bytes
fn read_member(label: &str, limit: u64, file: &mut zip::read::ZipFile<'_>) -> Result<Vec<u8>> {
    let name = file.name().to_string();
    let mut buf = Vec::new();
    file.by_ref()
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| Error::corrupt(label, format!("failed to read member {name}: {e}")))?;

    if buf.len() as u64 > limit {
        return Err(Error::corrupt(
            label,
            format!("member {name} is larger than {limit} bytes"),
        ));
    }

    Ok(buf)
}

/// Whether a member name denotes a directory entry
pub(crate) fn is_directory(name: &str) -> bool {
    name.ends_with('/') || name.ends_with('\\')
}

/// Whether a member is Finder metadata (`__MACOSX/...`) added when zipping on macOS
pub(crate) fn is_macos_metadata(name: &str) -> bool {
    name.starts_with("__MACOSX/")
}
