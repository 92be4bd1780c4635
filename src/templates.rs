//! Template collection from report bundles
//!
//! Every member whose extension is on the allow-list is copied, byte for byte, into
//! `templates/<base name>`. Two members with the same base name resolve as
//! overwrite-last-wins: the one met later in archive order is what ends up on disk.

use crate::archive::{ArchiveReader, is_directory, is_macos_metadata};
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::types::{TemplateFile, base_name};
use crate::workdir::{TEMPLATES_DIR, WorkingDirectory};
use std::path::Path;
use tracing::debug;

/// Copy allow-listed members of `reader` into the working directory's `templates/`
///
/// Returns the templates written by this call, one entry per distinct file name, in the
/// order each name was first seen. Non-matching members are skipped silently.
pub fn collect_templates(
    reader: &mut ArchiveReader<'_>,
    work: &WorkingDirectory,
    config: &ExtractionConfig,
) -> Result<Vec<TemplateFile>> {
    let mut collected: Vec<TemplateFile> = Vec::new();

    for index in 0..reader.len() {
        let member = reader.names()[index].clone();
        if is_directory(&member) || is_macos_metadata(&member) {
            continue;
        }

        let name = base_name(&member);
        let Some(extension) = template_extension(name, config) else {
            continue;
        };

        let bytes = reader.read_index(index)?;
        let dest = work.templates_dir()?.join(name);
        std::fs::write(&dest, &bytes).map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "failed to write template {}: {e}",
                dest.display()
            )))
        })?;

        debug!(
            archive = %reader.label(),
            member = %member,
            bytes = bytes.len(),
            "collected template"
        );

        let file = TemplateFile {
            name: name.to_string(),
            extension,
            size: bytes.len() as u64,
            path: format!("{TEMPLATES_DIR}/{name}"),
        };

        match collected.iter_mut().find(|t| t.name == file.name) {
            Some(existing) => *existing = file,
            None => collected.push(file),
        }
    }

    Ok(collected)
}

/// Lower-cased extension of `name` if it is on the allow-list
fn template_extension(name: &str, config: &ExtractionConfig) -> Option<String> {
    // `.rtf` on its own has no extension as far as Path is concerned
    let ext = Path::new(name).extension()?.to_str()?;
    config
        .is_template_extension(ext)
        .then(|| ext.to_lowercase())
}
