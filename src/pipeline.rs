//! Extraction pipeline
//!
//! [`extract`] is the single entry point: it resolves the upload's [`ArchiveKind`] once,
//! stages artifacts in a fresh [`WorkingDirectory`] and packages them.
//!
//! | Kind | Strategy |
//! |------|----------|
//! | XDMZ | datamodel SQL → `<name>.sql` |
//! | XDOZ | allow-listed templates → `templates/` |
//! | XDRZ | every inner `.xdmz` as XDMZ, every inner `.xdoz` as XDOZ |
//!
//! Any failure aborts the whole request: no partial archive is ever produced, and the
//! working directory is removed on every path.

use crate::archive::{ArchiveReader, is_directory, is_macos_metadata};
use crate::config::{ExtractionConfig, SqlLayout};
use crate::datamodel::{extract_queries, per_query_stem, render_combined, render_single};
use crate::error::{Error, Result};
use crate::packager::package;
use crate::report::referenced_datamodel;
use crate::templates::collect_templates;
use crate::types::{
    ArchiveKind, DatamodelSummary, ExtractionSummary, InputArchive, OutputArchive, TemplateFile,
    file_stem,
};
use crate::utils::{safe_name, unique_path, zip_entry_name};
use crate::workdir::WorkingDirectory;
use std::path::Path;
use tracing::{debug, info};

/// Packaged archive plus a description of what went into it
#[derive(Debug)]
pub struct Extraction {
    /// The downloadable ZIP
    pub archive: OutputArchive,
    /// What was extracted
    pub summary: ExtractionSummary,
}

/// Run the full pipeline over one upload
///
/// # Example
///
/// ```no_run
/// use bip_extract::config::ExtractionConfig;
/// use bip_extract::pipeline::extract;
/// use bip_extract::types::InputArchive;
///
/// # fn example() -> bip_extract::Result<()> {
/// let bytes = std::fs::read("Sales.xdmz")?;
/// let input = InputArchive::new("Sales.xdmz", bytes)?;
/// let result = extract(&input, &ExtractionConfig::default())?;
/// std::fs::write(&result.archive.file_name, &result.archive.bytes)?;
/// # Ok(())
/// # }
/// ```
pub fn extract(input: &InputArchive, config: &ExtractionConfig) -> Result<Extraction> {
    info!(
        archive = %input.file_name,
        kind = ?input.kind,
        bytes = input.bytes.len(),
        "starting extraction"
    );

    let work = WorkingDirectory::create(config.work_root.as_deref())?;
    let mut summary = ExtractionSummary::new(input);

    // `work` is dropped (and removed) if any strategy fails
    match input.kind {
        ArchiveKind::Xdmz => {
            let mut reader = open_archive(&input.file_name, &input.bytes, config)?;
            let datamodel = process_xdmz(&mut reader, input.stem(), &work, config)?;
            summary.datamodels.push(datamodel);
        }
        ArchiveKind::Xdoz => {
            let mut reader = open_archive(&input.file_name, &input.bytes, config)?;
            let templates = process_xdoz(&mut reader, &work, config, &mut summary)?;
            merge_templates(&mut summary.templates, templates);
        }
        ArchiveKind::Xdrz => process_xdrz(input, &work, config, &mut summary)?,
    }

    let out_name = format!("{}_OUT.zip", safe_name(input.stem()));
    let archive = package(work, out_name)?;
    summary.entries = archive.entries.clone();

    info!(
        archive = %input.file_name,
        datamodels = summary.datamodels.len(),
        queries = summary.query_count(),
        templates = summary.templates.len(),
        "extraction complete"
    );

    Ok(Extraction { archive, summary })
}

/// Read an upload from disk and run [`extract`] on it
pub fn extract_file(path: &Path, config: &ExtractionConfig) -> Result<Extraction> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // Reject before reading the file
    ArchiveKind::from_file_name(&file_name)?;

    let bytes = std::fs::read(path)?;
    let input = InputArchive::new(file_name, bytes)?;
    extract(&input, config)
}

/// XDMZ: parse every datamodel member and write its SQL artifact(s)
fn process_xdmz(
    reader: &mut ArchiveReader<'_>,
    stem: &str,
    work: &WorkingDirectory,
    config: &ExtractionConfig,
) -> Result<DatamodelSummary> {
    let queries = extract_queries(reader)?;
    let name = safe_name(stem);
    let header = config.sql_header.as_deref();

    let mut artifacts = Vec::new();
    match config.sql_layout {
        SqlLayout::PerQuery if !queries.is_empty() => {
            let dir = work.unique_subdir(&name)?;
            for query in &queries {
                let path = unique_path(&dir, &per_query_stem(query), "sql")?;
                write_artifact(&path, &render_single(query, header))?;
                artifacts.extend(zip_entry_name(work.path(), &path));
            }
        }
        _ => {
            let path = work.unique_file(&name, "sql")?;
            write_artifact(&path, &render_combined(&queries, header))?;
            artifacts.extend(zip_entry_name(work.path(), &path));
        }
    }

    debug!(
        archive = %reader.label(),
        queries = queries.len(),
        ?artifacts,
        "wrote SQL artifacts"
    );

    Ok(DatamodelSummary {
        archive: reader.label().to_string(),
        artifacts,
        queries,
    })
}

/// XDOZ: collect templates and note the data model the report points at
fn process_xdoz(
    reader: &mut ArchiveReader<'_>,
    work: &WorkingDirectory,
    config: &ExtractionConfig,
    summary: &mut ExtractionSummary,
) -> Result<Vec<TemplateFile>> {
    let templates = collect_templates(reader, work, config)?;
    if let Some(url) = referenced_datamodel(reader) {
        summary.referenced_datamodels.push(url);
    }
    Ok(templates)
}

/// XDRZ: route inner `.xdmz`/`.xdoz` members in archive order, ignore everything else
fn process_xdrz(
    input: &InputArchive,
    work: &WorkingDirectory,
    config: &ExtractionConfig,
    summary: &mut ExtractionSummary,
) -> Result<()> {
    let mut outer = open_archive(&input.file_name, &input.bytes, config)?;
    let members: Vec<(usize, String)> = outer.names().iter().cloned().enumerate().collect();

    let mut routed = 0usize;
    for (index, member) in members {
        if is_directory(&member) || is_macos_metadata(&member) {
            continue;
        }
        let kind = match ArchiveKind::detect(&member) {
            Some(kind @ (ArchiveKind::Xdmz | ArchiveKind::Xdoz)) => kind,
            _ => {
                debug!(member = %member, "ignoring member");
                continue;
            }
        };

        let bytes = outer.read_index(index)?;
        let mut inner = open_archive(&member, &bytes, config)?;

        if kind == ArchiveKind::Xdmz {
            let datamodel = process_xdmz(&mut inner, file_stem(&member), work, config)?;
            summary.datamodels.push(datamodel);
        } else {
            let templates = process_xdoz(&mut inner, work, config, summary)?;
            merge_templates(&mut summary.templates, templates);
        }
        routed += 1;
    }

    if routed == 0 {
        info!(archive = %input.file_name, "no .xdmz or .xdoz members found");
    }

    Ok(())
}

fn open_archive<'a>(
    label: &str,
    bytes: &'a [u8],
    config: &ExtractionConfig,
) -> Result<ArchiveReader<'a>> {
    Ok(ArchiveReader::open(label, bytes)?.with_member_limit(config.max_member_bytes))
}

/// Fold `incoming` into `all` with the same overwrite-last-wins rule used on disk
fn merge_templates(all: &mut Vec<TemplateFile>, incoming: Vec<TemplateFile>) {
    for file in incoming {
        match all.iter_mut().find(|t| t.name == file.name) {
            Some(existing) => *existing = file,
            None => all.push(file),
        }
    }
}

fn write_artifact(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| {
        Error::Io(std::io::Error::other(format!(
            "failed to write {}: {e}",
            path.display()
        )))
    })
}
