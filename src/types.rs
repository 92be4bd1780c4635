//! Core types shared by the extraction pipeline and the API

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use utoipa::ToSchema;

/// The three BI Publisher container formats
///
/// Resolved once from the upload's extension; everything downstream matches on
/// this enum instead of comparing extension strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// Data model bundle (`.xdmz`)
    Xdmz,
    /// Report container holding `.xdmz` / `.xdoz` members (`.xdrz`)
    Xdrz,
    /// Report/template bundle (`.xdoz`)
    Xdoz,
}

impl ArchiveKind {
    /// Detect the kind from a file name or path (case-insensitive extension match)
    pub fn detect(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();

        match ext.as_str() {
            "xdmz" => Some(ArchiveKind::Xdmz),
            "xdrz" => Some(ArchiveKind::Xdrz),
            "xdoz" => Some(ArchiveKind::Xdoz),
            _ => None,
        }
    }

    /// Like [`detect`](Self::detect) but fails with `UnsupportedFormat`
    pub fn from_file_name(name: &str) -> Result<Self> {
        Self::detect(name).ok_or_else(|| Error::UnsupportedFormat {
            file_name: name.to_string(),
        })
    }

    /// Extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Xdmz => "xdmz",
            ArchiveKind::Xdrz => "xdrz",
            ArchiveKind::Xdoz => "xdoz",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// An uploaded archive, read-only for the duration of one request
#[derive(Clone, Debug)]
pub struct InputArchive {
    /// Original file name as uploaded
    pub file_name: String,
    /// Detected container kind
    pub kind: ArchiveKind,
    /// Raw archive bytes
    pub bytes: Vec<u8>,
}

impl InputArchive {
    /// Wrap an upload, rejecting unrecognized extensions
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let kind = ArchiveKind::from_file_name(&file_name)?;
        Ok(Self {
            file_name,
            kind,
            bytes,
        })
    }

    /// File stem of the upload (name without directory or extension)
    pub fn stem(&self) -> &str {
        file_stem(&self.file_name)
    }
}

/// Which datamodel element a query came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    /// `dataSets/dataSet`
    DataSet,
    /// `valueSets/valueSet` (list of values)
    ValueSet,
}

impl QuerySource {
    /// Element name as it appears in the datamodel XML
    pub fn element_name(&self) -> &'static str {
        match self {
            QuerySource::DataSet => "dataSet",
            QuerySource::ValueSet => "valueSet",
        }
    }
}

/// A single SQL statement pulled from a datamodel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExtractedQuery {
    /// Element the statement came from
    pub source: QuerySource,
    /// Dataset name or valueset id, sanitized for use in file names
    pub name: String,
    /// Statement text, trimmed but otherwise untouched
    pub sql: String,
}

/// A template copied into `templates/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TemplateFile {
    /// Original base name
    pub name: String,
    /// Lower-case extension without the dot
    pub extension: String,
    /// Size in bytes
    pub size: u64,
    /// Path inside the output archive
    pub path: String,
}

/// SQL extracted from one data model archive
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DatamodelSummary {
    /// The data model archive (the upload itself, or an inner `.xdmz`)
    pub archive: String,
    /// Output paths written for this data model
    pub artifacts: Vec<String>,
    /// Statements in document order
    pub queries: Vec<ExtractedQuery>,
}

/// What one extraction produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExtractionSummary {
    /// Uploaded file name
    pub input: String,
    /// Detected kind of the upload
    pub kind: ArchiveKind,
    /// One entry per processed data model
    pub datamodels: Vec<DatamodelSummary>,
    /// Collected templates (after overwrite-last-wins)
    pub templates: Vec<TemplateFile>,
    /// `dataModel url` values found in report definitions
    pub referenced_datamodels: Vec<String>,
    /// Entry names of the output archive, in archive order
    pub entries: Vec<String>,
}

impl ExtractionSummary {
    pub(crate) fn new(input: &InputArchive) -> Self {
        Self {
            input: input.file_name.clone(),
            kind: input.kind,
            datamodels: Vec::new(),
            templates: Vec::new(),
            referenced_datamodels: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Total number of statements across all data models
    pub fn query_count(&self) -> usize {
        self.datamodels.iter().map(|dm| dm.queries.len()).sum()
    }

    /// Cut every statement down to its first `max_lines` lines
    ///
    /// Truncated statements end with a `-- ... (N more lines)` marker.
    pub fn truncate_statements(&mut self, max_lines: usize) {
        for query in self.datamodels.iter_mut().flat_map(|dm| dm.queries.iter_mut()) {
            let total = query.sql.lines().count();
            if total <= max_lines {
                continue;
            }
            let mut kept: Vec<&str> = query.sql.lines().take(max_lines).collect();
            let marker = format!("-- ... ({} more lines)", total - max_lines);
            kept.push(&marker);
            query.sql = kept.join("\n");
        }
    }
}

/// The packaged result, ready to hand to the caller
#[derive(Clone, Debug)]
pub struct OutputArchive {
    /// Suggested download name (`<stem>_OUT.zip`)
    pub file_name: String,
    /// ZIP bytes
    pub bytes: Vec<u8>,
    /// Entry names in archive order
    pub entries: Vec<String>,
}

/// Base name without extension, accepting both `/` and `\` separators
pub(crate) fn file_stem(name: &str) -> &str {
    let base = base_name(name);
    match base.rfind('.') {
        Some(0) | None => base,
        Some(idx) => &base[..idx],
    }
}

/// Last path component, accepting both `/` and `\` separators
pub(crate) fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
