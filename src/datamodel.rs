//! `*_datamodel.xdm` parsing
//!
//! A data model declares its queries as
//!
//! ```xml
//! <dataModel xmlns="http://xmlns.oracle.com/oxp/xmlp">
//!   <dataSets>
//!     <dataSet name="INVOICES" type="complex">
//!       <sql dataSourceRef="ApplicationDB_FSCM"><![CDATA[select ...]]></sql>
//!     </dataSet>
//!   </dataSets>
//!   <valueSets>
//!     <valueSet id="LOV_BU" type="sql">
//!       <sql dataSourceRef="ApplicationDB_FSCM"><![CDATA[select ...]]></sql>
//!     </valueSet>
//!   </valueSets>
//! </dataModel>
//! ```
//!
//! Element names are matched on their local part, so prefixed and default-namespace
//! documents parse the same way.

use crate::archive::ArchiveReader;
use crate::error::{Error, Result};
use crate::types::{ExtractedQuery, QuerySource};
use crate::utils::safe_name;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

/// Lower-case suffix identifying datamodel members
pub const DATAMODEL_SUFFIX: &str = "_datamodel.xdm";

/// Find every `*_datamodel.xdm` member and parse it, in archive order
///
/// Fails with `DatamodelNotFound` when the archive has no datamodel member.
pub fn extract_queries(reader: &mut ArchiveReader<'_>) -> Result<Vec<ExtractedQuery>> {
    let members = reader.members_ending_with(DATAMODEL_SUFFIX);
    if members.is_empty() {
        return Err(Error::DatamodelNotFound {
            archive: reader.label().to_string(),
        });
    }

    let mut queries = Vec::new();
    for (index, member) in members {
        let bytes = reader.read_index(index)?;
        let parsed = parse_datamodel(&member, &bytes)?;
        debug!(
            archive = %reader.label(),
            member = %member,
            queries = parsed.len(),
            "parsed datamodel"
        );
        queries.extend(parsed);
    }

    Ok(queries)
}

/// A `dataSet`/`valueSet` element being read
struct OpenSource {
    source: QuerySource,
    name: String,
    depth: usize,
    parts: Vec<String>,
}

/// Parse datamodel XML into statements, in document order
///
/// `member` is only used for error messages.
pub fn parse_datamodel(member: &str, xml: &[u8]) -> Result<Vec<ExtractedQuery>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);
    reader.check_end_names(true);

    let mut buf = Vec::new();
    // Local names of currently open elements
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut open: Option<OpenSource> = None;
    // Text of the `sql` element being read, if any
    let mut sql_text: Option<String> = None;
    let mut saw_root = false;
    let mut queries = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            Error::invalid_xml(member, format!("{e} at byte {}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(e) => {
                saw_root = true;
                let local = e.local_name().as_ref().to_vec();

                if open.is_none()
                    && let Some(source) = source_for(&local, stack.last().map(Vec::as_slice))
                {
                    open = Some(OpenSource {
                        source,
                        name: source_name(member, &e, source)?,
                        depth: stack.len(),
                        parts: Vec::new(),
                    });
                } else if local == b"sql"
                    && sql_text.is_none()
                    && let Some(src) = &open
                    && src.depth + 1 == stack.len()
                {
                    sql_text = Some(String::new());
                }

                stack.push(local);
            }
            Event::Empty(_) => {
                // `<dataSet name="x"/>` or `<sql/>` carry no statement
                saw_root = true;
            }
            Event::Text(e) => {
                if let Some(text) = sql_text.as_mut() {
                    let unescaped = e
                        .unescape()
                        .map_err(|err| Error::invalid_xml(member, err))?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if let Some(text) = sql_text.as_mut() {
                    let raw = e.into_inner();
                    let decoded = std::str::from_utf8(&raw)
                        .map_err(|err| Error::invalid_xml(member, err))?;
                    text.push_str(decoded);
                }
            }
            Event::End(_) => {
                stack.pop();

                let closes_sql = sql_text.is_some()
                    && open.as_ref().is_some_and(|src| stack.len() == src.depth + 1);
                let closes_source = open.as_ref().is_some_and(|src| stack.len() == src.depth);

                if closes_sql {
                    if let (Some(text), Some(src)) = (sql_text.take(), open.as_mut()) {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            src.parts.push(trimmed.to_string());
                        }
                    }
                } else if closes_source
                    && let Some(done) = open.take()
                    && !done.parts.is_empty()
                {
                    queries.push(ExtractedQuery {
                        source: done.source,
                        name: done.name,
                        sql: done.parts.join("\n\n"),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(Error::invalid_xml(
            member,
            format!(
                "unexpected end of document, <{}> is not closed",
                String::from_utf8_lossy(stack.last().map(Vec::as_slice).unwrap_or_default())
            ),
        ));
    }

    if !saw_root {
        return Err(Error::invalid_xml(member, "document has no root element"));
    }

    Ok(queries)
}

/// Whether an element with local name `local` under `parent` starts a query source
fn source_for(local: &[u8], parent: Option<&[u8]>) -> Option<QuerySource> {
    match (local, parent) {
        (b"dataSet", Some(b"dataSets")) => Some(QuerySource::DataSet),
        (b"valueSet", Some(b"valueSets")) => Some(QuerySource::ValueSet),
        _ => None,
    }
}

/// Dataset `name` / valueset `id`, sanitized, with a fallback when missing
fn source_name(member: &str, e: &BytesStart<'_>, source: QuerySource) -> Result<String> {
    let (wanted, fallback): (&[u8], &str) = match source {
        QuerySource::DataSet => (b"name", "Dataset"),
        QuerySource::ValueSet => (b"id", "ValueSet"),
    };

    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::invalid_xml(member, err))?;
        if attr.key.local_name().as_ref() == wanted {
            let value = attr
                .unescape_value()
                .map_err(|err| Error::invalid_xml(member, err))?;
            if !value.trim().is_empty() {
                return Ok(safe_name(&value));
            }
        }
    }

    Ok(fallback.to_string())
}

/// Render statements as one SQL artifact, one commented block per statement
///
/// ```text
/// -- dataSet: INVOICES
/// select ...
///
/// -- valueSet: LOV_BU
/// select ...
/// ```
pub fn render_combined(queries: &[ExtractedQuery], header: Option<&str>) -> String {
    let mut out = String::new();

    if let Some(header) = header {
        out.push_str("-- ");
        out.push_str(header);
        out.push('\n');
    }

    for (i, query) in queries.iter().enumerate() {
        if i > 0 || header.is_some() {
            out.push('\n');
        }
        out.push_str("-- ");
        out.push_str(query.source.element_name());
        out.push_str(": ");
        out.push_str(&query.name);
        out.push('\n');
        out.push_str(&query.sql);
        out.push('\n');
    }

    out
}

/// Render one statement as its own artifact
pub fn render_single(query: &ExtractedQuery, header: Option<&str>) -> String {
    match header {
        Some(header) => format!("-- {header}\n{}\n", query.sql),
        None => format!("{}\n", query.sql),
    }
}

/// File stem used for a statement in the per-query layout
pub fn per_query_stem(query: &ExtractedQuery) -> String {
    match query.source {
        QuerySource::DataSet => query.name.clone(),
        QuerySource::ValueSet => format!("lv_{}", query.name),
    }
}
