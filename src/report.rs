//! Report definition (`*.xdo`) lookup inside report bundles
//!
//! Only used to tell the caller which data model a report points at; nothing here can
//! fail a request.

use crate::archive::{ArchiveReader, is_directory};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};

/// Pick the report definition member: `report.xdo`/`*_report.xdo` first, then any `.xdo`,
/// preferring the shallowest and then shortest name
pub fn find_report_definition(names: &[String]) -> Option<&str> {
    let by_suffix = |suffix: &str| -> Vec<&str> {
        names
            .iter()
            .filter(|n| !is_directory(n) && n.to_lowercase().ends_with(suffix))
            .map(String::as_str)
            .collect()
    };

    let mut candidates = by_suffix("report.xdo");
    if candidates.is_empty() {
        candidates = by_suffix(".xdo");
    }

    candidates
        .into_iter()
        .min_by_key(|n| (n.matches('/').count(), n.len()))
}

/// `url` attribute of the first `dataModel` element in a report definition
pub fn parse_datamodel_url(xml: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"dataModel" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"url" {
                        return Ok(Some(attr.unescape_value()?.into_owned()));
                    }
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Data model URL referenced by the report bundle behind `reader`, if one can be found
pub fn referenced_datamodel(reader: &mut ArchiveReader<'_>) -> Option<String> {
    let member = find_report_definition(reader.names())?.to_string();

    let bytes = match reader.read(&member) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(archive = %reader.label(), member = %member, error = %e, "failed to read report definition");
            return None;
        }
    };

    match parse_datamodel_url(&bytes) {
        Ok(url) => {
            debug!(archive = %reader.label(), member = %member, ?url, "read report definition");
            url
        }
        Err(e) => {
            warn!(archive = %reader.label(), member = %member, error = %e, "failed to parse report definition");
            None
        }
    }
}
