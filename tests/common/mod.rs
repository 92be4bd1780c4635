//! Common fixture builders for bip-extract integration tests

#![allow(dead_code)]

use bip_extract::ExtractionConfig;
use std::io::{Cursor, Read, Write};
use tempfile::TempDir;
use zip::write::FileOptions;

/// Build an in-memory ZIP from `(name, content)` pairs, in order
///
/// Names ending in `/` become directory entries.
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Datamodel XML with the given `(name, sql)` datasets and `(id, sql)` valuesets
pub fn datamodel_xml(datasets: &[(&str, &str)], valuesets: &[(&str, &str)]) -> String {
    let mut xml = String::from(
        "<?xml version = '1.0' encoding = 'utf-8'?>\n\
         <dataModel xmlns=\"http://xmlns.oracle.com/oxp/xmlp\" version=\"2.0\">\n\
         <dataSets>\n",
    );
    for (name, sql) in datasets {
        xml.push_str(&format!(
            "<dataSet name=\"{name}\" type=\"complex\">\n\
             <sql dataSourceRef=\"demo\"><![CDATA[{sql}]]></sql>\n\
             </dataSet>\n"
        ));
    }
    xml.push_str("</dataSets>\n<valueSets>\n");
    for (id, sql) in valuesets {
        xml.push_str(&format!(
            "<valueSet id=\"{id}\" type=\"sql\">\n\
             <sql dataSourceRef=\"demo\"><![CDATA[{sql}]]></sql>\n\
             </valueSet>\n"
        ));
    }
    xml.push_str("</valueSets>\n</dataModel>\n");
    xml
}

/// A `.xdmz` laid out the way BI Publisher exports it
pub fn xdmz(model: &str, xml: &str) -> Vec<u8> {
    let dir = format!("{model}/");
    let member = format!("{model}/{model}_datamodel.xdm");
    let meta = format!("{model}/_datamodel.xdm.meta");
    let files: [(&str, &[u8]); 3] = [
        (dir.as_str(), b""),
        (member.as_str(), xml.as_bytes()),
        (meta.as_str(), b"<meta/>"),
    ];
    zip_bytes(&files)
}

/// A `.xdoz` with a report definition plus the given layout files
pub fn xdoz(report: &str, datamodel_url: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let definition = format!(
        "<report xmlns=\"http://xmlns.oracle.com/oxp/xmlp\" version=\"2.0\">\n\
         <dataModel url=\"{datamodel_url}\"/>\n\
         </report>\n"
    );
    let definition_name = format!("{report}/{report}_report.xdo");

    let mut entries: Vec<(String, Vec<u8>)> =
        vec![(definition_name, definition.into_bytes())];
    for (name, content) in files {
        entries.push((format!("{report}/{name}"), content.to_vec()));
    }

    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_slice()))
        .collect();
    zip_bytes(&borrowed)
}

/// Extraction config whose working directories land in a fresh root
pub fn isolated_config() -> (TempDir, ExtractionConfig) {
    let root = tempfile::tempdir().unwrap();
    let config = ExtractionConfig {
        work_root: Some(root.path().to_path_buf()),
        ..Default::default()
    };
    (root, config)
}

/// Number of entries left directly under `dir`
pub fn residue(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

/// Entry names of a ZIP, in archive order
pub fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Contents of one ZIP entry
pub fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    out
}
