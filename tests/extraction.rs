//! End-to-end extraction tests over realistic BI Publisher exports

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use bip_extract::{ArchiveKind, Error, InputArchive, QuerySource, SqlLayout, extract, extract_file};
use common::*;

fn run(
    name: &str,
    bytes: Vec<u8>,
    config: &bip_extract::ExtractionConfig,
) -> bip_extract::Result<bip_extract::Extraction> {
    extract(&InputArchive::new(name, bytes)?, config)
}

#[test]
fn xdmz_with_n_statements_yields_n_blocks_in_order() {
    let (root, config) = isolated_config();
    let xml = datamodel_xml(
        &[
            ("G_HEADERS", "select h.* from headers h"),
            ("G_LINES", "select l.*\n  from lines l\n where l.header_id = :header_id"),
            ("G_TAXES", "select * from taxes"),
        ],
        &[("LOV_BU", "select bu_id, bu_name from bus"), ("LOV_LEDGER", "select 1 from dual")],
    );

    let result = run("AP Invoices.xdmz", xdmz("AP Invoices", &xml), &config).unwrap();

    assert_eq!(result.archive.file_name, "AP_Invoices_OUT.zip");
    assert_eq!(entry_names(&result.archive.bytes), vec!["AP_Invoices.sql"]);

    let sql = String::from_utf8(read_entry(&result.archive.bytes, "AP_Invoices.sql")).unwrap();
    let headers: Vec<&str> = sql.lines().filter(|l| l.starts_with("-- ")).collect();
    assert_eq!(
        headers,
        vec![
            "-- dataSet: G_HEADERS",
            "-- dataSet: G_LINES",
            "-- dataSet: G_TAXES",
            "-- valueSet: LOV_BU",
            "-- valueSet: LOV_LEDGER",
        ]
    );
    assert!(sql.contains("select l.*\n  from lines l\n where l.header_id = :header_id\n"));

    let summary = &result.summary;
    assert_eq!(summary.kind, ArchiveKind::Xdmz);
    assert_eq!(summary.query_count(), 5);
    assert_eq!(summary.datamodels[0].queries[3].source, QuerySource::ValueSet);
    assert_eq!(residue(&root), 0);
}

#[test]
fn xdmz_without_sql_elements_yields_empty_sql_file() {
    let (_root, config) = isolated_config();

    let result = run("Empty.xdmz", xdmz("Empty", &datamodel_xml(&[], &[])), &config).unwrap();

    assert_eq!(entry_names(&result.archive.bytes), vec!["Empty.sql"]);
    assert!(read_entry(&result.archive.bytes, "Empty.sql").is_empty());
    assert_eq!(result.summary.query_count(), 0);
}

#[test]
fn sql_header_is_written_on_top() {
    let (_root, mut config) = isolated_config();
    config.sql_header = Some("extracted by bip-extract".to_string());

    let xml = datamodel_xml(&[("Q", "select 1 from dual")], &[]);
    let result = run("M.xdmz", xdmz("M", &xml), &config).unwrap();

    let sql = String::from_utf8(read_entry(&result.archive.bytes, "M.sql")).unwrap();
    assert_eq!(
        sql,
        "-- extracted by bip-extract\n\n-- dataSet: Q\nselect 1 from dual\n"
    );
}

#[test]
fn xdoz_keeps_only_allow_listed_templates_byte_identical() {
    let (root, config) = isolated_config();
    let rtf: &[u8] = b"{\\rtf1\\ansi Invoice}";
    let xlsx: &[u8] = &[0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0x06, 0x00, 0x08, 0x00];
    let bytes = xdoz(
        "Invoice",
        "/Custom/Finance/Invoices.xdm",
        &[
            ("Invoice.rtf", rtf),
            ("Invoice.xlsx", xlsx),
            ("Invoice.xsl", b"<xsl:stylesheet/>"),
            ("Invoice.pdf", b"%PDF-1.4"),
            ("_report.xdo.meta", b"<meta/>"),
            ("thumbnail.png", b"\x89PNG"),
        ],
    );

    let result = run("Invoice.xdoz", bytes, &config).unwrap();

    assert_eq!(
        entry_names(&result.archive.bytes),
        vec![
            "templates/Invoice.rtf",
            "templates/Invoice.xlsx",
            "templates/Invoice.xsl",
        ]
    );
    assert_eq!(read_entry(&result.archive.bytes, "templates/Invoice.rtf"), rtf);
    assert_eq!(read_entry(&result.archive.bytes, "templates/Invoice.xlsx"), xlsx);
    assert_eq!(
        result.summary.referenced_datamodels,
        vec!["/Custom/Finance/Invoices.xdm"]
    );
    assert_eq!(residue(&root), 0);
}

#[test]
fn xdoz_duplicate_template_name_last_in_archive_order_wins() {
    let (_root, config) = isolated_config();
    let bytes = zip_bytes(&[
        ("Report/v1/Layout.rtf", b"older layout"),
        ("Report/v2/Layout.rtf", b"newer layout"),
    ]);

    let result = run("Report.xdoz", bytes, &config).unwrap();

    assert_eq!(entry_names(&result.archive.bytes), vec!["templates/Layout.rtf"]);
    assert_eq!(
        read_entry(&result.archive.bytes, "templates/Layout.rtf"),
        b"newer layout"
    );
    assert_eq!(result.summary.templates.len(), 1);
    assert_eq!(result.summary.templates[0].size, 12);
}

#[test]
fn xdrz_with_two_datamodels_yields_two_sql_files() {
    let (root, config) = isolated_config();
    let orders = xdmz("Orders", &datamodel_xml(&[("ORDERS", "select * from orders")], &[]));
    let customers = xdmz(
        "Customers",
        &datamodel_xml(&[("CUSTOMERS", "select * from customers")], &[("LOV_REGION", "select 1")]),
    );
    let report = xdoz(
        "OrderReport",
        "/Shared/Orders.xdm",
        &[("OrderReport.rtf", b"{\\rtf1}")],
    );
    let bytes = zip_bytes(&[
        ("Shared/", b""),
        ("Shared/Orders.xdmz", orders.as_slice()),
        ("Shared/Customers.xdmz", customers.as_slice()),
        ("Shared/OrderReport.xdoz", report.as_slice()),
        ("Shared/_folder.meta", b"<meta/>"),
    ]);

    let result = run("Shared.xdrz", bytes, &config).unwrap();

    assert_eq!(
        entry_names(&result.archive.bytes),
        vec!["Customers.sql", "Orders.sql", "templates/OrderReport.rtf"]
    );
    let summary = &result.summary;
    assert_eq!(summary.kind, ArchiveKind::Xdrz);
    assert_eq!(summary.datamodels.len(), 2);
    assert_eq!(summary.datamodels[0].archive, "Shared/Orders.xdmz");
    assert_eq!(summary.datamodels[1].artifacts, vec!["Customers.sql"]);
    assert_eq!(summary.query_count(), 3);
    assert_eq!(summary.referenced_datamodels, vec!["/Shared/Orders.xdm"]);
    assert_eq!(summary.entries, entry_names(&result.archive.bytes));
    assert_eq!(residue(&root), 0);
}

#[test]
fn xdrz_per_query_layout_nests_each_datamodel() {
    let (_root, mut config) = isolated_config();
    config.sql_layout = SqlLayout::PerQuery;
    let first = xdmz("A", &datamodel_xml(&[("Q1", "select 1")], &[("V1", "select 2")]));
    let second = xdmz("B", &datamodel_xml(&[("Q2", "select 3")], &[]));
    let bytes = zip_bytes(&[("A.xdmz", first.as_slice()), ("B.xdmz", second.as_slice())]);

    let result = run("Bundle.xdrz", bytes, &config).unwrap();

    assert_eq!(
        entry_names(&result.archive.bytes),
        vec!["A/Q1.sql", "A/lv_V1.sql", "B/Q2.sql"]
    );
    assert_eq!(read_entry(&result.archive.bytes, "B/Q2.sql"), b"select 3\n");
}

#[test]
fn unsupported_extension_fails_without_leaving_anything() {
    let (root, config) = isolated_config();

    let err = run("export.zip", zip_bytes(&[("a.rtf", b"x")]), &config).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));
    assert_eq!(residue(&root), 0);
}

#[test]
fn failing_inner_datamodel_fails_whole_xdrz_and_cleans_up() {
    let (root, config) = isolated_config();
    let good = xdmz("Good", &datamodel_xml(&[("Q", "select 1")], &[]));
    let broken = xdmz("Broken", "<dataModel><dataSets><dataSet name=\"X\">");
    let bytes = zip_bytes(&[("Good.xdmz", good.as_slice()), ("Broken.xdmz", broken.as_slice())]);

    match run("Mixed.xdrz", bytes, &config) {
        Err(Error::InvalidXml { member, .. }) => {
            assert_eq!(member, "Broken/Broken_datamodel.xdm");
        }
        other => panic!("expected InvalidXml, got {other:?}"),
    }
    assert_eq!(residue(&root), 0);
}

#[test]
fn corrupt_inner_archive_is_reported_by_member_name() {
    let (root, config) = isolated_config();
    let bytes = zip_bytes(&[("Reports/Broken.xdoz", b"not a zip at all")]);

    match run("Reports.xdrz", bytes, &config) {
        Err(Error::CorruptArchive { archive, .. }) => {
            assert_eq!(archive, "Reports/Broken.xdoz");
        }
        other => panic!("expected CorruptArchive, got {other:?}"),
    }
    assert_eq!(residue(&root), 0);
}

#[test]
fn xdrz_with_nothing_relevant_packages_empty_zip() {
    let (_root, config) = isolated_config();
    let bytes = zip_bytes(&[("readme.txt", b"nothing to see"), ("docs/", b"")]);

    let result = run("Nothing.xdrz", bytes, &config).unwrap();

    assert!(entry_names(&result.archive.bytes).is_empty());
    assert!(result.summary.entries.is_empty());
}

#[test]
fn extract_file_reads_upload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Disk Model.xdmz");
    std::fs::write(
        &path,
        xdmz("Disk", &datamodel_xml(&[("Q", "select sysdate from dual")], &[])),
    )
    .unwrap();
    let (_root, config) = isolated_config();

    let result = extract_file(&path, &config).unwrap();

    assert_eq!(result.archive.file_name, "Disk_Model_OUT.zip");
    assert_eq!(entry_names(&result.archive.bytes), vec!["Disk_Model.sql"]);
}

#[test]
fn concurrent_extractions_do_not_interfere() {
    let (root, config) = isolated_config();
    let config = std::sync::Arc::new(config);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let config = config.clone();
            std::thread::spawn(move || {
                let sql = format!("select {i} from dual");
                let xml = datamodel_xml(&[("Q", sql.as_str())], &[]);
                let result = run("Same.xdmz", xdmz("Same", &xml), &config).unwrap();
                let body = String::from_utf8(read_entry(&result.archive.bytes, "Same.sql")).unwrap();
                assert!(body.contains(&sql));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(residue(&root), 0);
}
