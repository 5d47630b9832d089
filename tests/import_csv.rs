use rosterd::import::{import_file, read_table};
use rosterd::store::{ClassKey, RosterStore};
use rosterd::RosterError;
use std::path::PathBuf;

fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let p = dir.path().join(name);
    std::fs::write(&p, body).expect("write fixture");
    p
}

#[test]
fn csv_scenario_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(
        &dir,
        "roster.csv",
        "Name,StudentID,Class\r\nAlice,S1,10A\r\nBob,S2,10A\r\nCarol,S3,10B\r\n",
    );
    let mut store = RosterStore::open_in_memory().unwrap();

    let summary = import_file(&mut store, &csv).expect("import");
    assert_eq!(summary.imported, 3);
    assert_eq!(summary.classes_created, vec!["10A", "10B"]);
    assert!(summary.skipped.is_empty());

    assert_eq!(store.list_classes().unwrap().len(), 2);
    assert_eq!(store.count_students().unwrap(), 3);
    let a = store.class_id("10A").unwrap().unwrap();
    assert_eq!(store.count_students_in_class(a).unwrap(), 2);
}

#[test]
fn utf8_export_with_byte_order_mark_imports() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(
        &dir,
        "excel-export.csv",
        "\u{FEFF}Name,StudentID,Class\r\nAlice,S1,10A\r\nBob,S2,10B\r\n",
    );
    let mut store = RosterStore::open_in_memory().unwrap();

    let summary = import_file(&mut store, &csv).expect("BOM-prefixed csv imports");
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.classes_created, vec!["10A", "10B"]);
    assert_eq!(store.search_students("Alice").unwrap()[0].class_name, "10A");
}

#[test]
fn quoted_names_and_malformed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(
        &dir,
        "ROSTER.CSV",
        "Name,StudentID,Class\n\"Doe, Jane\",S100,10A\nshort,row\n\n  Lee , S101 , 10A  \n",
    );
    let mut store = RosterStore::open_in_memory().unwrap();

    let summary = import_file(&mut store, &csv).unwrap();
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].line, 3);

    let names: Vec<_> = store
        .students_in_class(ClassKey::Name("10A"))
        .unwrap()
        .into_iter()
        .map(|s| (s.name, s.student_id))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Doe, Jane".to_string(), "S100".to_string()),
            ("Lee".to_string(), "S101".to_string()),
        ]
    );
}

#[test]
fn missing_required_column_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(&dir, "roster.csv", "Name,Class\nAlice,10A\n");
    let mut store = RosterStore::open_in_memory().unwrap();

    let err = import_file(&mut store, &csv).unwrap_err();
    match err {
        RosterError::MissingColumns { missing, .. } => assert_eq!(missing, vec!["StudentID"]),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(store.count_students().unwrap(), 0);
    assert!(store.list_classes().unwrap().is_empty());
}

#[test]
fn duplicate_in_file_rolls_back_whole_import() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(
        &dir,
        "roster.csv",
        "Name,StudentID,Class\nAlice,S1,10A\nBob,S1,10B\n",
    );
    let mut store = RosterStore::open_in_memory().unwrap();

    assert!(import_file(&mut store, &csv).is_err());
    assert_eq!(store.count_students().unwrap(), 0);
    assert!(store.list_classes().unwrap().is_empty());
}

#[test]
fn xlsx_answers_with_conversion_guidance() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx = write_file(&dir, "roster.xlsx", "PK-not-really");
    let mut store = RosterStore::open_in_memory().unwrap();

    let err = import_file(&mut store, &xlsx).unwrap_err();
    assert!(matches!(err, RosterError::UnsupportedFormat(_)));
    assert!(err.to_string().contains("CSV"));
    assert_eq!(store.count_students().unwrap(), 0);
}

#[test]
fn unreadable_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone.csv");
    let err = read_table(&missing).unwrap_err();
    assert_eq!(err.code(), "io_error");
    assert!(err.to_string().contains("gone.csv"));
}
