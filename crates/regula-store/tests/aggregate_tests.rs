//! Aggregation over a folder of record files

use regula_domain::{DecisionStatus, ProblemCategory, RiskLevel};
use regula_store::{aggregate, Aggregator, RuleDatabase, StoreError};
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

fn record(status: &str, category: &str, risk: &str) -> String {
    serde_json::json!({
        "meta": {"event_date": "2022-03-01", "event_time": "08:15", "location": "hala", "injury": "złamanie"},
        "decision": {"status": status, "rejection_reason": "BRAK", "legal_basis_quote": "art. 3 ust. 1"},
        "key_facts": ["upadek z drabiny"],
        "expert_rule": {"condition": "upadek", "logic": "IF upadek THEN uznany BECAUSE nagłość", "problem_category": category},
        "conclusions_for_bot": {"what_to_look_for": "nagłość zdarzenia", "rejection_risk": risk}
    })
    .to_string()
}

fn folder_with(ids: &[u64]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for id in ids {
        fs::write(
            dir.path().join(format!("regula_wypadek_{}.json", id)),
            record("RECOGNIZED", "SUDDENNESS", "LOW"),
        )
        .unwrap();
    }
    dir
}

fn read_database(path: &std::path::Path) -> RuleDatabase {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_excluded_case_left_out() {
    let dir = folder_with(&[1, 2, 3]);
    let output = dir.path().join("out/rules_database.json");
    fs::create_dir_all(output.parent().unwrap()).unwrap();

    let report = aggregate(dir.path(), &output, &BTreeSet::from([2])).unwrap();

    assert_eq!(report.loaded, vec![1, 3]);
    assert_eq!(report.excluded, vec![2]);
    let database = read_database(&output);
    assert_eq!(database.metadata.count, 2);
    assert_eq!(database.metadata.excluded_ids, vec![2]);
    let ids: Vec<u64> = database.records.iter().map(|r| r.case_id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(database.records[0].source_file, "regula_wypadek_1.json");
}

#[test]
fn test_malformed_file_is_reported_not_fatal() {
    let dir = folder_with(&[1, 3]);
    fs::write(dir.path().join("regula_wypadek_2.json"), "{ not json").unwrap();
    fs::write(
        dir.path().join("regula_wypadek_4.json"),
        record("MAYBE", "SUDDENNESS", "LOW"),
    )
    .unwrap();
    let output = dir.path().join("rules_database.json");

    let report = aggregate(dir.path(), &output, &BTreeSet::new()).unwrap();

    assert_eq!(report.loaded, vec![1, 3]);
    let failed: Vec<u64> = report.errors.iter().map(|f| f.case_id).collect();
    assert_eq!(failed, vec![2, 4]);
    assert!(report.errors[0].message.starts_with("Invalid JSON"));
    assert!(report.errors[1].message.contains("decision.status"));
    assert_eq!(read_database(&output).metadata.count, 2);
}

#[test]
fn test_no_records_is_fatal_and_writes_nothing() {
    let dir = folder_with(&[1]);
    let output = dir.path().join("rules_database.json");

    let result = aggregate(dir.path(), &output, &BTreeSet::from([1]));

    assert!(matches!(result, Err(StoreError::NoRecords)));
    assert!(!output.exists());
}

#[test]
fn test_missing_folder_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = aggregate(
        &dir.path().join("nope"),
        &dir.path().join("db.json"),
        &BTreeSet::new(),
    );
    assert!(matches!(result, Err(StoreError::Io { .. })));
}

#[test]
fn test_records_in_numeric_order() {
    let dir = folder_with(&[10, 2, 1]);
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    fs::write(dir.path().join("summary.json"), "{}").unwrap();
    let output = dir.path().join("rules_database.json");

    let report = aggregate(dir.path(), &output, &BTreeSet::new()).unwrap();

    assert_eq!(report.loaded, vec![1, 2, 10]);
    assert!(report.errors.is_empty());
}

#[test]
fn test_statistics_cover_every_value() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("regula_wypadek_1.json"),
        record("RECOGNIZED", "SUDDENNESS", "LOW"),
    )
    .unwrap();
    fs::write(
        dir.path().join("regula_wypadek_2.json"),
        record("NOT_RECOGNIZED", "EXTERNAL_CAUSE", "HIGH"),
    )
    .unwrap();
    fs::write(
        dir.path().join("regula_wypadek_3.json"),
        record("NOT_RECOGNIZED", "EXTERNAL_CAUSE", "HIGH"),
    )
    .unwrap();
    let output = dir.path().join("rules_database.json");

    let report = aggregate(dir.path(), &output, &BTreeSet::new()).unwrap();
    let stats = &report.statistics;

    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_status[&DecisionStatus::NotRecognized], 2);
    assert_eq!(stats.by_category.len(), ProblemCategory::ALL.len());
    assert_eq!(stats.by_category[&ProblemCategory::Intoxication], 0);
    assert_eq!(stats.by_risk[&RiskLevel::Medium], 0);
    assert_eq!(
        stats.categories_by_count()[0],
        (ProblemCategory::ExternalCause, 2)
    );

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(raw["_metadata"]["version"], "1.0");
    assert_eq!(raw["_metadata"]["statistics"]["by_category"]["OTHER"], 0);
    assert_eq!(raw["records"][0]["_case_id"], 1);
    assert_eq!(raw["records"][0]["decision"]["status"], "RECOGNIZED");
}

#[test]
fn test_custom_prefix_aggregator() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("case_7.json"),
        record("RECOGNIZED", "OTHER", "MEDIUM"),
    )
    .unwrap();
    let output = dir.path().join("db.json");

    let report = Aggregator::new("case_")
        .aggregate(dir.path(), &output, &BTreeSet::new())
        .unwrap();

    assert_eq!(report.loaded, vec![7]);
    assert_eq!(report.output, output);
}

#[test]
fn test_zero_padded_name_is_not_a_second_copy() {
    let dir = folder_with(&[7]);
    fs::write(
        dir.path().join("regula_wypadek_007.json"),
        record("REJECTED", "OTHER", "HIGH"),
    )
    .unwrap();
    let output = dir.path().join("rules_database.json");

    let report = aggregate(dir.path(), &output, &BTreeSet::new()).unwrap();

    assert_eq!(report.loaded, vec![7]);
    assert!(report.errors.is_empty());
    let database = read_database(&output);
    assert_eq!(database.records.len(), 1);
    assert_eq!(database.records[0].source_file, "regula_wypadek_7.json");
}
