//! Integration tests for the condition engine over an in-memory source.
//!
//! Tables are loaded from JSON dumps the same way the command-line tool
//! loads them.

use std::fs;

use serde_json::json;
use tempfile::tempdir;

use seatable_query::source::{MemorySource, Table};
use seatable_query::{filter, QueryError, RowPatch};

fn dump() -> serde_json::Value {
    json!({
        "name": "Contacts",
        "columns": [
            {"key": "0000", "name": "Name", "type": "text"},
            {"key": "a1", "name": "Age", "type": "number", "data": {"format": "number"}},
            {"key": "b1", "name": "Birthday", "type": "date"},
            {"key": "v1", "name": "VIP", "type": "checkbox"},
            {"key": "t1", "name": "Tags", "type": "multiple-select", "data": {
                "options": [
                    {"id": "o1", "name": "friend", "color": "#aaa"},
                    {"id": "o2", "name": "work"}
                ]
            }},
            {"key": "n1", "name": "Notes", "type": "long-text"}
        ],
        "rows": [
            {"_id": "r1", "Name": "Alice", "Age": 31, "Birthday": "1993-04-01", "VIP": true,
             "Tags": ["friend"], "Notes": "\nlikes tea\n"},
            {"_id": "r2", "Name": "Bob", "Age": 0, "Birthday": "2000-02-29 08:15",
             "Tags": ["work", "friend"]},
            {"_id": "r3", "Name": "Carol", "Age": null, "Tags": []},
            {"_id": "r4", "Name": "Dave", "Age": 45.5, "Birthday": "1978-11-30", "VIP": false,
             "Tags": ["work"], "Notes": {"text": "prefers email"}},
            {"_id": "r5", "Name": "", "Age": 31}
        ]
    })
}

fn load_source() -> MemorySource {
    let dir = tempdir().expect("failed to create temp dir");
    let path = dir.path().join("contacts.json");
    fs::write(&path, dump().to_string()).expect("failed to write dump");

    let contents = fs::read_to_string(&path).expect("failed to read dump");
    let table: Table = serde_json::from_str(&contents).expect("failed to parse dump");
    MemorySource::new().with_table(table)
}

fn ids(source: &MemorySource, conditions: &str) -> Vec<String> {
    filter(source, "Contacts", conditions, None)
        .unwrap()
        .iter()
        .map(|r| r.id().to_string())
        .collect()
}

#[test]
fn test_blank_does_not_match_zero() {
    let source = load_source();
    assert_eq!(ids(&source, "Age = ''"), vec!["r3"]);
    assert_eq!(ids(&source, "Age = 0"), vec!["r2"]);
    assert_eq!(ids(&source, "Age != ''"), vec!["r1", "r2", "r4", "r5"]);
}

#[test]
fn test_numbers_and_dates() {
    let source = load_source();
    assert_eq!(ids(&source, "Age >= 31"), vec!["r1", "r4", "r5"]);
    assert_eq!(ids(&source, "Age < 45.5"), vec!["r1", "r2", "r5"]);
    assert_eq!(ids(&source, "Birthday > '1990-01-01'"), vec!["r1", "r2"]);
    assert_eq!(ids(&source, "Birthday = '2000-02-29 08:15'"), vec!["r2"]);
}

#[test]
fn test_checkbox_and_list_membership() {
    let source = load_source();
    assert_eq!(ids(&source, "VIP = true"), vec!["r1"]);
    assert_eq!(ids(&source, "Tags = friend"), vec!["r1", "r2"]);
    assert_eq!(ids(&source, "Tags = ''"), vec!["r3", "r5"]);
}

#[test]
fn test_long_text_is_normalized() {
    let source = load_source();
    assert_eq!(ids(&source, "Notes = 'likes tea'"), vec!["r1"]);
    assert_eq!(ids(&source, "Notes like 'prefers%'"), vec!["r4"]);
}

#[test]
fn test_like_shapes() {
    let source = load_source();
    assert_eq!(ids(&source, "Name like 'A%'"), vec!["r1"]);
    assert_eq!(ids(&source, "Name like '%e'"), vec!["r1", "r4"]);
    assert_eq!(ids(&source, "Name like '%ro%'"), vec!["r3"]);
    assert_eq!(ids(&source, "Name like 'D%e'"), vec!["r4"]);
}

#[test]
fn test_or_order_follows_left_operand() {
    let source = load_source();
    assert_eq!(ids(&source, "Name = Dave or Age = 31"), vec!["r4", "r1", "r5"]);
    assert_eq!(ids(&source, "Age = 31 or Name = Dave"), vec!["r1", "r5", "r4"]);
}

#[test]
fn test_chained_filters_intersect() {
    let source = load_source();
    let base = filter(&source, "Contacts", "Tags = work", None).unwrap();
    let chained = base.filter("Age > 10").unwrap();
    let single = filter(&source, "Contacts", "Tags = work and Age > 10", None).unwrap();

    let chained_ids: Vec<&str> = chained.iter().map(|r| r.id()).collect();
    let single_ids: Vec<&str> = single.iter().map(|r| r.id()).collect();
    assert_eq!(chained_ids, vec!["r4"]);
    assert_eq!(chained_ids, single_ids);
    assert_eq!(base.count(), 2);
}

#[test]
fn test_update_then_delete_round_trip() {
    let source = load_source();

    let mut seniors = filter(&source, "Contacts", "Age > 40", None).unwrap();
    let mut patch = RowPatch::new();
    patch.insert("VIP".to_string(), json!(true));
    let updated = seniors.update(&patch).unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(ids(&source, "VIP = true"), vec!["r1", "r4"]);

    let mut vips = filter(&source, "Contacts", "VIP = true", None).unwrap();
    assert_eq!(vips.delete().unwrap(), 2);
    assert!(vips.is_empty());
    assert_eq!(ids(&source, ""), vec!["r2", "r3", "r5"]);
}

#[test]
fn test_condition_errors() {
    let source = load_source();
    let err = filter(&source, "Contacts", "Email = x", None).unwrap_err();
    assert_eq!(err.to_string(), "Column not found: Email");

    assert!(matches!(
        filter(&source, "Contacts", "Name > B", None),
        Err(QueryError::UnsupportedComparison { .. })
    ));
    assert!(matches!(
        filter(&source, "Contacts", "Age > ''", None),
        Err(QueryError::AmbiguousComparison { .. })
    ));
    assert!(matches!(
        filter(&source, "Contacts", "VIP = maybe", None),
        Err(QueryError::ValueCoercion { .. })
    ));
    assert!(matches!(
        filter(&source, "Contacts", "Birthday = 'April 1st'", None),
        Err(QueryError::ValueCoercion { .. })
    ));
    assert!(matches!(
        filter(&source, "Contacts", "Name = 'Alice", None),
        Err(QueryError::Syntax(_))
    ));
}
