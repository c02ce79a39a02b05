//! Integration tests for the single-file CSV export

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use unspool::api::TweetMetrics;
use unspool::export::CsvExporter;
use unspool::threads::CondensedTweet;

fn thread(id: &str, text: &str, hour: u32) -> CondensedTweet {
    CondensedTweet {
        id: id.to_string(),
        created_at: Utc.with_ymd_and_hms(2023, 4, 1, hour, 0, 0).unwrap(),
        text: text.to_string(),
        in_reply_to_user_id: None,
        metrics: TweetMetrics::default(),
    }
}

#[test]
fn test_header_then_appended_rows() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tweets.csv");

    let exporter = CsvExporter::new(&path, false);
    exporter.write_header().unwrap();
    exporter
        .append("alice", &[thread("1", "plain text", 10)])
        .unwrap();
    exporter
        .append("bob", &[thread("2", "with, a comma\nand a newline", 11)])
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("date_time,handle,tweet\n"));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "2023-04-01T10:00:00Z");
    assert_eq!(&rows[0][1], "alice");
    assert_eq!(&rows[0][2], "plain text");
    assert_eq!(&rows[1][2], "with, a comma\nand a newline");
}

#[test]
fn test_append_without_overwrite_keeps_existing_rows() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tweets.csv");
    std::fs::write(&path, "date_time,handle,tweet\nold,row,here\n").unwrap();

    let exporter = CsvExporter::new(&path, false);
    exporter.append("alice", &[thread("1", "new row", 10)]).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("old,row,here\n"));
    assert!(content.contains("new row"));
}

#[test]
fn test_overwrite_truncates_before_the_header() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tweets.csv");
    std::fs::write(&path, "stale content\n").unwrap();

    let exporter = CsvExporter::new(&path, false);
    exporter.write_header().unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "date_time,handle,tweet\n"
    );
}

#[test]
fn test_dry_run_touches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tweets.csv");

    let exporter = CsvExporter::new(&path, true);
    exporter.write_header().unwrap();
    exporter.append("alice", &[thread("1", "text", 10)]).unwrap();

    assert!(!path.exists());
}
