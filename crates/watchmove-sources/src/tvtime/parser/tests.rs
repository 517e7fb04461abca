use super::*;
use chrono::TimeZone;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "uuid,entity_type,movie_name,type-uuid-n,created_at,updated_at";

fn create_export_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

#[test]
fn test_parse_tracking_csv() {
    let file = create_export_csv(&[
        "0b1c-uuid-shining,movie,The Shining,watch-0b1c,2020-09-21 02:17:20,2020-09-21 02:17:20",
        "77aa-uuid-alien,movie,Alien,watch-77aa,2021-03-04 19:00:00,2021-03-04 19:00:00",
    ]);

    let export = parse_tracking_csv(file.path()).unwrap();

    assert_eq!(export.rows_read, 2);
    assert_eq!(export.records.len(), 2);
    assert!(export.skipped.is_empty());
    assert_eq!(export.records[0].title, "The Shining");
    assert_eq!(export.records[0].external_id.as_deref(), Some("0b1c-uuid-shining"));
    assert_eq!(
        export.records[0].watched_at,
        Utc.with_ymd_and_hms(2020, 9, 21, 2, 17, 20).unwrap()
    );
    assert_eq!(export.records[0].row, 1);
    assert_eq!(export.records[1].row, 2);
}

#[test]
fn test_parse_tracking_csv_skips_shows_and_non_watch_rows() {
    let file = create_export_csv(&[
        "1,series,Dark,watch-1,2020-01-01 10:00:00,",
        "2,movie,Heat,follow-2,2020-01-02 10:00:00,",
        "3,movie,Ronin,watch-3,2020-01-03 10:00:00,",
    ]);

    let export = parse_tracking_csv(file.path()).unwrap();

    assert_eq!(export.records.len(), 1);
    assert_eq!(export.records[0].title, "Ronin");
    assert_eq!(export.skipped.len(), 2);
    assert_eq!(
        export.skipped[0].reason,
        SkipReason::NotAMovie { entity_type: "series".to_string() }
    );
    assert_eq!(
        export.skipped[1].reason,
        SkipReason::NotWatched { kind: "follow-2".to_string() }
    );
    assert_eq!(export.skipped[1].title.as_deref(), Some("Heat"));
}

#[test]
fn test_parse_tracking_csv_malformed_rows_do_not_abort() {
    let file = create_export_csv(&[
        "1,movie,Heat,watch-1,not a date,",
        "2,movie,Short,watch-2",
        ",movie,,watch-x,2020-01-01 10:00:00,",
        "4,movie,Ronin,watch-4,2020-01-03 10:00:00,",
    ]);

    let export = parse_tracking_csv(file.path()).unwrap();

    assert_eq!(export.rows_read, 4);
    assert_eq!(export.records.len(), 1);
    assert_eq!(export.records[0].title, "Ronin");
    assert_eq!(export.skipped.len(), 3);
    assert!(export
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::Malformed { .. })));
}

#[test]
fn test_parse_tracking_csv_untitled_row_with_uuid() {
    let file = create_export_csv(&["abc,movie,,watch-abc,2020-01-01 10:00:00,"]);

    let export = parse_tracking_csv(file.path()).unwrap();

    assert_eq!(export.records.len(), 1);
    assert_eq!(export.records[0].title, "(no title)");
    assert_eq!(export.records[0].external_id.as_deref(), Some("abc"));
}

#[test]
fn test_parse_tracking_csv_missing_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "uuid,movie_name").unwrap();
    writeln!(file, "1,Heat").unwrap();

    let result = parse_tracking_csv(file.path());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Missing required column"));
}

#[test]
fn test_parse_tracking_csv_header_only_and_empty_file() {
    let file = create_export_csv(&[]);
    let export = parse_tracking_csv(file.path()).unwrap();
    assert_eq!(export.rows_read, 0);
    assert!(export.records.is_empty());

    let empty = NamedTempFile::new().unwrap();
    let export = parse_tracking_csv(empty.path()).unwrap();
    assert!(export.records.is_empty());
}

#[test]
fn test_parse_tracking_csv_with_bom_and_minimal_columns() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "\u{feff}movie_name,created_at\n").unwrap();
    writeln!(file, "Amélie,2019-05-05 21:30:00").unwrap();

    let export = parse_tracking_csv(file.path()).unwrap();

    assert_eq!(export.records.len(), 1);
    assert_eq!(export.records[0].title, "Amélie");
    assert_eq!(export.records[0].external_id, None);
}

#[test]
fn test_parse_tracking_csv_missing_file() {
    let result = parse_tracking_csv("/nonexistent/tracking-prod-records.csv");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to open export file"));
}

#[test]
fn test_parse_watched_at_formats() {
    let expected = Utc.with_ymd_and_hms(2020, 9, 21, 2, 17, 20).unwrap();
    assert_eq!(parse_watched_at("2020-09-21 02:17:20"), Some(expected));
    assert_eq!(parse_watched_at("2020-09-21T02:17:20Z"), Some(expected));
    assert_eq!(parse_watched_at("2020-09-21T04:17:20+02:00"), Some(expected));
    assert!(parse_watched_at("2020-09-21 02:17:20.250").is_some());
    assert_eq!(parse_watched_at(""), None);
    assert_eq!(parse_watched_at("21/09/2020"), None);
}
