use super::*;
use crate::export::render_payload;
use crate::testing::FakeProvider;
use chrono::{TimeZone, Utc};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};
use watchmove_models::{AmbiguityPolicy, PayloadLayout, UNTITLED};
use watchmove_sources::parse_tracking_csv;

fn record(title: &str, uuid: Option<&str>, day: u32, row: usize) -> WatchRecord {
    WatchRecord {
        title: title.to_string(),
        external_id: uuid.map(str::to_string),
        watched_at: Utc.with_ymd_and_hms(2022, 3, day, 21, 0, 0).unwrap(),
        row,
    }
}

fn converter(providers: Vec<FakeProvider>) -> Converter {
    let providers = providers.into_iter().map(FakeProvider::boxed).collect();
    Converter::new(
        IdLookupService::new(providers, AmbiguityPolicy::Skip),
        ConversionOptions::default(),
    )
}

#[tokio::test]
async fn test_fixture_round_trip_is_deterministic() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "uuid,entity_type,movie_name,type-uuid-n,created_at").unwrap();
    writeln!(file, "u-shining,movie,The Shining,watch-1,2020-09-21 02:17:20").unwrap();
    writeln!(file, "u-alien,movie,Alien,watch-2,2021-01-02 20:00:00").unwrap();
    writeln!(file, "u-shining,movie,The Shining,watch-3,2021-10-31 22:45:00").unwrap();

    let export = parse_tracking_csv(file.path()).unwrap();
    assert_eq!(export.records.len(), 3);

    let tvtime = FakeProvider::exact("tvtime", 90)
        .with_hits("u-shining", "The Shining", &["tt0081505"])
        .with_hits("u-alien", "Alien", &["tt0078748"]);

    let first = converter(vec![tvtime]).run(&export.records).await;
    let json = render_payload(&first.payload, PayloadLayout::Grouped).unwrap();

    let expected = r#"[
  {
    "id": "tt0081505",
    "title": "The Shining",
    "watched_at": [
      "2020-09-21T02:17:20Z",
      "2021-10-31T22:45:00Z"
    ]
  },
  {
    "id": "tt0078748",
    "title": "Alien",
    "watched_at": [
      "2021-01-02T20:00:00Z"
    ]
  }
]"#;
    assert_eq!(json, expected);
    assert_eq!(first.report.groups, 2);
    assert_eq!(first.report.resolved, 2);
    assert!(first.report.fallback.is_empty());

    let tvtime = FakeProvider::exact("tvtime", 90)
        .with_hits("u-shining", "The Shining", &["tt0081505"])
        .with_hits("u-alien", "Alien", &["tt0078748"]);
    let second = converter(vec![tvtime]).run(&export.records).await;
    assert_eq!(render_payload(&second.payload, PayloadLayout::Grouped).unwrap(), json);
}

#[tokio::test]
async fn test_no_records_gives_empty_payload() {
    let result = converter(vec![FakeProvider::search("imdb", 50)]).run(&[]).await;

    assert!(result.payload.is_empty());
    assert_eq!(result.report, ConversionReport::default());
    assert_eq!(render_payload(&result.payload, PayloadLayout::Grouped).unwrap(), "[]");
}

#[tokio::test]
async fn test_one_failed_lookup_does_not_stop_the_rest() {
    let search = FakeProvider::search("imdb", 50)
        .with_failure("Heat", 503)
        .with_hits("Alien", "Alien", &["tt0078748"])
        .with_hits("Ronin", "Ronin", &["tt0122690"]);
    let records = vec![
        record("Alien", None, 1, 1),
        record("Heat", None, 2, 2),
        record("Ronin", None, 3, 3),
    ];

    let result = converter(vec![search]).run(&records).await;

    let ids: Vec<&str> = result.payload.movies.iter().map(|m| m.imdb_id.as_str()).collect();
    assert_eq!(ids, vec!["tt0078748", "tt0122690"]);
    assert_eq!(result.report.unresolved.len(), 1);
    assert_eq!(result.report.unresolved[0].title, "Heat");
    assert!(matches!(result.report.unresolved[0].reason, UnresolvedReason::LookupFailed { .. }));
    assert_eq!(result.report.fallback.len(), 2);
}

#[tokio::test]
async fn test_ambiguous_title_is_skipped() {
    let search = FakeProvider::search("imdb", 50).with_hits("Heat", "Heat", &["tt0113277", "tt2404463"]);
    let records = vec![record("Heat", None, 1, 1), record("Heat", None, 2, 2)];

    let result = converter(vec![search]).run(&records).await;

    assert!(result.payload.is_empty());
    assert_eq!(result.report.unresolved.len(), 1);
    assert_eq!(result.report.unresolved_events(), 2);
    assert_eq!(result.report.unresolved[0].reason.category(), "ambiguous");
}

#[tokio::test]
async fn test_groups_with_same_id_are_merged_and_repeats_collapsed() {
    let tvtime = FakeProvider::exact("tvtime", 90).with_hits("u1", "Heat", &["tt0113277"]);
    let search = FakeProvider::search("imdb", 50).with_hits("heat", "Heat", &["tt0113277"]);
    let records = vec![
        record("Heat", Some("u1"), 1, 1),
        record("heat", None, 2, 2),
        record("Heat", Some("u1"), 1, 3),
        record("heat", None, 5, 4),
    ];

    let result = converter(vec![tvtime, search]).run(&records).await;

    assert_eq!(result.payload.movies.len(), 1);
    let movie = &result.payload.movies[0];
    assert_eq!(movie.title, "Heat");
    assert_eq!(movie.resolved_by, "tvtime");
    assert_eq!(movie.watched_at.len(), 3);
    assert!(movie.watched_at.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(result.report.duplicate_events, 1);
    assert_eq!(result.report.groups, 1);
    assert_eq!(result.payload.event_count(), 3);
}

#[tokio::test]
async fn test_title_only_watch_joins_the_page_resolved_movie() {
    let tvtime = FakeProvider::exact("tvtime", 90).with_hits("u1", "Heat", &["tt0113277"]);
    let search = FakeProvider::search("imdb", 50).with_hits("Heat", "Heat", &["tt0113277", "tt2404463"]);
    let search_calls = search.calls();
    let records = vec![record("Heat", Some("u1"), 1, 1), record("Heat", None, 2, 2)];

    let result = converter(vec![tvtime, search]).run(&records).await;

    assert_eq!(result.payload.movies.len(), 1);
    assert_eq!(result.payload.event_count(), 2);
    assert!(result.report.unresolved.is_empty());
    assert!(search_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_untitled_record_only_uses_page_lookup() {
    let tvtime = FakeProvider::exact("tvtime", 90);
    let search = FakeProvider::search("imdb", 50);
    let search_calls = search.calls();
    let records = vec![record(UNTITLED, Some("u9"), 1, 1)];

    let result = converter(vec![tvtime, search]).run(&records).await;

    assert!(search_calls.lock().unwrap().is_empty());
    assert_eq!(result.report.unresolved.len(), 1);
    assert_eq!(
        result.report.unresolved[0].source_url.as_deref(),
        Some("https://www.tvtime.com/movie/u9")
    );
}

#[tokio::test]
async fn test_cache_skips_lookups_and_stores_new_ids() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.json");

    let tvtime = FakeProvider::exact("tvtime", 90).with_hits("u1", "Heat", &["tt0113277"]);
    let mut converter = Converter::new(
        IdLookupService::new(vec![tvtime.boxed()], AmbiguityPolicy::Skip),
        ConversionOptions {
            cache: Some(ResolutionCache::load(&cache_path)),
            ..Default::default()
        },
    );
    let records = vec![record("Heat", Some("u1"), 1, 1)];
    let result = converter.run(&records).await;
    assert_eq!(result.report.cache_hits, 0);
    assert!(converter.save_cache().unwrap());

    let tvtime = FakeProvider::exact("tvtime", 90);
    let calls = tvtime.calls();
    let mut converter = Converter::new(
        IdLookupService::new(vec![tvtime.boxed()], AmbiguityPolicy::Skip),
        ConversionOptions {
            cache: Some(ResolutionCache::load(&cache_path)),
            ..Default::default()
        },
    );
    let result = converter.run(&records).await;

    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(result.report.cache_hits, 1);
    assert_eq!(result.payload.movies[0].imdb_id.as_str(), "tt0113277");
    assert_eq!(result.payload.movies[0].resolved_by, "cache");
    assert!(!converter.save_cache().unwrap());
}

#[tokio::test]
async fn test_progress_callback_sees_every_movie() {
    let seen: Arc<Mutex<Vec<(usize, usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let search = FakeProvider::search("imdb", 50).with_hits("Alien", "Alien", &["tt0078748"]);

    let mut converter = converter(vec![search]).with_progress(Box::new(move |current: usize, total: usize, title: &str| {
        sink.lock().unwrap().push((current, total, title.to_string()));
    }));
    converter
        .run(&[record("Alien", None, 1, 1), record("Heat", None, 2, 2)])
        .await;

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![(1, 2, "Alien".to_string()), (2, 2, "Heat".to_string())]
    );
}
