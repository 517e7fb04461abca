use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};
use watchmove_models::{SkipReason, SkippedRecord, WatchRecord, UNTITLED};

const COL_TITLE: &str = "movie_name";
const COL_CREATED: &str = "created_at";
const COL_ENTITY_TYPE: &str = "entity_type";
const COL_UUID: &str = "uuid";
const COL_KIND: &str = "type-uuid-n";

const MOVIE_ENTITY: &str = "movie";
const WATCH_PREFIX: &str = "watch-";

/// Rows of a TV Time `tracking-prod-records.csv` export, split into usable
/// watch events and everything that was skipped.
#[derive(Debug, Default)]
pub struct ParsedExport {
    pub records: Vec<WatchRecord>,
    pub skipped: Vec<SkippedRecord>,
    pub rows_read: usize,
}

/// Parse a TV Time tracking export (movie watch history).
///
/// Only structural problems with the file itself are errors; bad rows are
/// reported in [`ParsedExport::skipped`] and the rest of the file is still read.
pub fn parse_tracking_csv<P: AsRef<Path>>(path: P) -> Result<ParsedExport> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open export file {}", path.display()))?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    let mut export = ParsedExport::default();

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header from {}", path.display()))?
        .clone();
    if headers.is_empty() {
        warn!("Export file {} is empty", path.display());
        return Ok(export);
    }

    // A leading BOM would otherwise end up glued to the first column name
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_string(), i))
        .collect();

    let available_columns: Vec<&str> = headers.iter().collect();
    debug!("Available export CSV columns: {:?}", available_columns);

    for col in [COL_TITLE, COL_CREATED] {
        if !header_map.contains_key(col) {
            return Err(anyhow!(
                "Missing required column: {}. Available columns: {:?}",
                col,
                available_columns
            ));
        }
    }
    for col in [COL_ENTITY_TYPE, COL_KIND] {
        if !header_map.contains_key(col) {
            warn!("CSV missing '{}' column - every row will be treated as a watched movie", col);
        }
    }

    let columns = Columns {
        title: header_map[COL_TITLE],
        created: header_map[COL_CREATED],
        entity_type: header_map.get(COL_ENTITY_TYPE).copied(),
        uuid: header_map.get(COL_UUID).copied(),
        kind: header_map.get(COL_KIND).copied(),
    };

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        export.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row, "Skipping unreadable CSV row: {}", e);
                export.skipped.push(SkippedRecord {
                    row,
                    title: None,
                    external_id: None,
                    reason: SkipReason::Malformed { detail: e.to_string() },
                });
                continue;
            }
        };

        match parse_row(&record, &columns, row) {
            Ok(watch) => {
                if export.records.len() < 5 {
                    debug!(
                        row,
                        title = %watch.title,
                        uuid = ?watch.external_id,
                        watched_at = %watch.watched_at,
                        "Adding watch record from CSV"
                    );
                }
                export.records.push(watch);
            }
            Err(skipped) => {
                match &skipped.reason {
                    SkipReason::Malformed { .. } => {
                        warn!(row, title = ?skipped.title, "Skipping row: {}", skipped.reason)
                    }
                    _ => debug!(row, title = ?skipped.title, "Skipping row: {}", skipped.reason),
                }
                export.skipped.push(skipped);
            }
        }
    }

    tracing::info!(
        "Parsed {} total rows, {} movie watch events, {} skipped",
        export.rows_read,
        export.records.len(),
        export.skipped.len()
    );
    Ok(export)
}

struct Columns {
    title: usize,
    created: usize,
    entity_type: Option<usize>,
    uuid: Option<usize>,
    kind: Option<usize>,
}

fn field<'r>(record: &'r StringRecord, index: Option<usize>) -> &'r str {
    index.and_then(|i| record.get(i)).unwrap_or("").trim()
}

fn parse_row(record: &StringRecord, columns: &Columns, row: usize) -> Result<WatchRecord, SkippedRecord> {
    let title = field(record, Some(columns.title));
    let uuid = field(record, columns.uuid);
    let skip = |reason: SkipReason| SkippedRecord {
        row,
        title: (!title.is_empty()).then(|| title.to_string()),
        external_id: (!uuid.is_empty()).then(|| uuid.to_string()),
        reason,
    };

    let entity_type = field(record, columns.entity_type);
    if columns.entity_type.is_some() && entity_type != MOVIE_ENTITY {
        return Err(skip(SkipReason::NotAMovie { entity_type: entity_type.to_string() }));
    }

    let kind = field(record, columns.kind);
    if columns.kind.is_some() && !kind.starts_with(WATCH_PREFIX) {
        return Err(skip(SkipReason::NotWatched { kind: kind.to_string() }));
    }

    if title.is_empty() && uuid.is_empty() {
        return Err(skip(SkipReason::Malformed {
            detail: "neither movie_name nor uuid is set".to_string(),
        }));
    }

    let created = field(record, Some(columns.created));
    let watched_at = parse_watched_at(created).ok_or_else(|| {
        skip(SkipReason::Malformed {
            detail: format!("unparseable created_at '{}'", created),
        })
    })?;

    Ok(WatchRecord {
        title: if title.is_empty() { UNTITLED.to_string() } else { title.to_string() },
        external_id: (!uuid.is_empty()).then(|| uuid.to_string()),
        watched_at,
        row,
    })
}

/// TV Time writes `2020-09-21 02:17:20` in UTC; newer exports sometimes add
/// fractional seconds or use RFC 3339.
pub fn parse_watched_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests;
