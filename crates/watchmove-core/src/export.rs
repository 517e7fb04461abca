use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use watchmove_models::{ImportPayload, PayloadLayout};

/// Timestamp format accepted by the Trakt importer
pub const WATCHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize import payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn format_watched_at(at: &DateTime<Utc>) -> String {
    at.format(WATCHED_AT_FORMAT).to_string()
}

#[derive(Serialize)]
struct GroupedEntry<'a> {
    id: &'a str,
    title: &'a str,
    watched_at: Vec<String>,
}

#[derive(Serialize)]
struct FlatEntry<'a> {
    id: &'a str,
    watched_at: String,
}

#[derive(Serialize)]
struct SyncIds<'a> {
    imdb: &'a str,
}

#[derive(Serialize)]
struct SyncMovie<'a> {
    title: &'a str,
    ids: SyncIds<'a>,
    watched_at: String,
}

#[derive(Serialize)]
struct SyncBody<'a> {
    movies: Vec<SyncMovie<'a>>,
}

/// Serialize the payload as pretty JSON (two-space indent, non-ASCII kept as is)
pub fn render_payload(payload: &ImportPayload, layout: PayloadLayout) -> Result<String, ExportError> {
    let json = match layout {
        PayloadLayout::Grouped => {
            let entries: Vec<GroupedEntry> = payload
                .movies
                .iter()
                .map(|movie| GroupedEntry {
                    id: movie.imdb_id.as_str(),
                    title: &movie.title,
                    watched_at: movie.watched_at.iter().map(format_watched_at).collect(),
                })
                .collect();
            serde_json::to_string_pretty(&entries)?
        }
        PayloadLayout::Flat => {
            let entries: Vec<FlatEntry> = payload
                .movies
                .iter()
                .flat_map(|movie| {
                    movie.watched_at.iter().map(move |at| FlatEntry {
                        id: movie.imdb_id.as_str(),
                        watched_at: format_watched_at(at),
                    })
                })
                .collect();
            serde_json::to_string_pretty(&entries)?
        }
        PayloadLayout::TraktSync => {
            let movies: Vec<SyncMovie> = payload
                .movies
                .iter()
                .flat_map(|movie| {
                    movie.watched_at.iter().map(move |at| SyncMovie {
                        title: &movie.title,
                        ids: SyncIds { imdb: movie.imdb_id.as_str() },
                        watched_at: format_watched_at(at),
                    })
                })
                .collect();
            serde_json::to_string_pretty(&SyncBody { movies })?
        }
    };
    Ok(json)
}

/// Render the payload in memory and write it to `path` in a single call.
///
/// Returns the number of bytes written.
pub fn write_payload(payload: &ImportPayload, layout: PayloadLayout, path: &Path) -> Result<usize, ExportError> {
    let json = render_payload(payload, layout)?;
    std::fs::write(path, &json).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Wrote {} movies ({} watch events, {} layout) to {}",
        payload.movies.len(),
        payload.event_count(),
        layout,
        path.display()
    );
    Ok(json.len())
}
