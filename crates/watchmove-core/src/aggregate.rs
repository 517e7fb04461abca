use crate::id_matching::normalize_title;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;
use watchmove_models::{ImdbId, ResolvedMovie, WatchRecord, UNTITLED};

/// Grouping key for watch records: the source uuid when the export has one,
/// otherwise the normalized title
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MovieKey {
    Uuid(String),
    Title(String),
}

impl MovieKey {
    pub fn for_record(record: &WatchRecord) -> Self {
        match record.external_id.as_deref() {
            Some(uuid) if !uuid.is_empty() => MovieKey::Uuid(uuid.to_string()),
            _ => MovieKey::Title(normalize_title(&record.title)),
        }
    }
}

impl fmt::Display for MovieKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieKey::Uuid(uuid) => write!(f, "uuid:{}", uuid),
            MovieKey::Title(title) => write!(f, "title:{}", title),
        }
    }
}

/// All watch events of one movie as it appears in the export, before lookup
#[derive(Debug, Clone, PartialEq)]
pub struct MovieGroup {
    pub key: MovieKey,
    pub title: String,
    pub external_id: Option<String>,
    /// Raw events, repeats included
    pub watched_at: Vec<DateTime<Utc>>,
    pub first_row: usize,
}

impl MovieGroup {
    pub fn has_title(&self) -> bool {
        self.title != UNTITLED
    }

    /// Text to search for, empty for untitled rows so title providers stay out of it
    pub fn search_title(&self) -> &str {
        if self.has_title() {
            &self.title
        } else {
            ""
        }
    }

    pub fn source_url(&self) -> Option<String> {
        self.external_id
            .as_deref()
            .map(|uuid| format!("https://www.tvtime.com/movie/{}", uuid))
    }
}

/// Group watch records by movie key, in order of first appearance.
///
/// A title-only group joins the uuid group carrying the same normalized title
/// when there is exactly one such group. Several uuid groups sharing a title
/// stay apart (remakes), and the title group then keeps its own lookup.
pub fn group_records(records: &[WatchRecord]) -> Vec<MovieGroup> {
    let mut groups: Vec<MovieGroup> = Vec::new();
    let mut index: HashMap<MovieKey, usize> = HashMap::new();

    for record in records {
        let key = MovieKey::for_record(record);
        match index.get(&key) {
            Some(&pos) => {
                let group = &mut groups[pos];
                if !group.has_title() && record.has_title() {
                    group.title = record.title.clone();
                }
                group.watched_at.push(record.watched_at);
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(MovieGroup {
                    key,
                    title: record.title.clone(),
                    external_id: record.external_id.clone(),
                    watched_at: vec![record.watched_at],
                    first_row: record.row,
                });
            }
        }
    }

    let groups = fold_title_groups(groups);
    debug!("Grouped {} watch records into {} movies", records.len(), groups.len());
    groups
}

fn fold_title_groups(groups: Vec<MovieGroup>) -> Vec<MovieGroup> {
    let mut uuid_by_title: HashMap<String, Vec<usize>> = HashMap::new();
    for (pos, group) in groups.iter().enumerate() {
        if matches!(group.key, MovieKey::Uuid(_)) && group.has_title() {
            uuid_by_title.entry(normalize_title(&group.title)).or_default().push(pos);
        }
    }

    let mut targets: HashMap<usize, usize> = HashMap::new();
    for (pos, group) in groups.iter().enumerate() {
        if let MovieKey::Title(title) = &group.key {
            if let Some([target]) = uuid_by_title.get(title).map(Vec::as_slice) {
                targets.insert(pos, *target);
            }
        }
    }
    if targets.is_empty() {
        return groups;
    }

    let mut slots: Vec<Option<MovieGroup>> = groups.into_iter().map(Some).collect();
    for (&from, &into) in &targets {
        let Some(folded) = slots[from].take() else {
            continue;
        };
        if let Some(target) = slots[into].as_mut() {
            debug!(
                "'{}' has no uuid, joining the watch events of {}",
                folded.title, target.key
            );
            target.watched_at.extend(folded.watched_at);
            target.first_row = target.first_row.min(folded.first_row);
        }
    }

    let mut groups: Vec<MovieGroup> = slots.into_iter().flatten().collect();
    groups.sort_by_key(|group| group.first_row);
    groups
}

/// Collects resolved groups into output movies, merging groups that
/// resolved to the same IMDb id
#[derive(Debug, Default)]
pub struct MovieAccumulator {
    movies: Vec<ResolvedMovie>,
    by_id: HashMap<ImdbId, usize>,
    duplicate_events: usize,
}

impl MovieAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolved group; title and provider of the first group for an id win
    pub fn add(&mut self, group: MovieGroup, imdb_id: ImdbId, resolved_by: &str, fallback: bool) {
        let pos = match self.by_id.get(&imdb_id) {
            Some(&pos) => {
                debug!(
                    "'{}' resolved to {} as well, merging into '{}'",
                    group.title, imdb_id, self.movies[pos].title
                );
                pos
            }
            None => {
                self.by_id.insert(imdb_id.clone(), self.movies.len());
                self.movies.push(ResolvedMovie {
                    title: group.title.clone(),
                    imdb_id,
                    external_id: group.external_id.clone(),
                    watched_at: Vec::with_capacity(group.watched_at.len()),
                    resolved_by: resolved_by.to_string(),
                    fallback,
                });
                self.movies.len() - 1
            }
        };

        let movie = &mut self.movies[pos];
        if movie.title == UNTITLED && group.has_title() {
            movie.title = group.title;
        }
        self.duplicate_events += movie.merge_watches(group.watched_at);
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Watch events dropped because the same movie already had that exact timestamp
    pub fn duplicate_events(&self) -> usize {
        self.duplicate_events
    }

    pub fn into_movies(self) -> Vec<ResolvedMovie> {
        self.movies
    }
}
