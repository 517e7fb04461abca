// Candidate selection for title-based lookups

use watchmove_models::{AmbiguityPolicy, Candidate, ImdbId};

/// Result of choosing among the candidates a provider returned
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Match(Candidate),
    NoMatch,
    /// Several distinct ids survived title filtering
    Ambiguous(Vec<ImdbId>),
}

/// Normalize a title for comparison and grouping.
///
/// Lowercases, drops punctuation and collapses runs of whitespace, so
/// "Amélie!" and "  amélie " compare equal while "Alien" and "Aliens" do not.
pub fn normalize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn distinct_ids<'a>(candidates: impl Iterator<Item = &'a Candidate>) -> Vec<ImdbId> {
    let mut ids: Vec<ImdbId> = Vec::new();
    for candidate in candidates {
        if !ids.contains(&candidate.imdb_id) {
            ids.push(candidate.imdb_id.clone());
        }
    }
    ids
}

/// Pick the movie a title search refers to.
///
/// A single distinct id is taken as is. With several, only candidates whose
/// normalized title equals the query are kept; if that still leaves more (or
/// fewer) than one id, `policy` decides between skipping and the first hit.
pub fn pick_candidate(query_title: &str, candidates: &[Candidate], policy: AmbiguityPolicy) -> MatchOutcome {
    let Some(first) = candidates.first() else {
        return MatchOutcome::NoMatch;
    };

    let all_ids = distinct_ids(candidates.iter());
    if all_ids.len() == 1 {
        return MatchOutcome::Match(first.clone());
    }

    let wanted = normalize_title(query_title);
    let exact: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.title.as_deref().is_some_and(|t| normalize_title(t) == wanted))
        .collect();

    if distinct_ids(exact.iter().copied()).len() == 1 {
        return MatchOutcome::Match(exact[0].clone());
    }

    match policy {
        AmbiguityPolicy::First => MatchOutcome::Match(exact.first().copied().unwrap_or(first).clone()),
        AmbiguityPolicy::Skip => {
            let ids = if exact.is_empty() { all_ids } else { distinct_ids(exact.into_iter()) };
            MatchOutcome::Ambiguous(ids)
        }
    }
}
