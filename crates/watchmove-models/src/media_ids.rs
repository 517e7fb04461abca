use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical movie identifier (IMDb `tt` id).
///
/// The only way to build one is through [`ImdbId::parse`], so every value in
/// circulation is non-empty and well formed. Trakt and the IMDb website both
/// key titles by this id, which makes it the join column between the export
/// and the import.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImdbId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidImdbId(pub String);

impl fmt::Display for InvalidImdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid IMDb id: '{}'", self.0)
    }
}

impl std::error::Error for InvalidImdbId {}

impl ImdbId {
    /// Parse an IMDb id, tolerating the wrapping slashes and whitespace some
    /// APIs add (e.g. `/tt0081505/`).
    pub fn parse(raw: &str) -> Result<Self, InvalidImdbId> {
        let cleaned = raw.trim().trim_matches('/');
        let digits = cleaned.strip_prefix("tt").unwrap_or("");
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(InvalidImdbId(raw.to_string()));
        }
        Ok(Self(cleaned.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title page on imdb.com, used in reports so a user can double-check a match
    pub fn imdb_url(&self) -> String {
        format!("https://www.imdb.com/title/{}", self.0)
    }
}

impl fmt::Display for ImdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImdbId {
    type Error = InvalidImdbId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImdbId> for String {
    fn from(id: ImdbId) -> Self {
        id.0
    }
}
