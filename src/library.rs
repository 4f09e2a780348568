use std::path::PathBuf;
use serde::Deserialize;

use crate::query::Query;

/// A catalog track as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Track {
    pub id: String,
    pub uri: String,
    pub name: String,
}

/// A local file and whatever title/artist could be read from its tags.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub path: PathBuf,
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl MediaItem {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Matched(Track),
    Unmatched,
}

impl LookupOutcome {
    /// Takes the best match out of a search result. Only the first track counts.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        match tracks.into_iter().next() {
            Some(track) => LookupOutcome::Matched(track),
            None => LookupOutcome::Unmatched,
        }
    }

    pub fn track(&self) -> Option<&Track> {
        match self {
            LookupOutcome::Matched(track) => Some(track),
            LookupOutcome::Unmatched => None,
        }
    }
}

/// One lookup per eligible file, kept with the file and query it came from.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub source: PathBuf,
    pub query: Query,
    pub outcome: LookupOutcome,
}

/// The matched tracks of a lookup run, in result order.
pub fn matched_tracks(lookups: &[Lookup]) -> Vec<Track> {
    lookups
        .iter()
        .filter_map(|lookup| lookup.outcome.track().cloned())
        .collect()
}
