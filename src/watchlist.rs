//! Personal watchlist, persisted after every mutation.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::Persistence;
use crate::tmdb::{MovieDetail, MovieId, MovieSummary};

pub const WATCHLIST_KEY: &str = "cinestream-watchlist";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl From<&MovieSummary> for WatchlistEntry {
    fn from(movie: &MovieSummary) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            vote_average: movie.vote_average,
            release_date: movie.release_date.clone(),
        }
    }
}

impl From<&MovieDetail> for WatchlistEntry {
    fn from(movie: &MovieDetail) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            vote_average: movie.vote_average,
            release_date: movie.release_date.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl ToggleOutcome {
    pub fn notice(&self) -> &'static str {
        match self {
            ToggleOutcome::Added => "Added to watchlist!",
            ToggleOutcome::Removed => "Removed from watchlist!",
        }
    }
}

pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
    persistence: Persistence,
}

impl Watchlist {
    /// Reads the stored list; missing or unreadable data yields an empty list.
    pub fn load(persistence: Persistence) -> Self {
        let entries: Vec<WatchlistEntry> = persistence.load(WATCHLIST_KEY).unwrap_or_default();
        info!("Loaded watchlist with {} entries", entries.len());
        Self {
            entries,
            persistence,
        }
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn toggle(&mut self, entry: WatchlistEntry) -> ToggleOutcome {
        let outcome = match self.entries.iter().position(|e| e.id == entry.id) {
            Some(index) => {
                self.entries.remove(index);
                ToggleOutcome::Removed
            }
            None => {
                self.entries.push(entry);
                ToggleOutcome::Added
            }
        };
        self.persist();
        outcome
    }

    pub fn remove(&mut self, id: MovieId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.persist();
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persistence.remove(WATCHLIST_KEY);
    }

    fn persist(&self) {
        self.persistence.save(WATCHLIST_KEY, &self.entries);
    }
}
