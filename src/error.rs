//! Error types shared by the store and leaderboard.
//!
//! None of these ever escape the leaderboard as a failure of `load` or
//! `insert`; they are carried inside the returned reports so callers can
//! inspect them if they care.

use thiserror::Error;

/// Faults raised by a [`crate::store::KeyValueStore`] backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Writing `needed` bytes would exceed the store's `quota`
    #[error("quota exceeded: {needed} bytes requested, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a score submission is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("score field `{field}` is not a finite number")]
    NonNumeric { field: &'static str },

    #[error("score submission is not an object")]
    Malformed,
}

/// Faults hit while reading the persisted leaderboard
#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("stored leaderboard is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
