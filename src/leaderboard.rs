//! Ranked, size-bounded list of best scores backed by a [`KeyValueStore`].
//!
//! Entries are ordered by wpm descending, then accuracy descending. Every
//! mutation re-sorts and truncates to [`MAX_ENTRIES`] before writing the
//! whole list back under [`LEADERBOARD_KEY`] as a JSON array.
//!
//! Neither [`Leaderboard::load`] nor [`Leaderboard::insert`] can fail from
//! the caller's point of view. Faults are logged and handed back in a
//! report that can be inspected or dropped.

use crate::error::{LeaderboardError, ScoreError, StoreError};
use crate::store::KeyValueStore;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Store key holding the serialized leaderboard
pub const LEADERBOARD_KEY: &str = "typingSpeedLeaderboard";

/// Maximum number of retained scores
pub const MAX_ENTRIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub wpm: f64,
    pub accuracy: f64,
    /// Epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
}

impl ScoreRecord {
    pub fn new(wpm: f64, accuracy: f64, timestamp: i64) -> Self {
        Self {
            wpm,
            accuracy,
            timestamp,
        }
    }

    /// Stamp a score with the current wall-clock time
    pub fn now(wpm: f64, accuracy: f64) -> Self {
        Self::new(wpm, accuracy, chrono::Utc::now().timestamp_millis())
    }

    fn validate(&self) -> Result<(), ScoreError> {
        if !self.wpm.is_finite() {
            return Err(ScoreError::NonNumeric { field: "wpm" });
        }
        if !self.accuracy.is_finite() {
            return Err(ScoreError::NonNumeric { field: "accuracy" });
        }
        Ok(())
    }
}

impl TryFrom<&Value> for ScoreRecord {
    type Error = ScoreError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let obj = value.as_object().ok_or(ScoreError::Malformed)?;
        let number = |field: &'static str| {
            obj.get(field)
                .and_then(Value::as_f64)
                .ok_or(ScoreError::NonNumeric { field })
        };
        let wpm = number("wpm")?;
        let accuracy = number("accuracy")?;
        let timestamp = match obj.get("timestamp") {
            None => 0,
            Some(ts) => ts
                .as_i64()
                .or_else(|| ts.as_f64().filter(|t| t.is_finite()).map(|t| t as i64))
                .ok_or(ScoreError::NonNumeric { field: "timestamp" })?,
        };
        Ok(Self::new(wpm, accuracy, timestamp))
    }
}

/// Ranking order: higher wpm first, then higher accuracy
pub fn rank_order(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.wpm
        .total_cmp(&a.wpm)
        .then_with(|| b.accuracy.total_cmp(&a.accuracy))
}

/// Where an inserted record ended up
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Kept at this zero-based rank
    Ranked(usize),
    /// Valid, but fell off the end of the board
    Dropped,
    /// Invalid submission; the board was not touched
    Rejected(ScoreError),
}

/// What happened during an insert
#[derive(Debug)]
pub struct InsertReport {
    pub placement: Placement,
    /// Set when writing back to the store failed. The in-memory board is
    /// updated regardless.
    pub persist_error: Option<StoreError>,
}

impl InsertReport {
    pub fn is_persisted(&self) -> bool {
        !matches!(self.placement, Placement::Rejected(_)) && self.persist_error.is_none()
    }
}

/// What happened during a load
#[derive(Debug)]
pub enum LoadReport {
    Loaded(usize),
    /// Nothing stored under the key yet
    Missing,
    /// The stored value could not be read; the in-memory board was cleared
    /// and the stored value left untouched
    Recovered(LeaderboardError),
}

#[derive(Debug)]
pub struct Leaderboard<S> {
    store: S,
    entries: Vec<ScoreRecord>,
}

impl<S: KeyValueStore> Leaderboard<S> {
    /// An empty board over `store`. Call [`Leaderboard::load`] to pick up
    /// previously saved scores.
    pub fn new(store: S) -> Self {
        Self {
            store,
            entries: Vec::new(),
        }
    }

    pub fn load(&mut self) -> LoadReport {
        match self.read_stored() {
            Ok(Some(entries)) => {
                self.entries = ranked(entries);
                tracing::debug!(count = self.entries.len(), "leaderboard loaded");
                LoadReport::Loaded(self.entries.len())
            }
            Ok(None) => {
                self.entries.clear();
                LoadReport::Missing
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load leaderboard, starting empty");
                self.entries.clear();
                LoadReport::Recovered(err)
            }
        }
    }

    fn read_stored(&self) -> Result<Option<Vec<ScoreRecord>>, LeaderboardError> {
        match self.store.get(LEADERBOARD_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn insert(&mut self, record: ScoreRecord) -> InsertReport {
        if let Err(err) = record.validate() {
            tracing::warn!(?record, error = %err, "rejected invalid score");
            return InsertReport {
                placement: Placement::Rejected(err),
                persist_error: None,
            };
        }

        // entries stay sorted, so the new record lands after every equal one
        let idx = self
            .entries
            .partition_point(|e| rank_order(e, &record) != Ordering::Greater);
        self.entries.insert(idx, record);
        self.entries.truncate(MAX_ENTRIES);

        let placement = if idx < MAX_ENTRIES {
            Placement::Ranked(idx)
        } else {
            Placement::Dropped
        };

        let persist_error = self.persist().err();
        if let Some(err) = &persist_error {
            tracing::error!(error = %err, "failed to persist leaderboard");
        }

        InsertReport {
            placement,
            persist_error,
        }
    }

    /// Insert a loosely-typed `{ wpm, accuracy, timestamp }` object
    pub fn submit(&mut self, value: &Value) -> InsertReport {
        match ScoreRecord::try_from(value) {
            Ok(record) => self.insert(record),
            Err(err) => {
                tracing::warn!(submission = %value, error = %err, "rejected invalid score");
                InsertReport {
                    placement: Placement::Rejected(err),
                    persist_error: None,
                }
            }
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let data = serde_json::to_string(&self.entries)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.store.set(LEADERBOARD_KEY, &data)
    }

    pub fn entries(&self) -> &[ScoreRecord] {
        &self.entries
    }

    pub fn best(&self) -> Option<&ScoreRecord> {
        self.entries.first()
    }

    /// Whether `record` would earn a place on the board right now
    pub fn qualifies(&self, record: &ScoreRecord) -> bool {
        if record.validate().is_err() {
            return false;
        }
        self.entries.len() < MAX_ENTRIES
            || self
                .entries
                .last()
                .is_some_and(|last| rank_order(record, last) == Ordering::Less)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

fn ranked(entries: Vec<ScoreRecord>) -> Vec<ScoreRecord> {
    entries
        .into_iter()
        .sorted_by(rank_order)
        .take(MAX_ENTRIES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn score(wpm: f64, accuracy: f64) -> ScoreRecord {
        ScoreRecord::new(wpm, accuracy, 1_700_000_000_000)
    }

    fn pairs(board: &Leaderboard<MemoryStore>) -> Vec<(f64, f64)> {
        board.entries().iter().map(|e| (e.wpm, e.accuracy)).collect()
    }

    /// Store whose reads or writes always fail
    struct BrokenStore {
        fail_get: bool,
    }

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            if self.fail_get {
                Err(StoreError::Unavailable("disk gone".into()))
            } else {
                Ok(None)
            }
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".into()))
        }
    }

    #[test]
    fn test_ranking_with_tie_break() {
        let mut board = Leaderboard::new(MemoryStore::new());
        board.insert(score(50.0, 90.0));
        board.insert(score(70.0, 80.0));
        board.insert(score(70.0, 95.0));

        assert_eq!(pairs(&board), vec![(70.0, 95.0), (70.0, 80.0), (50.0, 90.0)]);
    }

    #[test]
    fn test_truncates_to_max_entries() {
        let mut board = Leaderboard::new(MemoryStore::new());
        for wpm in [40.0, 10.0, 60.0, 30.0, 50.0, 20.0] {
            board.insert(score(wpm, 90.0));
        }

        assert_eq!(board.entries().len(), MAX_ENTRIES);
        let wpms: Vec<f64> = board.entries().iter().map(|e| e.wpm).collect();
        assert_eq!(wpms, vec![60.0, 50.0, 40.0, 30.0, 20.0]);
    }

    #[test]
    fn test_insert_reports_placement() {
        let mut board = Leaderboard::new(MemoryStore::new());
        for wpm in [10.0, 20.0, 30.0, 40.0, 50.0] {
            board.insert(score(wpm, 90.0));
        }

        let report = board.insert(score(35.0, 90.0));
        assert_eq!(report.placement, Placement::Ranked(2));
        assert!(report.is_persisted());

        let report = board.insert(score(1.0, 100.0));
        assert_eq!(report.placement, Placement::Dropped);
        assert_eq!(board.entries().len(), MAX_ENTRIES);
    }

    #[test]
    fn test_identical_score_on_full_board_is_dropped() {
        let mut board = Leaderboard::new(MemoryStore::new());
        let record = ScoreRecord::new(10.0, 90.0, 1);
        for expected in 0..MAX_ENTRIES {
            assert_eq!(board.insert(record).placement, Placement::Ranked(expected));
        }

        let report = board.insert(record);
        assert_eq!(report.placement, Placement::Dropped);
        assert_eq!(board.entries().len(), MAX_ENTRIES);
    }

    #[test]
    fn test_tied_score_ranks_after_existing_ties() {
        let mut board = Leaderboard::new(MemoryStore::new());
        board.insert(score(50.0, 90.0));
        board.insert(score(40.0, 90.0));

        let report = board.insert(score(50.0, 90.0));
        assert_eq!(report.placement, Placement::Ranked(1));
        assert_eq!(pairs(&board), vec![(50.0, 90.0), (50.0, 90.0), (40.0, 90.0)]);
    }

    #[test]
    fn test_submit_timestamp_forms() {
        let mut board = Leaderboard::new(MemoryStore::new());

        board.submit(&json!({ "wpm": 30, "accuracy": 90, "timestamp": 1.5e12 }));
        assert_eq!(board.entries()[0].timestamp, 1_500_000_000_000);

        let report = board.submit(&json!({ "wpm": 40, "accuracy": 90, "timestamp": null }));
        assert_eq!(
            report.placement,
            Placement::Rejected(ScoreError::NonNumeric { field: "timestamp" })
        );
        let report = board.submit(&json!({ "wpm": 40, "accuracy": 90, "timestamp": "today" }));
        assert_matches!(report.placement, Placement::Rejected(_));
        assert_eq!(board.entries().len(), 1);
    }

    #[test]
    fn test_invalid_submission_is_noop() {
        let mut board = Leaderboard::new(MemoryStore::new());
        board.insert(score(42.0, 97.5));
        let before = board.entries().to_vec();
        let stored_before = board.store().get(LEADERBOARD_KEY).unwrap();

        let report = board.submit(&json!({ "wpm": "fast", "accuracy": 90 }));
        assert_eq!(
            report.placement,
            Placement::Rejected(ScoreError::NonNumeric { field: "wpm" })
        );
        assert_eq!(board.entries(), before.as_slice());
        assert_eq!(board.store().get(LEADERBOARD_KEY).unwrap(), stored_before);
    }

    #[test]
    fn test_submit_rejects_missing_accuracy_and_non_objects() {
        let mut board = Leaderboard::new(MemoryStore::new());

        let report = board.submit(&json!({ "wpm": 50 }));
        assert_eq!(
            report.placement,
            Placement::Rejected(ScoreError::NonNumeric { field: "accuracy" })
        );

        let report = board.submit(&json!([50, 90]));
        assert_eq!(report.placement, Placement::Rejected(ScoreError::Malformed));
        assert!(!report.is_persisted());
        assert!(board.entries().is_empty());
    }

    #[test]
    fn test_submit_accepts_valid_literal() {
        let mut board = Leaderboard::new(MemoryStore::new());
        let report = board.submit(&json!({ "wpm": 61, "accuracy": 98.5, "timestamp": 1234 }));

        assert_eq!(report.placement, Placement::Ranked(0));
        assert_eq!(board.entries(), &[ScoreRecord::new(61.0, 98.5, 1234)]);
    }

    #[test]
    fn test_insert_rejects_non_finite() {
        let mut board = Leaderboard::new(MemoryStore::new());
        let report = board.insert(score(f64::NAN, 90.0));
        assert_matches!(report.placement, Placement::Rejected(_));
        let report = board.insert(score(50.0, f64::INFINITY));
        assert_matches!(
            report.placement,
            Placement::Rejected(ScoreError::NonNumeric { field: "accuracy" })
        );
        assert!(board.entries().is_empty());
    }

    #[test]
    fn test_round_trip_through_store() {
        let mut board = Leaderboard::new(MemoryStore::new());
        board.insert(score(50.0, 90.0));
        board.insert(score(70.0, 80.0));
        board.insert(score(70.0, 95.0));
        let expected = board.entries().to_vec();

        let mut reloaded = Leaderboard::new(board.into_store());
        assert_matches!(reloaded.load(), LoadReport::Loaded(3));
        assert_eq!(reloaded.entries(), expected.as_slice());
    }

    #[test]
    fn test_load_missing_key() {
        let mut board = Leaderboard::new(MemoryStore::new());
        assert_matches!(board.load(), LoadReport::Missing);
        assert!(board.entries().is_empty());
    }

    #[test]
    fn test_load_corrupt_value_resets_and_leaves_store_alone() {
        let mut board = Leaderboard::new(MemoryStore::new());
        board.insert(score(10.0, 10.0));
        board
            .store_mut()
            .set(LEADERBOARD_KEY, "{not json")
            .unwrap();

        assert_matches!(
            board.load(),
            LoadReport::Recovered(LeaderboardError::Parse(_))
        );
        assert!(board.entries().is_empty());
    }

    #[test]
    fn test_load_keeps_corrupt_store_value() {
        let mut store = MemoryStore::new();
        store.set(LEADERBOARD_KEY, "garbage").unwrap();
        let mut board = Leaderboard::new(store);

        board.load();
        assert_eq!(
            board.store().get(LEADERBOARD_KEY).unwrap().as_deref(),
            Some("garbage")
        );
    }

    #[test]
    fn test_load_store_fault_resets() {
        let mut board = Leaderboard::new(BrokenStore { fail_get: true });
        assert_matches!(
            board.load(),
            LoadReport::Recovered(LeaderboardError::Store(_))
        );
        assert!(board.entries().is_empty());
    }

    #[test]
    fn test_load_resorts_and_truncates() {
        let mut store = MemoryStore::new();
        store
            .set(
                LEADERBOARD_KEY,
                r#"[{"wpm":10,"accuracy":90,"timestamp":1},
                    {"wpm":80,"accuracy":70,"timestamp":2},
                    {"wpm":80,"accuracy":99,"timestamp":3},
                    {"wpm":30,"accuracy":90,"timestamp":4},
                    {"wpm":20,"accuracy":90,"timestamp":5},
                    {"wpm":40,"accuracy":90,"timestamp":6}]"#,
            )
            .unwrap();
        let mut board = Leaderboard::new(store);

        assert_matches!(board.load(), LoadReport::Loaded(5));
        let stamps: Vec<i64> = board.entries().iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![3, 2, 6, 4, 5]);
    }

    #[test]
    fn test_load_tolerates_missing_timestamp() {
        let mut store = MemoryStore::new();
        store
            .set(LEADERBOARD_KEY, r#"[{"wpm":55,"accuracy":91.5}]"#)
            .unwrap();
        let mut board = Leaderboard::new(store);

        board.load();
        assert_eq!(board.entries(), &[ScoreRecord::new(55.0, 91.5, 0)]);
    }

    #[test]
    fn test_persist_failure_keeps_memory_updated() {
        let mut board = Leaderboard::new(BrokenStore { fail_get: false });
        let report = board.insert(score(66.0, 99.0));

        assert_eq!(report.placement, Placement::Ranked(0));
        assert_matches!(report.persist_error, Some(StoreError::Unavailable(_)));
        assert!(!report.is_persisted());
        assert_eq!(board.entries().len(), 1);
    }

    #[test]
    fn test_quota_exceeded_diverges_until_next_success() {
        let mut board = Leaderboard::new(MemoryStore::with_quota(80));
        let first = board.insert(score(50.0, 90.0));
        assert!(first.is_persisted());

        let second = board.insert(score(60.0, 95.0));
        assert_matches!(
            second.persist_error,
            Some(StoreError::QuotaExceeded { .. })
        );
        assert_eq!(board.entries().len(), 2);

        let stored = board.store().get(LEADERBOARD_KEY).unwrap().unwrap();
        let on_disk: Vec<ScoreRecord> = serde_json::from_str(&stored).unwrap();
        assert_eq!(on_disk.len(), 1);
    }

    #[test]
    fn test_persisted_format() {
        let mut board = Leaderboard::new(MemoryStore::new());
        board.insert(ScoreRecord::new(50.0, 90.5, 42));

        let stored = board.store().get(LEADERBOARD_KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(
            value,
            json!([{ "wpm": 50.0, "accuracy": 90.5, "timestamp": 42 }])
        );
    }

    #[test]
    fn test_best_and_qualifies() {
        let mut board = Leaderboard::new(MemoryStore::new());
        assert!(board.best().is_none());
        assert!(board.qualifies(&score(1.0, 1.0)));

        for wpm in [10.0, 20.0, 30.0, 40.0, 50.0] {
            board.insert(score(wpm, 90.0));
        }
        assert_eq!(board.best().map(|b| b.wpm), Some(50.0));
        assert!(board.qualifies(&score(11.0, 50.0)));
        assert!(board.qualifies(&score(10.0, 91.0)));
        assert!(!board.qualifies(&score(10.0, 90.0)));
        assert!(!board.qualifies(&score(5.0, 100.0)));
        assert!(!board.qualifies(&score(f64::NAN, 100.0)));
    }

    #[test]
    fn test_score_record_now_stamps_time() {
        let before = chrono::Utc::now().timestamp_millis();
        let record = ScoreRecord::now(40.0, 88.0);
        assert!(record.timestamp >= before);
    }
}
