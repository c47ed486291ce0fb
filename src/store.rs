//! Persistence gateway.
//!
//! Each collection is serialized as one JSON array under a stable key, and a
//! save overwrites the whole array: last write wins at save granularity.
//! Reads never fail outward; missing or corrupt data degrades to an empty
//! collection with a logged warning, and callers decide what to do with a
//! failed write.

use log::warn;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::models::{MetacognitionEntry, Question, ReviewCard};

// Stable storage keys, one per collection. Renaming either is a breaking
// change to persisted data.
const CARDS_KEY: &str = "review_cards";
const ENTRIES_KEY: &str = "metacognition_entries";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn load_cards(&self) -> Vec<ReviewCard> {
        self.load_collection(CARDS_KEY)
    }

    pub fn save_cards(&self, cards: &[ReviewCard]) -> Result<(), StoreError> {
        self.save_collection(CARDS_KEY, cards)
    }

    pub fn load_entries(&self) -> Vec<MetacognitionEntry> {
        self.load_collection(ENTRIES_KEY)
    }

    pub fn save_entries(&self, entries: &[MetacognitionEntry]) -> Result<(), StoreError> {
        self.save_collection(ENTRIES_KEY, entries)
    }

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw: Result<String, rusqlite::Error> = self.conn.query_row(
            "SELECT value FROM collections WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );

        match raw {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(items) => items,
                Err(e) => {
                    warn!("store: corrupt data under '{}', starting empty: {}", key, e);
                    vec![]
                }
            },
            Err(rusqlite::Error::QueryReturnedNoRows) => vec![],
            Err(e) => {
                warn!("store: failed to read '{}', starting empty: {}", key, e);
                vec![]
            }
        }
    }

    fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string(items)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO collections (key, value) VALUES (?1, ?2)",
            params![key, json],
        )?;
        Ok(())
    }
}

/// Loads the external question pool from a JSON file.
///
/// Content is read-only and authored elsewhere; the same empty-on-failure
/// contract applies as for the stored collections.
pub fn load_questions<P: AsRef<Path>>(path: P) -> Vec<Question> {
    let path = path.as_ref();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("store: cannot read question pool {}: {}", path.display(), e);
            return vec![];
        }
    };
    match serde_json::from_str(&raw) {
        Ok(questions) => questions,
        Err(e) => {
            warn!(
                "store: malformed question pool {}: {}",
                path.display(),
                e
            );
            vec![]
        }
    }
}
