//! SQLite-backed card source.

use crate::db::error::DbError;
use crate::db::schema::{SCHEMA, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use review_core::{
    AlgorithmId, Card, CardPracticeState, CardSchedule, CardSource, Clock, CollectionConfig,
    Duration, Grade, ReviewRecord, SystemClock,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

type Result<T> = std::result::Result<T, DbError>;

const CARD_COLUMNS: &str = "id, note_id, created_at, state, resume_state, ease_factor, \
     interval_seconds, learning_step, lapse_count, review_count, due_at";

/// Card storage in a single SQLite database.
pub struct SqliteCardSource<C = SystemClock> {
    conn: Mutex<Connection>,
    clock: C,
}

impl<C: Clock> SqliteCardSource<C> {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P, clock: C) -> Result<Self> {
        Self::initialize(Connection::open(path)?, clock)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory(clock: C) -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?, clock)
    }

    fn initialize(conn: Connection, clock: C) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    /// Create a new card for a note, due immediately.
    pub fn insert_new_card(&self, note_id: i64, config: &CollectionConfig) -> Result<Card> {
        let created_at = self.clock.now();
        let schedule = CardSchedule::new(created_at, config.initial_ease_factor());
        let conn = self.conn();
        conn.execute(
            "INSERT INTO cards (note_id, created_at, state, ease_factor, due_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                note_id,
                created_at.to_rfc3339(),
                schedule.state.as_str(),
                schedule.ease_factor,
                schedule.due_at.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(card_id = id, note_id, "inserted new card");
        Ok(Card::from_parts(id, note_id, created_at, schedule))
    }

    /// Review history of a card, oldest first.
    pub fn review_log(&self, card_id: i64) -> Result<Vec<ReviewRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT card_id, reviewed_at, grade, state_before, state_after, interval_before,
                    interval_after, ease_before, ease_after, algorithm
             FROM review_log WHERE card_id = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![card_id], |row| {
                Ok(ReviewRow {
                    card_id: row.get(0)?,
                    reviewed_at: row.get(1)?,
                    grade: row.get(2)?,
                    state_before: row.get(3)?,
                    state_after: row.get(4)?,
                    interval_before: row.get(5)?,
                    interval_after: row.get(6)?,
                    ease_before: row.get(7)?,
                    ease_after: row.get(8)?,
                    algorithm: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(ReviewRow::into_record).collect()
    }

    /// Stored collection config, if one was saved.
    pub fn load_config(&self) -> Result<Option<CollectionConfig>> {
        let json: Option<String> = self
            .conn()
            .query_row("SELECT config FROM collection_config WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(DbError::from)).transpose()
    }

    pub fn save_config(&self, config: &CollectionConfig) -> Result<()> {
        let json = serde_json::to_string(config)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO collection_config (id, config) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned connection is still usable; SQLite rolls back the failed statement.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock> CardSource for SqliteCardSource<C> {
    type Error = DbError;

    fn load_cards(&self) -> Result<Vec<Card>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM cards ORDER BY id", CARD_COLUMNS))?;
        let rows = stmt
            .query_map([], CardRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(CardRow::into_card).collect()
    }

    fn load_card(&self, id: i64) -> Result<Option<Card>> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
                params![id],
                CardRow::from_row,
            )
            .optional()?;
        row.map(CardRow::into_card).transpose()
    }

    fn save_card(&self, card: &Card) -> Result<()> {
        write_card(&self.conn(), card)
    }

    fn record_review(&self, record: &ReviewRecord) -> Result<()> {
        write_review(&self.conn(), record)
    }

    /// Card and log row are written in one transaction.
    fn save_answer(&self, card: &Card, record: &ReviewRecord) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        write_review(&tx, record)?;
        write_card(&tx, card)?;
        tx.commit()?;
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

fn write_card(conn: &Connection, card: &Card) -> Result<()> {
    let s = card.schedule();
    conn.execute(
        "INSERT OR REPLACE INTO cards (id, note_id, created_at, state, resume_state, ease_factor,
            interval_seconds, learning_step, lapse_count, review_count, due_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            card.id(),
            card.note_id(),
            card.created_at().to_rfc3339(),
            s.state.as_str(),
            s.resume_state.map(|r| r.as_str()),
            s.ease_factor,
            s.interval.seconds(),
            s.learning_step as i64,
            s.lapse_count,
            s.review_count,
            s.due_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn write_review(conn: &Connection, record: &ReviewRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO review_log (card_id, reviewed_at, grade, state_before, state_after,
            interval_before, interval_after, ease_before, ease_after, algorithm)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.card_id,
            record.reviewed_at.to_rfc3339(),
            record.grade.to_value(),
            record.state_before.as_str(),
            record.state_after.as_str(),
            record.interval_before.seconds(),
            record.interval_after.seconds(),
            record.ease_before,
            record.ease_after,
            record.algorithm.name(),
        ],
    )?;
    Ok(())
}

/// Raw `cards` row before validation.
struct CardRow {
    id: i64,
    note_id: i64,
    created_at: String,
    state: String,
    resume_state: Option<String>,
    ease_factor: f64,
    interval_seconds: i64,
    learning_step: i64,
    lapse_count: u32,
    review_count: u32,
    due_at: String,
}

impl CardRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            note_id: row.get(1)?,
            created_at: row.get(2)?,
            state: row.get(3)?,
            resume_state: row.get(4)?,
            ease_factor: row.get(5)?,
            interval_seconds: row.get(6)?,
            learning_step: row.get(7)?,
            lapse_count: row.get(8)?,
            review_count: row.get(9)?,
            due_at: row.get(10)?,
        })
    }

    fn into_card(self) -> Result<Card> {
        if self.interval_seconds < 0 {
            return Err(DbError::InvalidData(format!(
                "card {} has negative interval {}",
                self.id, self.interval_seconds
            )));
        }
        let learning_step = usize::try_from(self.learning_step).map_err(|_| {
            DbError::InvalidData(format!("card {} has learning step {}", self.id, self.learning_step))
        })?;
        let schedule = CardSchedule {
            state: parse_state(&self.state)?,
            ease_factor: self.ease_factor,
            interval: Duration::from_seconds(self.interval_seconds),
            learning_step,
            lapse_count: self.lapse_count,
            review_count: self.review_count,
            due_at: parse_timestamp(&self.due_at)?,
            resume_state: self.resume_state.as_deref().map(parse_state).transpose()?,
        };
        Ok(Card::from_parts(self.id, self.note_id, parse_timestamp(&self.created_at)?, schedule))
    }
}

/// Raw `review_log` row before validation.
struct ReviewRow {
    card_id: i64,
    reviewed_at: String,
    grade: u8,
    state_before: String,
    state_after: String,
    interval_before: i64,
    interval_after: i64,
    ease_before: f64,
    ease_after: f64,
    algorithm: String,
}

impl ReviewRow {
    fn into_record(self) -> Result<ReviewRecord> {
        Ok(ReviewRecord {
            card_id: self.card_id,
            reviewed_at: parse_timestamp(&self.reviewed_at)?,
            grade: Grade::from_value(self.grade).map_err(|e| DbError::InvalidData(e.to_string()))?,
            state_before: parse_state(&self.state_before)?,
            state_after: parse_state(&self.state_after)?,
            interval_before: Duration::from_seconds(self.interval_before),
            interval_after: Duration::from_seconds(self.interval_after),
            ease_before: self.ease_before,
            ease_after: self.ease_after,
            algorithm: AlgorithmId::parse(&self.algorithm)
                .ok_or_else(|| DbError::InvalidData(format!("unknown algorithm: {}", self.algorithm)))?,
        })
    }
}

fn parse_state(s: &str) -> Result<CardPracticeState> {
    CardPracticeState::parse(s).ok_or_else(|| DbError::InvalidData(format!("unknown card state: {}", s)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::InvalidData(format!("bad timestamp {:?}: {}", s, e)))
}
