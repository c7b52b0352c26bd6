//! Durable message storage on SQLite.
//!
//! The store owns the persisted representation of messages and the one
//! invariant everything else leans on: `message_id` is unique for the
//! lifetime of the store. Uniqueness is enforced by the PRIMARY KEY, and
//! the conditional insert returns its outcome from a single atomic
//! statement — concurrent inserts of the same id are serialized by the
//! engine's constraint, not by application-level checks.
//!
//! Reads never take application-level locks; the pool hands each query
//! its own connection.

pub mod filter;

pub use filter::{MessageFilter, Predicate};

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, SqlitePool};
use thiserror::Error;

use crate::types::Message;

/// Statements applied at startup. `IF NOT EXISTS` keeps them idempotent.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        message_id  TEXT PRIMARY KEY,
        from_msisdn TEXT NOT NULL,
        to_msisdn   TEXT NOT NULL,
        ts          TEXT NOT NULL,
        text        TEXT NOT NULL DEFAULT '',
        received_at TEXT NOT NULL
    );"#,
    "CREATE INDEX IF NOT EXISTS idx_messages_order ON messages(received_at, message_id);",
    "CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(from_msisdn);",
];

/// Errors surfaced by store operations.
///
/// A uniqueness conflict is NOT an error — it is the `AlreadyExists`
/// outcome of [`MessageStore::insert_if_absent`]. `StoreError` means the
/// engine itself failed (connectivity, IO, corruption).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The message was inserted; this caller won the race (if any).
    Inserted,

    /// A message with this id already exists; nothing was written.
    AlreadyExists,
}

/// Aggregate view over the full store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSummary {
    /// Unfiltered row count.
    pub total: i64,

    /// Number of distinct senders.
    pub senders: i64,

    /// Smallest sender timestamp, if any messages exist.
    pub first_ts: Option<String>,

    /// Largest sender timestamp, if any messages exist.
    pub last_ts: Option<String>,

    /// Senders by message count, descending; ties broken by sender
    /// ascending; truncated.
    pub top_senders: Vec<SenderCount>,
}

/// One entry of the top-senders list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderCount {
    pub sender: String,
    pub count: i64,
}

/// Handle to the message table. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
    max_page_size: i64,
}

impl MessageStore {
    /// Opens (creating if necessary) the database at `url` and returns a
    /// store bound to it.
    ///
    /// WAL journaling and a busy timeout make concurrent writers queue on
    /// the engine's lock instead of failing immediately.
    pub async fn connect(url: &str, max_page_size: i64) -> Result<MessageStore> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        Ok(MessageStore {
            pool,
            max_page_size,
        })
    }

    /// Wraps an existing pool (used by tests).
    pub fn with_pool(pool: SqlitePool, max_page_size: i64) -> MessageStore {
        MessageStore {
            pool,
            max_page_size,
        }
    }

    /// Applies schema migrations. Safe to run on every startup.
    pub async fn migrate(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Inserts `message` unless a row with its id already exists.
    ///
    /// This is the synchronization point for the idempotency contract:
    /// the `ON CONFLICT` clause resolves concurrent inserts of the same
    /// id inside the engine, so exactly one caller observes `Inserted`
    /// and every other caller observes `AlreadyExists`. An existing row
    /// is never modified — in particular its `received_at` keeps the time
    /// of the first successful insert.
    pub async fn insert_if_absent(&self, message: &Message) -> Result<InsertOutcome> {
        let result = sqlx::query(
            "INSERT INTO messages (message_id, from_msisdn, to_msisdn, ts, text, received_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(message_id) DO NOTHING",
        )
        .bind(&message.message_id)
        .bind(&message.from_msisdn)
        .bind(&message.to_msisdn)
        .bind(&message.ts)
        .bind(&message.text)
        .bind(message.received_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    /// Returns one page of messages matching `filter`, plus the total
    /// number of matching rows independent of the page bounds.
    ///
    /// Ordering is `received_at` ascending with ties broken by
    /// `message_id`, so successive pages over a static dataset neither
    /// skip nor repeat rows. `limit` is clamped to the configured ceiling
    /// here as a hard bound; the query layer rejects out-of-range values
    /// before they reach this point.
    pub async fn list(
        &self,
        filter: &MessageFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Message>, i64)> {
        let limit = limit.clamp(1, self.max_page_size);
        let offset = offset.max(0);

        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM messages");
        filter.apply(&mut count_query);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut page_query = QueryBuilder::new(
            "SELECT message_id, from_msisdn, to_msisdn, ts, text, received_at FROM messages",
        );
        filter.apply(&mut page_query);
        page_query.push(" ORDER BY received_at ASC, message_id ASC LIMIT ");
        page_query.push_bind(limit);
        page_query.push(" OFFSET ");
        page_query.push_bind(offset);

        let messages: Vec<Message> = page_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok((messages, total))
    }

    /// Computes the aggregate stats view: total count, distinct senders,
    /// first/last sender timestamp, and the top `n` senders by volume
    /// (count descending, sender ascending on ties).
    pub async fn count_and_top_senders(&self, n: i64) -> Result<StatsSummary> {
        let (total, senders, first_ts, last_ts): (i64, i64, Option<String>, Option<String>) =
            sqlx::query_as(
                "SELECT COUNT(*), COUNT(DISTINCT from_msisdn), MIN(ts), MAX(ts) FROM messages",
            )
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT from_msisdn, COUNT(*) AS cnt FROM messages \
             GROUP BY from_msisdn \
             ORDER BY cnt DESC, from_msisdn ASC \
             LIMIT ?",
        )
        .bind(n)
        .fetch_all(&self.pool)
        .await?;

        let top_senders = rows
            .into_iter()
            .map(|(sender, count)| SenderCount { sender, count })
            .collect();

        Ok(StatsSummary {
            total,
            senders,
            first_ts,
            last_ts,
            top_senders,
        })
    }

    /// Readiness probe: runs a trivial query against the pool.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
