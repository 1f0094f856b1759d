//! SQLite persistence for servers and their observations.
//!
//! Timestamps are stored as RFC 3339 text with nanosecond precision so that
//! lexical order matches chronological order.

pub mod database;
pub mod observation;
pub mod server;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

pub use database::connection::{create_pool, open, run_migrations, DbPool};
pub use observation::{SqliteHealthRepository, SqliteStatsRepository};
pub use server::SqliteServerRepository;

fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_time(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("timestamp '{text}': {e}")))
}

fn checked_count(value: u64, column: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::Parse(format!("{column} out of range: {value}")))
}

fn stored_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
