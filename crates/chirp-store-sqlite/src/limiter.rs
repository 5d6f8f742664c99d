//! [`SqliteRateLimiter`] — a sliding-window log shared through the database.
//!
//! Each admitted hit is one row in `rate_limit_hits`. Pruning, counting, and
//! recording run inside one `BEGIN IMMEDIATE` transaction, which takes the
//! database write lock up front; concurrent callers for the same key, in this
//! process or another one sharing the file, are serialised by SQLite.

use std::time::Duration;

use chirp_core::limiter::{Decision, RateLimiter};
use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;

use crate::{Error, Result};

#[derive(Clone)]
pub struct SqliteRateLimiter {
  conn:         tokio_rusqlite::Connection,
  max_requests: u32,
  window:       Duration,
}

impl SqliteRateLimiter {
  pub(crate) fn new(
    conn: tokio_rusqlite::Connection,
    max_requests: u32,
    window: Duration,
  ) -> Self {
    Self { conn, max_requests, window }
  }

  /// Evaluate a hit for `key` as if it happened at `now`.
  pub(crate) async fn limit_at(&self, key: &str, now: DateTime<Utc>) -> Result<Decision> {
    let key       = key.to_owned();
    let max       = self.max_requests;
    let window_ms = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);
    let now_ms    = now.timestamp_millis();

    let (admitted, used, oldest_ms): (bool, u32, Option<i64>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
          "DELETE FROM rate_limit_hits WHERE key = ?1 AND hit_at_ms <= ?2",
          rusqlite::params![key, now_ms.saturating_sub(window_ms)],
        )?;

        let (used, oldest_ms): (i64, Option<i64>) = tx.query_row(
          "SELECT COUNT(*), MIN(hit_at_ms) FROM rate_limit_hits WHERE key = ?1",
          rusqlite::params![key],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let used = u32::try_from(used).unwrap_or(u32::MAX);

        let admitted = used < max;
        if admitted {
          tx.execute(
            "INSERT INTO rate_limit_hits (key, hit_at_ms) VALUES (?1, ?2)",
            rusqlite::params![key, now_ms],
          )?;
        }

        tx.commit()?;
        Ok((admitted, used, oldest_ms))
      })
      .await
      .map_err(Error::Database)?;

    if admitted {
      return Ok(Decision {
        success:     true,
        limit:       max,
        remaining:   max - used - 1,
        retry_after: None,
      });
    }

    let retry_after = oldest_ms.map(|oldest| {
      let elapsed = u64::try_from(now_ms - oldest).unwrap_or(0);
      self.window.saturating_sub(Duration::from_millis(elapsed))
    });
    Ok(Decision {
      success: false,
      limit: max,
      remaining: 0,
      retry_after,
    })
  }
}

impl RateLimiter for SqliteRateLimiter {
  type Error = Error;

  async fn limit(&self, key: &str) -> Result<Decision> {
    self.limit_at(key, Utc::now()).await
  }
}
