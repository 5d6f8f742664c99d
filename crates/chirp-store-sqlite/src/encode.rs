//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed nanosecond fraction
//! and a `Z` suffix, so lexicographic order in SQL matches time order. UUIDs
//! are stored as hyphenated lowercase strings.

use chirp_core::{identity::IdentityRecord, post::Post};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// A `posts` row as read from SQLite, before decoding.
pub struct RawPost {
  pub post_id:    String,
  pub content:    String,
  pub author_id:  String,
  pub created_at: String,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:    row.get(0)?,
      content:    row.get(1)?,
      author_id:  row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      id:         decode_uuid(&self.post_id)?,
      content:    self.content,
      author_id:  self.author_id,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// An `identities` row (without the password hash), before decoding.
pub struct RawIdentity {
  pub identity_id: String,
  pub username:    Option<String>,
  pub image_url:   String,
  pub created_at:  String,
}

impl RawIdentity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id: row.get(0)?,
      username:    row.get(1)?,
      image_url:   row.get(2)?,
      created_at:  row.get(3)?,
    })
  }

  pub fn into_record(self) -> Result<IdentityRecord> {
    Ok(IdentityRecord {
      id:         self.identity_id,
      username:   self.username,
      image_url:  self.image_url,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_like_time() {
    let whole = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let later = whole + chrono::Duration::nanoseconds(5);

    let a = encode_dt(whole);
    let b = encode_dt(later);
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), later);
  }
}
