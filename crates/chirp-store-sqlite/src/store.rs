//! [`SqliteStore`] — the SQLite implementation of [`PostStore`].

use std::{path::Path, time::Duration};

use chirp_core::{
  identity::IdentityRecord,
  post::{NewPost, Post},
  store::{PostQuery, PostStore},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawPost, encode_dt, encode_uuid},
  limiter::SqliteRateLimiter,
  schema::SCHEMA,
};

/// How long a connection waits on another writer's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Chirp store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// Input to [`SqliteStore::add_identity`].
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub username:      Option<String>,
  pub image_url:     String,
  /// PHC string produced by argon2.
  pub password_hash: String,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }

  /// A rate limiter whose hit log lives in this store's database, so every
  /// process opening the same file shares one budget per key.
  pub fn rate_limiter(&self, max_requests: u32, window: Duration) -> SqliteRateLimiter {
    SqliteRateLimiter::new(self.conn.clone(), max_requests, window)
  }

  /// Register a new identity and return its record. The id is generated here.
  pub async fn add_identity(&self, input: NewIdentity) -> Result<IdentityRecord> {
    let record = IdentityRecord {
      id:         format!("user_{}", Uuid::new_v4().simple()),
      username:   input.username,
      image_url:  input.image_url,
      created_at: Utc::now(),
    };

    let id        = record.id.clone();
    let username  = record.username.clone();
    let image_url = record.image_url.clone();
    let at_str    = encode_dt(record.created_at);
    let hash      = input.password_hash;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (identity_id, username, image_url, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id, username, image_url, hash, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }
}

// ─── PostStore impl ──────────────────────────────────────────────────────────

impl PostStore for SqliteStore {
  type Error = Error;

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    let post = Post {
      id:         Uuid::new_v4(),
      content:    input.content,
      author_id:  input.author_id,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(post.id);
    let content   = post.content.clone();
    let author_id = post.author_id.clone();
    let at_str    = encode_dt(post.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (post_id, content, author_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, content, author_id, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(post)
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT post_id, content, author_id, created_at
               FROM posts WHERE post_id = ?1",
              rusqlite::params![id_str],
              RawPost::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
    let author_id = query.author_id.clone();
    let limit_val = i64::try_from(query.limit).unwrap_or(i64::MAX);

    let raws: Vec<RawPost> = self
      .conn
      .call(move |conn| {
        // rowid breaks ties between posts written in the same instant.
        let rows = if let Some(author) = author_id {
          let mut stmt = conn.prepare(
            "SELECT post_id, content, author_id, created_at
             FROM posts
             WHERE author_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
          )?;
          stmt
            .query_map(rusqlite::params![author, limit_val], RawPost::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(
            "SELECT post_id, content, author_id, created_at
             FROM posts
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1",
          )?;
          stmt
            .query_map(rusqlite::params![limit_val], RawPost::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }
}
