//! Hand-written stand-ins for the capability traits, shared by unit tests.

use std::{
  convert::Infallible,
  io,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
  directory::IdentityDirectory,
  identity::{Credentials, IdentityRecord},
  limiter::{Decision, RateLimiter},
  post::{NewPost, Post},
  store::{PostQuery, PostStore},
};

// ─── Posts ───────────────────────────────────────────────────────────────────

/// Posts kept in insertion order. Each write is stamped one millisecond after
/// the previous so ordering never depends on clock resolution.
#[derive(Default)]
pub struct MemoryStore {
  posts: Mutex<Vec<Post>>,
}

impl MemoryStore {
  pub fn len(&self) -> usize { self.posts.lock().unwrap().len() }
}

impl PostStore for MemoryStore {
  type Error = Infallible;

  async fn create_post(&self, input: NewPost) -> Result<Post, Infallible> {
    let mut posts = self.posts.lock().unwrap();
    let created_at = posts
      .last()
      .map(|p| p.created_at + Duration::milliseconds(1))
      .unwrap_or_else(Utc::now);
    let post = Post {
      id: Uuid::new_v4(),
      content: input.content,
      author_id: input.author_id,
      created_at,
    };
    posts.push(post.clone());
    Ok(post)
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<Post>, Infallible> {
    Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
  }

  async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, Infallible> {
    let posts = self.posts.lock().unwrap();
    let mut out: Vec<Post> = posts
      .iter()
      .rev()
      .filter(|p| {
        query
          .author_id
          .as_deref()
          .is_none_or(|a| p.author_id == a)
      })
      .cloned()
      .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out.truncate(query.limit);
    Ok(out)
  }
}

// ─── Identities ──────────────────────────────────────────────────────────────

/// A fixed identity list that counts how often it is asked for a batch.
#[derive(Default)]
pub struct StubDirectory {
  pub records: Vec<IdentityRecord>,
  pub lookups: AtomicUsize,
}

impl StubDirectory {
  pub fn with(records: Vec<IdentityRecord>) -> Self {
    Self { records, lookups: AtomicUsize::new(0) }
  }

  pub fn lookups(&self) -> usize { self.lookups.load(Ordering::SeqCst) }
}

pub fn identity(id: &str, username: Option<&str>) -> IdentityRecord {
  IdentityRecord {
    id:         id.to_owned(),
    username:   username.map(str::to_owned),
    image_url:  format!("https://img.example/{id}.png"),
    created_at: Utc::now(),
  }
}

impl IdentityDirectory for StubDirectory {
  type Error = Infallible;

  async fn lookup_batch(
    &self,
    ids: &[String],
    limit: usize,
  ) -> Result<Vec<IdentityRecord>, Infallible> {
    self.lookups.fetch_add(1, Ordering::SeqCst);
    Ok(
      self
        .records
        .iter()
        .filter(|r| ids.contains(&r.id))
        .take(limit)
        .cloned()
        .collect(),
    )
  }

  async fn find_by_username(
    &self,
    username: &str,
  ) -> Result<Option<IdentityRecord>, Infallible> {
    Ok(
      self
        .records
        .iter()
        .find(|r| r.username.as_deref() == Some(username))
        .cloned(),
    )
  }

  async fn credentials(&self, _: &str) -> Result<Option<Credentials>, Infallible> {
    Ok(None)
  }
}

// ─── Limiters ────────────────────────────────────────────────────────────────

/// A limiter whose backing store is unreachable.
pub struct BrokenLimiter;

impl RateLimiter for BrokenLimiter {
  type Error = io::Error;

  async fn limit(&self, _: &str) -> Result<Decision, io::Error> {
    Err(io::Error::new(io::ErrorKind::ConnectionRefused, "limiter offline"))
  }
}
