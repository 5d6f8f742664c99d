//! The `PostStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `chirp-store-sqlite`).
//! [`crate::writer::PostWriter`] and [`crate::feed::FeedAssembler`] depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::post::{NewPost, Post};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`PostStore::list_posts`].
#[derive(Debug, Clone)]
pub struct PostQuery {
  /// Restrict to posts by one author.
  pub author_id: Option<String>,
  /// Maximum number of posts to return.
  pub limit:     usize,
}

impl PostQuery {
  /// The most recent posts across all authors.
  pub fn latest(limit: usize) -> Self { Self { author_id: None, limit } }

  /// The most recent posts by `author_id`.
  pub fn by_author(author_id: impl Into<String>, limit: usize) -> Self {
    Self {
      author_id: Some(author_id.into()),
      limit,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Chirp post store backend.
///
/// Writes are append-only: there is no update or delete.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PostStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new post. The store assigns `id` and `created_at`.
  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Retrieve a post by id. Returns `None` if not found.
  fn get_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// List posts matching `query`, newest first by `created_at`.
  fn list_posts<'a>(
    &'a self,
    query: &'a PostQuery,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + 'a;
}
