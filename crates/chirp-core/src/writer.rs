//! [`PostWriter`] — the only write path into the post store.

use std::sync::Arc;

use crate::{
  Error, Result,
  limiter::RateLimiter,
  post::{NewPost, Post, validate_content},
  store::PostStore,
};

/// Validates, rate-limits, and persists new posts.
pub struct PostWriter<S, L> {
  store:   Arc<S>,
  limiter: Arc<L>,
}

impl<S, L> PostWriter<S, L>
where
  S: PostStore,
  L: RateLimiter,
{
  pub fn new(store: Arc<S>, limiter: Arc<L>) -> Self { Self { store, limiter } }

  /// Create a post authored by `author_id`, which the caller has already
  /// authenticated.
  ///
  /// Validation runs before the limiter, so malformed input never spends a
  /// slot in the window. A rejected call writes nothing.
  pub async fn create(&self, author_id: &str, content: String) -> Result<Post> {
    validate_content(&content)?;

    let decision = self
      .limiter
      .limit(author_id)
      .await
      .map_err(Error::limiter)?;
    if !decision.success {
      tracing::info!(author_id, limit = decision.limit, "post rejected by rate limiter");
      return Err(Error::RateLimited {
        retry_after: decision.retry_after,
      });
    }

    let post = self
      .store
      .create_post(NewPost {
        author_id: author_id.to_owned(),
        content,
      })
      .await
      .map_err(Error::store)?;

    tracing::debug!(post_id = %post.id, author_id, "post created");
    Ok(post)
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::{
    limiter::SlidingWindowLimiter,
    post::MAX_CONTENT_CHARS,
    store::PostQuery,
    testing::{BrokenLimiter, MemoryStore},
  };

  fn writer() -> (Arc<MemoryStore>, PostWriter<MemoryStore, SlidingWindowLimiter>) {
    let store = Arc::new(MemoryStore::default());
    let limiter = Arc::new(SlidingWindowLimiter::new(3, Duration::from_secs(60)));
    (store.clone(), PostWriter::new(store, limiter))
  }

  #[tokio::test(start_paused = true)]
  async fn create_persists_post_for_author() {
    let (store, w) = writer();
    let post = w.create("user_a", "hello".into()).await.unwrap();

    assert_eq!(post.author_id, "user_a");
    assert_eq!(post.content, "hello");

    let listed = store.list_posts(&PostQuery::latest(100)).await.unwrap();
    assert_eq!(listed, vec![post]);
  }

  #[tokio::test(start_paused = true)]
  async fn invalid_content_writes_nothing() {
    let (store, w) = writer();

    let err = w.create("user_a", String::new()).await.unwrap_err();
    assert!(matches!(err, Error::Validation { field: "content", .. }));

    let too_long = "x".repeat(MAX_CONTENT_CHARS + 1);
    let err = w.create("user_a", too_long).await.unwrap_err();
    assert!(matches!(err, Error::Validation { field: "content", .. }));

    assert_eq!(store.len(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn fourth_post_in_window_is_rate_limited() {
    let (store, w) = writer();
    for content in ["a", "b", "c"] {
      w.create("user_a", content.into()).await.unwrap();
    }

    let err = w.create("user_a", "d".into()).await.unwrap_err();
    assert!(matches!(err, Error::RateLimited { retry_after: Some(_) }));
    assert_eq!(store.len(), 3);

    // Another identity is unaffected.
    w.create("user_b", "e".into()).await.unwrap();
    assert_eq!(store.len(), 4);
  }

  #[tokio::test(start_paused = true)]
  async fn validation_failures_do_not_spend_budget() {
    let (store, w) = writer();
    for _ in 0..5 {
      w.create("user_a", String::new()).await.unwrap_err();
    }
    for content in ["a", "b", "c"] {
      w.create("user_a", content.into()).await.unwrap();
    }
    assert_eq!(store.len(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn budget_returns_after_window() {
    let (store, w) = writer();
    for content in ["a", "b", "c"] {
      w.create("user_a", content.into()).await.unwrap();
    }
    tokio::time::advance(Duration::from_secs(60)).await;
    w.create("user_a", "d".into()).await.unwrap();
    assert_eq!(store.len(), 4);
  }

  #[tokio::test]
  async fn limiter_failure_propagates_without_write() {
    let store = Arc::new(MemoryStore::default());
    let w = PostWriter::new(store.clone(), Arc::new(BrokenLimiter));

    let err = w.create("user_a", "hello".into()).await.unwrap_err();
    assert!(matches!(err, Error::Limiter(_)));
    assert_eq!(err.kind(), crate::ErrorKind::Internal);
    assert_eq!(store.len(), 0);
  }
}
