//! Error types for `chirp-core`.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// An input failed a declared constraint.
  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  /// The caller has exhausted its write budget for the current window.
  #[error("too many requests")]
  RateLimited { retry_after: Option<Duration> },

  #[error("post not found: {0}")]
  PostNotFound(String),

  #[error("identity not found: {0}")]
  IdentityNotFound(String),

  /// A post in a feed batch has no resolvable, named author.
  #[error("author for post {post_id} not found")]
  AuthorNotFound { post_id: Uuid },

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("identity directory error: {0}")]
  Directory(#[source] BoxError),

  #[error("rate limiter error: {0}")]
  Limiter(#[source] BoxError),
}

/// Coarse classification used at the RPC boundary to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  RateLimited,
  NotFound,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation { .. } => ErrorKind::Validation,
      Self::RateLimited { .. } => ErrorKind::RateLimited,
      Self::PostNotFound(_) | Self::IdentityNotFound(_) => ErrorKind::NotFound,
      Self::AuthorNotFound { .. }
      | Self::Store(_)
      | Self::Directory(_)
      | Self::Limiter(_) => ErrorKind::Internal,
    }
  }

  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub(crate) fn directory(
    e: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Directory(Box::new(e))
  }

  pub(crate) fn limiter(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Limiter(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
