//! The `IdentityDirectory` trait.
//!
//! Identities live outside the post store. Feed reads resolve authors through
//! this trait in one batched call per page; the API layer uses it to check
//! credentials and to look up profiles by handle.

use std::future::Future;

use crate::identity::{Credentials, IdentityRecord};

pub trait IdentityDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the records for `ids`, returning at most `limit` of them. Unknown
  /// ids are skipped, not reported.
  fn lookup_batch<'a>(
    &'a self,
    ids: &'a [String],
    limit: usize,
  ) -> impl Future<Output = Result<Vec<IdentityRecord>, Self::Error>> + Send + 'a;

  /// Find the identity whose handle is exactly `username`.
  fn find_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<IdentityRecord>, Self::Error>> + Send + 'a;

  /// Fetch login material for `login`, which may be a username or an
  /// identity id.
  fn credentials<'a>(
    &'a self,
    login: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;
}
