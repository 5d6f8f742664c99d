//! JSON RPC-style API for Chirp.
//!
//! Exposes an axum [`Router`] backed by any combination of
//! [`PostStore`], [`IdentityDirectory`], and [`RateLimiter`]. Procedures are
//! named `<router>.<procedure>` and mounted under `/trpc`. TLS and tracing
//! layers are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", chirp_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod extract;
pub mod posts;
pub mod profile;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use chirp_core::{
  directory::IdentityDirectory, feed::FeedAssembler, limiter::RateLimiter,
  store::PostStore, writer::PostWriter,
};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, D, L> {
  pub feed:      Arc<FeedAssembler<S, D>>,
  pub writer:    Arc<PostWriter<S, L>>,
  pub directory: Arc<D>,
}

impl<S, D, L> AppState<S, D, L>
where
  S: PostStore,
  D: IdentityDirectory,
  L: RateLimiter,
{
  pub fn new(store: Arc<S>, directory: Arc<D>, limiter: Arc<L>) -> Self {
    Self {
      feed: Arc::new(FeedAssembler::new(store.clone(), directory.clone())),
      writer: Arc::new(PostWriter::new(store, limiter)),
      directory,
    }
  }
}

// Manual impl: a derive would demand `S: Clone` and friends.
impl<S, D, L> Clone for AppState<S, D, L> {
  fn clone(&self) -> Self {
    Self {
      feed:      self.feed.clone(),
      writer:    self.writer.clone(),
      directory: self.directory.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, D, L>(state: AppState<S, D, L>) -> Router<()>
where
  S: PostStore + 'static,
  D: IdentityDirectory + 'static,
  L: RateLimiter + 'static,
{
  Router::new()
    // Posts
    .route("/trpc/posts.getAll", get(posts::get_all::<S, D, L>))
    .route("/trpc/posts.getById", get(posts::get_by_id::<S, D, L>))
    .route("/trpc/posts.getAllByUserId", get(posts::get_all_by_user_id::<S, D, L>))
    .route("/trpc/posts.getLatest", get(posts::get_latest::<S, D, L>))
    .route("/trpc/posts.create", post(posts::create::<S, D, L>))
    // Profiles
    .route(
      "/trpc/profile.getUserByUsername",
      get(profile::get_user_by_username::<S, D, L>),
    )
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
