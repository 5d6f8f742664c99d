//! Handler for `GET /trpc/profile.getUserByUsername`.

use axum::{
  Json,
  extract::State,
};
use chirp_core::{
  directory::IdentityDirectory, identity::AuthorProfile, limiter::RateLimiter,
  store::PostStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, extract::QueryParams};

#[derive(Debug, Deserialize)]
pub struct UsernameParams {
  /// The handle, with or without a leading `@`.
  pub username: String,
}

/// `GET /trpc/profile.getUserByUsername?username=<handle>`
pub async fn get_user_by_username<S, D, L>(
  State(state): State<AppState<S, D, L>>,
  QueryParams(params): QueryParams<UsernameParams>,
) -> Result<Json<AuthorProfile>, ApiError>
where
  S: PostStore + 'static,
  D: IdentityDirectory + 'static,
  L: RateLimiter + 'static,
{
  let username = params
    .username
    .strip_prefix('@')
    .unwrap_or(params.username.as_str());
  Ok(Json(state.feed.profile_by_username(username).await?))
}
