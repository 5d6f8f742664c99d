//! Handlers for the `posts.*` procedures.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/trpc/posts.getAll` | Up to 100 newest posts with authors |
//! | `GET`  | `/trpc/posts.getById` | `?id=<uuid>`; 404 if not found |
//! | `GET`  | `/trpc/posts.getAllByUserId` | `?userId=<identity id>` |
//! | `GET`  | `/trpc/posts.getLatest` | Newest post without author, or `null` |
//! | `POST` | `/trpc/posts.create` | Basic auth; body `{"content":"..."}`; returns 201 |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chirp_core::{
  directory::IdentityDirectory,
  limiter::RateLimiter,
  post::{EnrichedPost, Post},
  store::PostStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::{JsonBody, QueryParams},
};

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /trpc/posts.getAll`
pub async fn get_all<S, D, L>(
  State(state): State<AppState<S, D, L>>,
) -> Result<Json<Vec<EnrichedPost>>, ApiError>
where
  S: PostStore + 'static,
  D: IdentityDirectory + 'static,
  L: RateLimiter + 'static,
{
  Ok(Json(state.feed.get_all().await?))
}

#[derive(Debug, Deserialize)]
pub struct ByIdParams {
  pub id: String,
}

/// `GET /trpc/posts.getById?id=<uuid>`
pub async fn get_by_id<S, D, L>(
  State(state): State<AppState<S, D, L>>,
  QueryParams(params): QueryParams<ByIdParams>,
) -> Result<Json<EnrichedPost>, ApiError>
where
  S: PostStore + 'static,
  D: IdentityDirectory + 'static,
  L: RateLimiter + 'static,
{
  Ok(Json(state.feed.get_by_id(&params.id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByUserParams {
  pub user_id: String,
}

/// `GET /trpc/posts.getAllByUserId?userId=<identity id>`
pub async fn get_all_by_user_id<S, D, L>(
  State(state): State<AppState<S, D, L>>,
  QueryParams(params): QueryParams<ByUserParams>,
) -> Result<Json<Vec<EnrichedPost>>, ApiError>
where
  S: PostStore + 'static,
  D: IdentityDirectory + 'static,
  L: RateLimiter + 'static,
{
  Ok(Json(state.feed.get_all_by_author(&params.user_id).await?))
}

/// `GET /trpc/posts.getLatest`
pub async fn get_latest<S, D, L>(
  State(state): State<AppState<S, D, L>>,
) -> Result<Json<Option<Post>>, ApiError>
where
  S: PostStore + 'static,
  D: IdentityDirectory + 'static,
  L: RateLimiter + 'static,
{
  Ok(Json(state.feed.get_latest().await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /trpc/posts.create`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub content: String,
}

/// `POST /trpc/posts.create` — returns 201 + the stored [`Post`].
pub async fn create<S, D, L>(
  State(state): State<AppState<S, D, L>>,
  auth: Authenticated,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PostStore + 'static,
  D: IdentityDirectory + 'static,
  L: RateLimiter + 'static,
{
  let post = state.writer.create(&auth.identity_id, body.content).await?;
  Ok((StatusCode::CREATED, Json(post)))
}
