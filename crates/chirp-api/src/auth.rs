//! HTTP Basic-auth extractor resolving the caller to an identity.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chirp_core::{
  directory::IdentityDirectory, limiter::RateLimiter, store::PostStore,
};

use crate::{AppState, error::ApiError};

/// Present in a handler means the request carried valid credentials for
/// `identity_id`.
#[derive(Debug, Clone)]
pub struct Authenticated {
  pub identity_id: String,
}

/// Split a `Basic` authorization header into login and password.
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthenticated)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthenticated)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthenticated)?;
  let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthenticated)?;

  let (login, password) = creds.split_once(':').ok_or(ApiError::Unauthenticated)?;
  Ok((login.to_owned(), password.to_owned()))
}

/// Verify Basic credentials against `directory` and return the identity id.
pub async fn verify_auth<D>(headers: &HeaderMap, directory: &D) -> Result<String, ApiError>
where
  D: IdentityDirectory,
{
  let (login, password) = basic_credentials(headers)?;

  let creds = directory
    .credentials(&login)
    .await
    .map_err(|e| chirp_core::Error::Directory(Box::new(e)))?
    .ok_or(ApiError::Unauthenticated)?;

  let parsed_hash = PasswordHash::new(&creds.password_hash)
    .map_err(|_| ApiError::Unauthenticated)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthenticated)?;

  Ok(creds.identity_id)
}

impl<S, D, L> FromRequestParts<AppState<S, D, L>> for Authenticated
where
  S: PostStore + 'static,
  D: IdentityDirectory + 'static,
  L: RateLimiter + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, D, L>,
  ) -> Result<Self, Self::Rejection> {
    let identity_id = verify_auth(&parts.headers, state.directory.as_ref()).await?;
    Ok(Authenticated { identity_id })
  }
}
