//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is returned as `{"error": {"code": ..., "message": ...}}`,
//! with the code naming the error class.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use chirp_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// Sent in place of the details of collaborator failures.
const INTERNAL_MESSAGE: &str = "internal server error";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// A write was attempted without valid credentials.
  #[error("unauthenticated")]
  Unauthenticated,

  /// The request body is missing, not JSON, or has the wrong shape.
  #[error("invalid request body: {0}")]
  Body(#[from] JsonRejection),

  /// The query string is missing a parameter or has the wrong shape.
  #[error("invalid query: {0}")]
  Query(#[from] QueryRejection),

  #[error(transparent)]
  Core(#[from] chirp_core::Error),
}

impl ApiError {
  fn status_and_code(&self) -> (StatusCode, &'static str) {
    match self {
      ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
      ApiError::Body(_) | ApiError::Query(_) => {
        (StatusCode::BAD_REQUEST, "BAD_REQUEST")
      }
      ApiError::Core(e) => match e.kind() {
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        ErrorKind::RateLimited => {
          (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS")
        }
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Internal => {
          (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
        }
      },
    }
  }

  /// The client-facing message. Collaborator failures stay in the logs.
  fn public_message(&self) -> String {
    match self {
      ApiError::Core(
        chirp_core::Error::Store(_)
        | chirp_core::Error::Directory(_)
        | chirp_core::Error::Limiter(_),
      ) => INTERNAL_MESSAGE.to_owned(),
      other => other.to_string(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = self.status_and_code();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let body = json!({ "error": { "code": code, "message": self.public_message() } });
    let mut res = (status, Json(body)).into_response();

    match &self {
      ApiError::Unauthenticated => {
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"chirp\""),
        );
      }
      ApiError::Core(chirp_core::Error::RateLimited {
        retry_after: Some(wait),
      }) => {
        // Round up so clients never retry a moment too early.
        let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
        res.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs));
      }
      _ => {}
    }

    res
  }
}

#[cfg(test)]
mod tests {
  use std::io;

  use serde_json::Value;
  use uuid::Uuid;

  use super::*;

  async fn render(err: ApiError) -> (StatusCode, Value) {
    let resp = err.into_response();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn store_failure_message_is_generic() {
    let source = io::Error::other("disk I/O error at /var/lib/chirp/chirp.db");
    let err = ApiError::Core(chirp_core::Error::Store(Box::new(source)));

    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["error"]["message"], INTERNAL_MESSAGE);
  }

  #[tokio::test]
  async fn directory_and_limiter_failures_are_generic() {
    for err in [
      chirp_core::Error::Directory(Box::new(io::Error::other("no such table"))),
      chirp_core::Error::Limiter(Box::new(io::Error::other("database is locked"))),
    ] {
      let (_, body) = render(ApiError::Core(err)).await;
      assert_eq!(body["error"]["message"], INTERNAL_MESSAGE);
    }
  }

  #[tokio::test]
  async fn author_not_found_keeps_its_message() {
    let post_id = Uuid::new_v4();
    let err = ApiError::Core(chirp_core::Error::AuthorNotFound { post_id });

    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
      body["error"]["message"],
      format!("author for post {post_id} not found")
    );
  }
}
