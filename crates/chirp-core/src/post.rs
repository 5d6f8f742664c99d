//! Post types — the one persisted entity in Chirp.
//!
//! Posts are append-only: once written, no field is ever updated and no post is
//! ever deleted. The enriched, author-joined shape returned by feed reads is
//! derived per request and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, identity::Author};

/// Inclusive upper bound on post length, in characters.
pub const MAX_CONTENT_CHARS: usize = 255;

// ─── Post ────────────────────────────────────────────────────────────────────

/// A stored post. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub id:         Uuid,
  pub content:    String,
  /// Identifier of the authoring identity in the identity directory.
  pub author_id:  String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::PostStore::create_post`].
#[derive(Debug, Clone)]
pub struct NewPost {
  pub author_id: String,
  pub content:   String,
}

/// Check that `content` holds between 1 and [`MAX_CONTENT_CHARS`] characters.
pub fn validate_content(content: &str) -> Result<()> {
  let len = content.chars().count();
  if len == 0 {
    return Err(Error::Validation {
      field:   "content",
      message: "must contain at least 1 character".to_owned(),
    });
  }
  if len > MAX_CONTENT_CHARS {
    return Err(Error::Validation {
      field:   "content",
      message: format!(
        "must contain at most {MAX_CONTENT_CHARS} characters (got {len})"
      ),
    });
  }
  Ok(())
}

// ─── EnrichedPost ────────────────────────────────────────────────────────────

/// A post joined with its author's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedPost {
  pub post:   Post,
  pub author: Author,
}
