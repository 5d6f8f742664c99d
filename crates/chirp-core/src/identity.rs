//! Identity records and the public author profile projected from them.
//!
//! The identity directory is the source of truth for display names and
//! pictures. Only [`AuthorProfile`] (or its named form, [`Author`]) is ever
//! handed to clients; the rest of the record stays inside the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A full identity as held by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
  pub id:         String,
  /// The identity's handle. Identities created without one have none.
  pub username:   Option<String>,
  pub image_url:  String,
  pub created_at: DateTime<Utc>,
}

/// Login material for an identity, used only by authentication.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub identity_id:   String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

// ─── Client-facing projections ───────────────────────────────────────────────

/// The subset of an identity that may be shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorProfile {
  pub id:              String,
  pub name:            Option<String>,
  pub profile_picture: String,
}

impl From<&IdentityRecord> for AuthorProfile {
  fn from(record: &IdentityRecord) -> Self {
    Self {
      id:              record.id.clone(),
      name:            record.username.clone(),
      profile_picture: record.image_url.clone(),
    }
  }
}

impl AuthorProfile {
  /// Promote to an [`Author`], or `None` if the profile has no name.
  pub fn into_author(self) -> Option<Author> {
    let name = self.name?;
    Some(Author {
      id: self.id,
      name,
      profile_picture: self.profile_picture,
    })
  }
}

/// An author profile whose name is known to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
  pub id:              String,
  pub name:            String,
  pub profile_picture: String,
}
