//! [`IdentityDirectory`] over the `identities` table.

use chirp_core::{
  directory::IdentityDirectory,
  identity::{Credentials, IdentityRecord},
};
use rusqlite::OptionalExtension as _;

use crate::{Error, Result, SqliteStore, encode::RawIdentity};

impl IdentityDirectory for SqliteStore {
  type Error = Error;

  async fn lookup_batch(
    &self,
    ids: &[String],
    limit: usize,
  ) -> Result<Vec<IdentityRecord>> {
    if ids.is_empty() || limit == 0 {
      return Ok(Vec::new());
    }

    let ids       = ids.to_vec();
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawIdentity> = self
      .conn
      .call(move |conn| {
        let placeholders = (1..=ids.len())
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");
        let sql = format!(
          "SELECT identity_id, username, image_url, created_at
           FROM identities
           WHERE identity_id IN ({placeholders})
           LIMIT {limit_val}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(ids.iter()), RawIdentity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIdentity::into_record).collect()
  }

  async fn find_by_username(&self, username: &str) -> Result<Option<IdentityRecord>> {
    let username = username.to_owned();

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT identity_id, username, image_url, created_at
               FROM identities WHERE username = ?1",
              rusqlite::params![username],
              RawIdentity::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_record).transpose()
  }

  async fn credentials(&self, login: &str) -> Result<Option<Credentials>> {
    let login = login.to_owned();

    let creds = self
      .conn
      .call(move |conn| {
        // A username match wins over an id match for the same string.
        Ok(
          conn
            .query_row(
              "SELECT identity_id, password_hash
               FROM identities
               WHERE username = ?1 OR identity_id = ?1
               ORDER BY (username = ?1) DESC
               LIMIT 1",
              rusqlite::params![login],
              |row| {
                Ok(Credentials {
                  identity_id:   row.get(0)?,
                  password_hash: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(creds)
  }
}
