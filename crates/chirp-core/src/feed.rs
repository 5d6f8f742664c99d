//! [`FeedAssembler`] — every read path that returns posts.
//!
//! Posts are read from the store, then joined with author profiles from the
//! identity directory in a single batched lookup. Enrichment is all or nothing:
//! if any post's author cannot be resolved to a named profile, the whole read
//! fails and no partial feed is returned.

use std::{collections::BTreeSet, sync::Arc};

use uuid::Uuid;

use crate::{
  Error, Result,
  directory::IdentityDirectory,
  identity::AuthorProfile,
  post::{EnrichedPost, Post},
  store::{PostQuery, PostStore},
};

/// Upper bound on posts per feed and on identities per directory lookup.
pub const FEED_LIMIT: usize = 100;

pub struct FeedAssembler<S, D> {
  store:     Arc<S>,
  directory: Arc<D>,
}

impl<S, D> FeedAssembler<S, D>
where
  S: PostStore,
  D: IdentityDirectory,
{
  pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
    Self { store, directory }
  }

  /// The [`FEED_LIMIT`] most recent posts, newest first.
  pub async fn get_all(&self) -> Result<Vec<EnrichedPost>> {
    let posts = self
      .store
      .list_posts(&PostQuery::latest(FEED_LIMIT))
      .await
      .map_err(Error::store)?;
    self.add_user_data(posts).await
  }

  /// One post by id. Ids that are not well-formed cannot exist and are
  /// reported as not found.
  pub async fn get_by_id(&self, id: &str) -> Result<EnrichedPost> {
    let uuid =
      Uuid::parse_str(id).map_err(|_| Error::PostNotFound(id.to_owned()))?;
    let post = self
      .store
      .get_post(uuid)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::PostNotFound(id.to_owned()))?;

    let mut enriched = self.add_user_data(vec![post]).await?;
    // One post in, one post out: add_user_data never drops entries.
    enriched.pop().ok_or_else(|| Error::PostNotFound(id.to_owned()))
  }

  /// The [`FEED_LIMIT`] most recent posts by `author_id`, newest first.
  pub async fn get_all_by_author(
    &self,
    author_id: &str,
  ) -> Result<Vec<EnrichedPost>> {
    let posts = self
      .store
      .list_posts(&PostQuery::by_author(author_id, FEED_LIMIT))
      .await
      .map_err(Error::store)?;
    self.add_user_data(posts).await
  }

  /// The single most recent post, without author data.
  pub async fn get_latest(&self) -> Result<Option<Post>> {
    let mut posts = self
      .store
      .list_posts(&PostQuery::latest(1))
      .await
      .map_err(Error::store)?;
    Ok(posts.pop())
  }

  /// The public profile of the identity with handle `username`.
  pub async fn profile_by_username(&self, username: &str) -> Result<AuthorProfile> {
    let record = self
      .directory
      .find_by_username(username)
      .await
      .map_err(Error::directory)?
      .ok_or_else(|| Error::IdentityNotFound(username.to_owned()))?;
    Ok(AuthorProfile::from(&record))
  }

  /// Join each post with its author's profile.
  async fn add_user_data(&self, posts: Vec<Post>) -> Result<Vec<EnrichedPost>> {
    if posts.is_empty() {
      return Ok(Vec::new());
    }

    let author_ids: Vec<String> = posts
      .iter()
      .map(|p| p.author_id.clone())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    let profiles: Vec<AuthorProfile> = self
      .directory
      .lookup_batch(&author_ids, FEED_LIMIT)
      .await
      .map_err(Error::directory)?
      .iter()
      .map(AuthorProfile::from)
      .collect();

    posts
      .into_iter()
      .map(|post| {
        let author = profiles
          .iter()
          .find(|profile| profile.id == post.author_id)
          .cloned()
          .and_then(AuthorProfile::into_author);

        match author {
          Some(author) => Ok(EnrichedPost { post, author }),
          None => {
            tracing::error!(
              post_id = %post.id,
              author_id = %post.author_id,
              "author for post not found"
            );
            Err(Error::AuthorNotFound { post_id: post.id })
          }
        }
      })
      .collect()
  }
}
