//! Feed composition: which posts a feed shows, in what order, one page at a
//! time.
//!
//! [`FeedBuilder::resolve_feed`] is the single entry point for request
//! handlers. The four `*_feed` methods expose the unpaginated sequences.

use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
  Error, Result,
  cache::{CacheKey, FeedCache},
  paginate::{DEFAULT_PAGE_SIZE, Page, PageNumber, paginate},
  post::{Group, Post},
  store::{PostQuery, PostStore},
  user::{Follow, User},
};

/// How long a resolved global feed page stays cached unless configured
/// otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(20);

/// The feed a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
  Global,
  Group { slug: String },
  Profile { username: String },
  /// Posts by the authors the viewer follows; needs a viewer.
  Followed,
}

/// Feed-specific context delivered alongside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedMeta {
  Global,
  Group {
    group: Group,
  },
  Profile {
    author:     User,
    post_count: usize,
    /// Whether the viewer follows `author`; `false` for anonymous viewers.
    following:  bool,
  },
  Followed,
}

/// The page object handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedPage {
  pub meta: FeedMeta,
  pub page: Page<Post>,
}

#[derive(Debug, Clone, Copy)]
pub struct FeedSettings {
  pub page_size: NonZeroUsize,
  pub cache_ttl: Duration,
}

impl Default for FeedSettings {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
      cache_ttl: DEFAULT_CACHE_TTL,
    }
  }
}

/// Builds feeds from a [`PostStore`], caching the global feed in the injected
/// [`FeedCache`].
pub struct FeedBuilder<S> {
  store:    Arc<S>,
  cache:    Arc<dyn FeedCache>,
  settings: FeedSettings,
  /// Serialises cache misses so one request fills an entry and concurrent
  /// ones reuse it.
  fill:     Mutex<()>,
}

impl<S: PostStore> FeedBuilder<S> {
  pub fn new(
    store: Arc<S>,
    cache: Arc<dyn FeedCache>,
    settings: FeedSettings,
  ) -> Self {
    Self { store, cache, settings, fill: Mutex::new(()) }
  }

  /// Drop every cached page. The next global feed request recomputes.
  pub fn clear_cache(&self) {
    debug!("clearing feed cache");
    self.cache.clear();
  }

  // ── Sequences ─────────────────────────────────────────────────────────

  /// Every post, newest first.
  pub async fn global_feed(&self) -> Result<Vec<Post>> {
    self.posts(&PostQuery::all()).await
  }

  /// Posts in the group with `slug`, newest first.
  pub async fn group_feed(&self, slug: &str) -> Result<Vec<Post>> {
    let (_, posts) = self.group_posts(slug).await?;
    Ok(posts)
  }

  /// Posts written by `username`, newest first.
  pub async fn profile_feed(&self, username: &str) -> Result<Vec<Post>> {
    let (_, posts) = self.profile_posts(username).await?;
    Ok(posts)
  }

  /// Posts by every author `viewer` follows, newest first. Empty if the viewer
  /// follows nobody.
  pub async fn followed_feed(&self, viewer: Option<&User>) -> Result<Vec<Post>> {
    let viewer = viewer.ok_or(Error::Unauthenticated)?;
    self.posts(&PostQuery::followed_by(viewer.user_id)).await
  }

  // ── Entry point ───────────────────────────────────────────────────────

  /// Resolve one page of the feed described by `kind`.
  ///
  /// Global feed pages are served from the cache while fresh, so posts
  /// created within the TTL may not appear yet.
  pub async fn resolve_feed(
    &self,
    kind: &FeedKind,
    viewer: Option<&User>,
    page: PageNumber,
  ) -> Result<Arc<FeedPage>> {
    let (meta, posts) = match kind {
      FeedKind::Global => return self.resolve_global(page).await,
      FeedKind::Group { slug } => {
        let (group, posts) = self.group_posts(slug).await?;
        (FeedMeta::Group { group }, posts)
      }
      FeedKind::Profile { username } => {
        let (author, posts) = self.profile_posts(username).await?;
        let following = match viewer {
          Some(v) => self.is_following(v, &author).await?,
          None => false,
        };
        let post_count = posts.len();
        (FeedMeta::Profile { author, post_count, following }, posts)
      }
      FeedKind::Followed => (FeedMeta::Followed, self.followed_feed(viewer).await?),
    };

    Ok(Arc::new(FeedPage {
      meta,
      page: paginate(posts, self.settings.page_size, page),
    }))
  }

  async fn resolve_global(&self, page: PageNumber) -> Result<Arc<FeedPage>> {
    let key = CacheKey::GlobalFeed { page };
    if let Some(hit) = self.cache.get(&key) {
      debug!(page = page.get(), "global feed cache hit");
      return Ok(hit);
    }

    let _filling = self.fill.lock().await;
    if let Some(hit) = self.cache.get(&key) {
      debug!(page = page.get(), "global feed filled while waiting");
      return Ok(hit);
    }
    debug!(page = page.get(), "global feed cache miss");

    let posts = self.global_feed().await?;
    let resolved = Arc::new(FeedPage {
      meta: FeedMeta::Global,
      page: paginate(posts, self.settings.page_size, page),
    });
    self.cache.set(key, resolved.clone(), self.settings.cache_ttl);
    Ok(resolved)
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
    let mut posts = self.store.list_posts(query).await.map_err(Error::store)?;
    // Backends already order; re-sorting pins the contract regardless.
    posts.sort_by(Post::feed_order);
    Ok(posts)
  }

  async fn group_posts(&self, slug: &str) -> Result<(Group, Vec<Post>)> {
    let group = self
      .store
      .get_group_by_slug(slug)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("group", slug))?;
    let posts = self.posts(&PostQuery::in_group(group.group_id)).await?;
    Ok((group, posts))
  }

  async fn profile_posts(&self, username: &str) -> Result<(User, Vec<Post>)> {
    let author = self
      .store
      .get_user_by_username(username)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("user", username))?;
    let posts = self.posts(&PostQuery::by_author(author.user_id)).await?;
    Ok((author, posts))
  }

  async fn is_following(&self, viewer: &User, author: &User) -> Result<bool> {
    self
      .store
      .is_following(Follow {
        user_id:   viewer.user_id,
        author_id: author.user_id,
      })
      .await
      .map_err(Error::store)
  }
}
