//! Feed page handlers.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/posts?page=N` | global feed, cached |
//! | `GET`    | `/groups/{slug}/posts?page=N` | 404 for an unknown slug |
//! | `GET`    | `/profiles/{username}/posts?page=N` | 404 for an unknown user |
//! | `GET`    | `/follow/posts?page=N` | viewer required |
//! | `DELETE` | `/cache/feed` | viewer required |
//!
//! A missing or malformed `page` means page 1; a page past the end returns
//! the last page.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use inkwell_core::{
  feed::{FeedKind, FeedPage},
  paginate::PageNumber,
  store::PostStore,
};
use serde::Deserialize;
use tracing::info;

use crate::{AppState, Viewer, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  /// Kept as a raw string so that garbage falls back to page 1 instead of
  /// failing extraction.
  pub page: Option<String>,
}

impl PageParams {
  pub fn number(&self) -> PageNumber { PageNumber::parse(self.page.as_deref()) }
}

async fn resolve<S>(
  state: &AppState<S>,
  kind: FeedKind,
  viewer: &Viewer,
  params: &PageParams,
) -> Result<Json<FeedPage>, ApiError>
where
  S: PostStore + 'static,
{
  let page = state
    .feeds
    .resolve_feed(&kind, viewer.user(), params.number())
    .await?;
  Ok(Json(Arc::unwrap_or_clone(page)))
}

/// `GET /posts`
pub async fn global<S>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Query(params): Query<PageParams>,
) -> Result<Json<FeedPage>, ApiError>
where
  S: PostStore + 'static,
{
  resolve(&state, FeedKind::Global, &viewer, &params).await
}

/// `GET /groups/{slug}/posts`
pub async fn group<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  viewer: Viewer,
  Query(params): Query<PageParams>,
) -> Result<Json<FeedPage>, ApiError>
where
  S: PostStore + 'static,
{
  resolve(&state, FeedKind::Group { slug }, &viewer, &params).await
}

/// `GET /profiles/{username}/posts`
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  Path(username): Path<String>,
  viewer: Viewer,
  Query(params): Query<PageParams>,
) -> Result<Json<FeedPage>, ApiError>
where
  S: PostStore + 'static,
{
  resolve(&state, FeedKind::Profile { username }, &viewer, &params).await
}

/// `GET /follow/posts`
pub async fn followed<S>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Query(params): Query<PageParams>,
) -> Result<Json<FeedPage>, ApiError>
where
  S: PostStore + 'static,
{
  resolve(&state, FeedKind::Followed, &viewer, &params).await
}

/// `DELETE /cache/feed`
pub async fn clear_cache<S>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
) -> Result<StatusCode, ApiError>
where
  S: PostStore + 'static,
{
  let user = viewer.require()?;
  info!(by = %user.username, "feed cache cleared");
  state.feeds.clear_cache();
  Ok(StatusCode::NO_CONTENT)
}
