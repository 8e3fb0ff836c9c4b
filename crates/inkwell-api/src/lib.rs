//! JSON REST API for Inkwell.
//!
//! Exposes an axum [`Router`] backed by any [`inkwell_core::store::PostStore`].
//! Authentication, TLS and transport concerns are the caller's responsibility:
//! the router trusts the `x-remote-user` header set by an upstream proxy.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", inkwell_api::api_router(state))
//! ```

pub mod error;
pub mod feeds;
pub mod follows;
pub mod groups;
pub mod posts;
pub mod viewer;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use inkwell_core::{feed::FeedBuilder, store::PostStore};

pub use error::ApiError;
pub use viewer::Viewer;

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub feeds: Arc<FeedBuilder<S>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
      feeds: self.feeds.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: PostStore + 'static,
{
  Router::new()
    // Posts
    .route("/posts", get(feeds::global::<S>).post(posts::create::<S>))
    .route(
      "/posts/{id}",
      get(posts::detail::<S>)
        .put(posts::edit::<S>)
        .delete(posts::remove::<S>),
    )
    .route("/posts/{id}/comments", post(posts::comment::<S>))
    // Groups
    .route("/groups", get(groups::list::<S>).post(groups::create::<S>))
    .route(
      "/groups/{slug}",
      put(groups::update::<S>).delete(groups::remove::<S>),
    )
    .route("/groups/{slug}/posts", get(feeds::group::<S>))
    // Profiles and follows
    .route("/profiles/{username}/posts", get(feeds::profile::<S>))
    .route(
      "/profiles/{username}/follow",
      post(follows::follow::<S>).delete(follows::unfollow::<S>),
    )
    .route("/follow/posts", get(feeds::followed::<S>))
    // Cache
    .route("/cache/feed", delete(feeds::clear_cache::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
