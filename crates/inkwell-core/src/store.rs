//! The `PostStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `inkwell-store-sqlite`).
//! The feed builder and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  post::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostEdit},
  user::{Follow, User},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Filters for [`PostStore::list_posts`]. Every set field must match; an empty
/// query selects all posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostQuery {
  pub author_id:   Option<i64>,
  pub group_id:    Option<i64>,
  /// Restrict to authors followed by this user.
  pub followed_by: Option<i64>,
}

impl PostQuery {
  pub fn all() -> Self { Self::default() }

  pub fn by_author(author_id: i64) -> Self {
    Self { author_id: Some(author_id), ..Self::default() }
  }

  pub fn in_group(group_id: i64) -> Self {
    Self { group_id: Some(group_id), ..Self::default() }
  }

  pub fn followed_by(user_id: i64) -> Self {
    Self { followed_by: Some(user_id), ..Self::default() }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an Inkwell post store backend.
///
/// Backends enforce uniqueness of usernames, group slugs and `(user, author)`
/// follow edges, and apply the delete policies: removing a group clears the
/// group of its posts; removing a user removes their posts, comments and
/// follow edges; removing a post removes its comments.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PostStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Return the user with `username`, creating the row if it is absent.
  fn ensure_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Delete a user and everything that cascades from it. Returns `false` if
  /// the user did not exist.
  fn delete_user(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  fn add_group(
    &self,
    input: NewGroup,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + 'a;

  /// All groups ordered by title.
  fn list_groups(
    &self,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  /// Replace title, slug and description. Returns `None` if the group does
  /// not exist.
  fn update_group(
    &self,
    group_id: i64,
    input: NewGroup,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  fn delete_group(
    &self,
    group_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Persist a new post. The `created_at` timestamp is set by the store.
  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    post_id: i64,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Replace the editable fields of a post. Returns `None` if the post does
  /// not exist.
  fn update_post(
    &self,
    post_id: i64,
    edit: PostEdit,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  fn delete_post(
    &self,
    post_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Posts matching `query`, ordered by [`Post::feed_order`].
  fn list_posts<'a>(
    &'a self,
    query: &'a PostQuery,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + 'a;

  // ── Comments ──────────────────────────────────────────────────────────

  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments on a post, newest first.
  fn list_comments(
    &self,
    post_id: i64,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Follows ───────────────────────────────────────────────────────────

  /// Create the edge if absent. Returns `true` if a new edge was created.
  fn follow(
    &self,
    edge: Follow,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete the edge if present. Returns `true` if an edge was removed.
  fn unfollow(
    &self,
    edge: Follow,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn is_following(
    &self,
    edge: Follow,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Authors followed by `user_id`, ordered by username.
  fn list_following(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;
}
