//! Users and the follow relation between them.
//!
//! Identity is owned by an upstream collaborator. The store keeps one row per
//! known username so that posts, comments and follow edges can reference it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:   i64,
  pub username:  String,
  /// When the store first saw this username.
  pub joined_at: DateTime<Utc>,
}

/// A directed "`user` is subscribed to `author`'s posts" edge.
///
/// `(user_id, author_id)` is unique. Nothing here forbids
/// `user_id == author_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Follow {
  pub user_id:   i64,
  pub author_id: i64,
}
