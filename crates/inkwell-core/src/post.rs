//! Posts, the groups they may belong to, and comments on them.

use std::{cmp::Ordering, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, user::User};

// ─── Group ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub group_id:    i64,
  pub title:       String,
  /// Unique across all groups.
  pub slug:        String,
  pub description: String,
}

impl fmt::Display for Group {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&truncate_chars(&self.title, 25))
  }
}

/// Input to [`crate::store::PostStore::add_group`] and
/// [`crate::store::PostStore::update_group`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
  pub title:       String,
  pub slug:        String,
  #[serde(default)]
  pub description: String,
}

impl NewGroup {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("group title must not be empty".into()));
    }
    if self.slug.trim().is_empty() {
      return Err(Error::Validation("group slug must not be empty".into()));
    }
    Ok(())
  }
}

// ─── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:    i64,
  pub text:       String,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  pub author:     User,
  /// Cleared when the group is deleted; the post itself survives.
  pub group:      Option<Group>,
  /// Opaque reference to a stored image; media storage lives elsewhere.
  pub image:      Option<String>,
}

impl Post {
  /// The ordering shared by every feed: newest first, later insertion first
  /// among equal timestamps.
  pub fn feed_order(a: &Post, b: &Post) -> Ordering {
    b.created_at
      .cmp(&a.created_at)
      .then_with(|| b.post_id.cmp(&a.post_id))
  }

  pub fn is_authored_by(&self, user: &User) -> bool {
    self.author.user_id == user.user_id
  }
}

impl fmt::Display for Post {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&truncate_chars(&self.text, 15))
  }
}

/// Input to [`crate::store::PostStore::create_post`].
/// `created_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub author_id: i64,
  pub text:      String,
  pub group_id:  Option<i64>,
  pub image:     Option<String>,
}

/// Replacement values for the editable fields of a post.
#[derive(Debug, Clone)]
pub struct PostEdit {
  pub text:     String,
  pub group_id: Option<i64>,
  pub image:    Option<String>,
}

// ─── Comment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: i64,
  pub post_id:    i64,
  pub author:     User,
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id:   i64,
  pub author_id: i64,
  pub text:      String,
}

/// Reject blank post or comment bodies.
pub fn validate_text(text: &str) -> Result<()> {
  if text.trim().is_empty() {
    return Err(Error::Validation("text must not be empty".into()));
  }
  Ok(())
}

fn truncate_chars(s: &str, max: usize) -> String { s.chars().take(max).collect() }
