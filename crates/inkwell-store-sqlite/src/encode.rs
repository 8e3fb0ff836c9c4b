//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed microsecond
//! precision, so that string order in SQL equals chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use inkwell_core::{
  post::{Comment, Group, Post},
  user::User,
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column lists ────────────────────────────────────────────────────────────

/// Columns read by [`RawPost::from_row`], in order.
pub const POST_COLUMNS: &str = "
  SELECT p.post_id, p.text, p.created_at, p.image,
         u.user_id, u.username, u.joined_at,
         g.group_id, g.title, g.slug, g.description
  FROM posts p
  JOIN users u            ON u.user_id  = p.author_id
  LEFT JOIN post_groups g ON g.group_id = p.group_id";

/// Columns read by [`RawComment::from_row`], in order.
pub const COMMENT_COLUMNS: &str = "
  SELECT c.comment_id, c.post_id, c.text, c.created_at,
         u.user_id, u.username, u.joined_at
  FROM comments c
  JOIN users u ON u.user_id = c.author_id";

pub const USER_COLUMNS: &str = "SELECT user_id, username, joined_at FROM users";

pub const GROUP_COLUMNS: &str =
  "SELECT group_id, title, slug, description FROM post_groups";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:   i64,
  pub username:  String,
  pub joined_at: String,
}

impl RawUser {
  /// Read three user columns starting at `at`.
  pub fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:   row.get(at)?,
      username:  row.get(at + 1)?,
      joined_at: row.get(at + 2)?,
    })
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> { Self::from_row_at(row, 0) }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:   self.user_id,
      username:  self.username,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}

/// A `post_groups` row. Every column is nullable here because posts read it
/// through a LEFT JOIN.
pub struct RawGroup {
  pub group_id:    Option<i64>,
  pub title:       Option<String>,
  pub slug:        Option<String>,
  pub description: Option<String>,
}

impl RawGroup {
  pub fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      group_id:    row.get(at)?,
      title:       row.get(at + 1)?,
      slug:        row.get(at + 2)?,
      description: row.get(at + 3)?,
    })
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> { Self::from_row_at(row, 0) }

  pub fn into_group(self) -> Option<Group> {
    Some(Group {
      group_id:    self.group_id?,
      title:       self.title?,
      slug:        self.slug?,
      description: self.description.unwrap_or_default(),
    })
  }
}

pub struct RawPost {
  pub post_id:    i64,
  pub text:       String,
  pub created_at: String,
  pub image:      Option<String>,
  pub author:     RawUser,
  pub group:      RawGroup,
}

impl RawPost {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:    row.get(0)?,
      text:       row.get(1)?,
      created_at: row.get(2)?,
      image:      row.get(3)?,
      author:     RawUser::from_row_at(row, 4)?,
      group:      RawGroup::from_row_at(row, 7)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:    self.post_id,
      text:       self.text,
      created_at: decode_dt(&self.created_at)?,
      author:     self.author.into_user()?,
      group:      self.group.into_group(),
      image:      self.image,
    })
  }
}

pub struct RawComment {
  pub comment_id: i64,
  pub post_id:    i64,
  pub text:       String,
  pub created_at: String,
  pub author:     RawUser,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      post_id:    row.get(1)?,
      text:       row.get(2)?,
      created_at: row.get(3)?,
      author:     RawUser::from_row_at(row, 4)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: self.comment_id,
      post_id:    self.post_id,
      author:     self.author.into_user()?,
      text:       self.text,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
