//! [`SqliteStore`] — the SQLite implementation of [`PostStore`].

use std::path::Path;

use chrono::Utc;
use inkwell_core::{
  post::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostEdit},
  store::{PostQuery, PostStore},
  user::{Follow, User},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Error, Result,
  encode::{
    COMMENT_COLUMNS, GROUP_COLUMNS, POST_COLUMNS, RawComment, RawGroup, RawPost,
    RawUser, USER_COLUMNS, encode_dt,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Inkwell post store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::info!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn query_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Option<RawPost>> {
  conn
    .query_row(
      &format!("{POST_COLUMNS} WHERE p.post_id = ?1"),
      rusqlite::params![post_id],
      RawPost::from_row,
    )
    .optional()
}

fn query_group(conn: &Connection, group_id: i64) -> rusqlite::Result<Option<RawGroup>> {
  conn
    .query_row(
      &format!("{GROUP_COLUMNS} WHERE group_id = ?1"),
      rusqlite::params![group_id],
      RawGroup::from_row,
    )
    .optional()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Map a raw group row to a [`Group`]; rows read straight from `post_groups`
/// always have every column.
fn group_from_raw(raw: RawGroup) -> Result<Group> {
  raw.into_group().ok_or(Error::MissingRow("post_groups"))
}

// ─── PostStore impl ──────────────────────────────────────────────────────────

impl PostStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn ensure_user(&self, username: &str) -> Result<User> {
    let username = username.to_owned();
    let at_str   = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO users (username, joined_at) VALUES (?1, ?2)",
          rusqlite::params![username, at_str],
        )?;
        Ok(conn.query_row(
          &format!("{USER_COLUMNS} WHERE username = ?1"),
          rusqlite::params![username],
          RawUser::from_row,
        )?)
      })
      .await?;

    raw.into_user()
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("{USER_COLUMNS} WHERE username = ?1"),
            rusqlite::params![username],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_user(&self, user_id: i64) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![user_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn add_group(&self, input: NewGroup) -> Result<Group> {
    let slug = input.slug.clone();

    let inserted: Option<i64> = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
          rusqlite::params![input.title, input.slug, input.description],
        ) {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let group_id = inserted.ok_or(Error::SlugTaken(slug))?;
    let raw = self
      .conn
      .call(move |conn| Ok(query_group(conn, group_id)?))
      .await?
      .ok_or(Error::MissingRow("post_groups"))?;
    group_from_raw(raw)
  }

  async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
    let slug = slug.to_owned();

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("{GROUP_COLUMNS} WHERE slug = ?1"),
            rusqlite::params![slug],
            RawGroup::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(group_from_raw).transpose()
  }

  async fn list_groups(&self) -> Result<Vec<Group>> {
    let raws: Vec<RawGroup> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("{GROUP_COLUMNS} ORDER BY title, group_id"))?;
        let rows = stmt
          .query_map([], RawGroup::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(group_from_raw).collect()
  }

  async fn update_group(&self, group_id: i64, input: NewGroup) -> Result<Option<Group>> {
    let slug = input.slug.clone();

    // Outer `None`: slug collision. Inner `None`: no such group.
    let outcome: Option<Option<RawGroup>> = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "UPDATE post_groups SET title = ?2, slug = ?3, description = ?4
           WHERE group_id = ?1",
          rusqlite::params![group_id, input.title, input.slug, input.description],
        ) {
          Ok(0) => Ok(Some(None)),
          Ok(_) => Ok(Some(query_group(conn, group_id)?)),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    outcome
      .ok_or(Error::SlugTaken(slug))?
      .map(group_from_raw)
      .transpose()
  }

  async fn delete_group(&self, group_id: i64) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM post_groups WHERE group_id = ?1",
          rusqlite::params![group_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (text, created_at, author_id, group_id, image)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            input.text,
            at_str,
            input.author_id,
            input.group_id,
            input.image,
          ],
        )?;
        Ok(query_post(conn, conn.last_insert_rowid())?)
      })
      .await?;

    raw.ok_or(Error::MissingRow("posts"))?.into_post()
  }

  async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
    let raw = self
      .conn
      .call(move |conn| Ok(query_post(conn, post_id)?))
      .await?;
    raw.map(RawPost::into_post).transpose()
  }

  async fn update_post(&self, post_id: i64, edit: PostEdit) -> Result<Option<Post>> {
    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE posts SET text = ?2, group_id = ?3, image = ?4 WHERE post_id = ?1",
          rusqlite::params![post_id, edit.text, edit.group_id, edit.image],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(query_post(conn, post_id)?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn delete_post(&self, post_id: i64) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM posts WHERE post_id = ?1",
          rusqlite::params![post_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
    let PostQuery { author_id, group_id, followed_by } = *query;

    let raws: Vec<RawPost> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{POST_COLUMNS}
           WHERE (?1 IS NULL OR p.author_id = ?1)
             AND (?2 IS NULL OR p.group_id  = ?2)
             AND (?3 IS NULL OR p.author_id IN
                   (SELECT author_id FROM follows WHERE user_id = ?3))
           ORDER BY p.created_at DESC, p.post_id DESC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![author_id, group_id, followed_by],
            RawPost::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let at_str = encode_dt(Utc::now());

    let raw: RawComment = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (post_id, author_id, text, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![input.post_id, input.author_id, input.text, at_str],
        )?;
        Ok(conn.query_row(
          &format!("{COMMENT_COLUMNS} WHERE c.comment_id = ?1"),
          rusqlite::params![conn.last_insert_rowid()],
          RawComment::from_row,
        )?)
      })
      .await?;

    raw.into_comment()
  }

  async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{COMMENT_COLUMNS} WHERE c.post_id = ?1
           ORDER BY c.created_at DESC, c.comment_id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![post_id], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  // ── Follows ───────────────────────────────────────────────────────────────

  async fn follow(&self, edge: Follow) -> Result<bool> {
    let at_str = encode_dt(Utc::now());

    let created = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO follows (user_id, author_id, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![edge.user_id, edge.author_id, at_str],
        )?)
      })
      .await?;
    Ok(created > 0)
  }

  async fn unfollow(&self, edge: Follow) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
          rusqlite::params![edge.user_id, edge.author_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn is_following(&self, edge: Follow) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM follows WHERE user_id = ?1 AND author_id = ?2",
            rusqlite::params![edge.user_id, edge.author_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(found)
  }

  async fn list_following(&self, user_id: i64) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT u.user_id, u.username, u.joined_at
           FROM follows f
           JOIN users u ON u.user_id = f.author_id
           WHERE f.user_id = ?1
           ORDER BY u.username",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }
}
