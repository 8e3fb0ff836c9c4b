//! SQL schema for the Inkwell SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Integer primary keys use `AUTOINCREMENT` so ids are never reused and
/// increase with insertion order; feeds rely on that for tie-breaking.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    username   TEXT NOT NULL UNIQUE,
    joined_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS post_groups (
    group_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
);

-- Deleting a group leaves its posts in place, ungrouped.
CREATE TABLE IF NOT EXISTS posts (
    post_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    text       TEXT NOT NULL,
    created_at TEXT NOT NULL,   -- fixed-width RFC 3339 UTC; server-assigned
    author_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    group_id   INTEGER REFERENCES post_groups(group_id) ON DELETE SET NULL,
    image      TEXT
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id    INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    author_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    text       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS follows (
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    author_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, author_id)
);

CREATE INDEX IF NOT EXISTS posts_feed_idx       ON posts(created_at DESC, post_id DESC);
CREATE INDEX IF NOT EXISTS posts_author_idx     ON posts(author_id);
CREATE INDEX IF NOT EXISTS posts_group_idx      ON posts(group_id);
CREATE INDEX IF NOT EXISTS comments_post_idx    ON comments(post_id);
CREATE INDEX IF NOT EXISTS follows_author_idx   ON follows(author_id);

PRAGMA user_version = 1;
";
