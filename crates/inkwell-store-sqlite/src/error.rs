//! Error type for `inkwell-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("group slug already taken: {0}")]
  SlugTaken(String),

  /// A row written moments ago could not be read back.
  #[error("{0} row missing after write")]
  MissingRow(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
