//! Error types for `inkwell-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {key}")]
  NotFound { entity: &'static str, key: String },

  #[error("authentication required")]
  Unauthenticated,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// A backend failure, propagated unchanged.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
    Self::NotFound { entity, key: key.to_string() }
  }

  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
