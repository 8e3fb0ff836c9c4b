//! Resolve the requesting user from the trusted `x-remote-user` header.

use axum::{extract::FromRequestParts, http::request::Parts};
use inkwell_core::{Error as CoreError, store::PostStore, user::User};

use crate::{AppState, error::ApiError};

/// Header carrying the username authenticated by the upstream proxy.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

/// The user making the request, if any. An absent or blank header means an
/// anonymous viewer. Known usernames are provisioned on first sight.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<User>);

impl Viewer {
  pub fn user(&self) -> Option<&User> { self.0.as_ref() }

  /// The signed-in user, or 401.
  pub fn require(self) -> Result<User, ApiError> {
    self.0.ok_or(ApiError::Unauthorized)
  }
}

impl<S> FromRequestParts<AppState<S>> for Viewer
where
  S: PostStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(REMOTE_USER_HEADER) else {
      return Ok(Viewer(None));
    };
    let username = value
      .to_str()
      .map_err(|_| ApiError::BadRequest(format!("{REMOTE_USER_HEADER} is not valid UTF-8")))?
      .trim();
    if username.is_empty() {
      return Ok(Viewer(None));
    }

    let user = state
      .store
      .ensure_user(username)
      .await
      .map_err(CoreError::store)?;
    Ok(Viewer(Some(user)))
  }
}
