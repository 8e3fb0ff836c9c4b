//! Follow and unfollow an author. Both operations are idempotent and report
//! the resulting state.

use axum::{
  Json,
  extract::{Path, State},
};
use inkwell_core::{
  Error as CoreError,
  store::PostStore,
  user::{Follow, User},
};
use serde::Serialize;
use tracing::info;

use crate::{AppState, Viewer, error::ApiError};

#[derive(Debug, Serialize)]
pub struct FollowState {
  pub author:    User,
  pub following: bool,
}

async fn edge<S>(
  state: &AppState<S>,
  viewer: Viewer,
  username: &str,
) -> Result<(Follow, User), ApiError>
where
  S: PostStore + 'static,
{
  let user = viewer.require()?;
  let author = state
    .store
    .get_user_by_username(username)
    .await
    .map_err(CoreError::store)?
    .ok_or_else(|| CoreError::not_found("user", username))?;
  let edge = Follow {
    user_id:   user.user_id,
    author_id: author.user_id,
  };
  Ok((edge, author))
}

/// `POST /profiles/{username}/follow`
pub async fn follow<S>(
  State(state): State<AppState<S>>,
  Path(username): Path<String>,
  viewer: Viewer,
) -> Result<Json<FollowState>, ApiError>
where
  S: PostStore + 'static,
{
  let (edge, author) = edge(&state, viewer, &username).await?;
  if state.store.follow(edge).await.map_err(CoreError::store)? {
    info!(user_id = edge.user_id, author = %author.username, "followed");
  }
  Ok(Json(FollowState { author, following: true }))
}

/// `DELETE /profiles/{username}/follow`
pub async fn unfollow<S>(
  State(state): State<AppState<S>>,
  Path(username): Path<String>,
  viewer: Viewer,
) -> Result<Json<FollowState>, ApiError>
where
  S: PostStore + 'static,
{
  let (edge, author) = edge(&state, viewer, &username).await?;
  if state.store.unfollow(edge).await.map_err(CoreError::store)? {
    info!(user_id = edge.user_id, author = %author.username, "unfollowed");
  }
  Ok(Json(FollowState { author, following: false }))
}
