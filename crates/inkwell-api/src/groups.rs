//! Handlers for `/groups` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/groups` | ordered by title |
//! | `POST`   | `/groups` | Body: `{"title":"…","slug":"…","description":"…"}`; 409 if the slug is taken |
//! | `PUT`    | `/groups/{slug}` | same body; 404 if not found |
//! | `DELETE` | `/groups/{slug}` | posts in the group become ungrouped |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use inkwell_core::{
  Error as CoreError,
  post::{Group, NewGroup},
  store::PostStore,
};
use tracing::info;

use crate::{AppState, Viewer, error::ApiError};

async fn find<S>(store: &S, slug: &str) -> Result<Group, ApiError>
where
  S: PostStore,
{
  let group = store
    .get_group_by_slug(slug)
    .await
    .map_err(CoreError::store)?
    .ok_or_else(|| CoreError::not_found("group", slug))?;
  Ok(group)
}

async fn ensure_slug_free<S>(store: &S, slug: &str) -> Result<(), ApiError>
where
  S: PostStore,
{
  let taken = store
    .get_group_by_slug(slug)
    .await
    .map_err(CoreError::store)?
    .is_some();
  if taken {
    return Err(CoreError::Conflict(format!("group slug {slug:?} is taken")).into());
  }
  Ok(())
}

/// `GET /groups`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Group>>, ApiError>
where
  S: PostStore + 'static,
{
  let groups = state.store.list_groups().await.map_err(CoreError::store)?;
  Ok(Json(groups))
}

/// `POST /groups`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Json(body): Json<NewGroup>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PostStore + 'static,
{
  viewer.require()?;
  body.validate()?;
  ensure_slug_free(&*state.store, &body.slug).await?;

  let group = state.store.add_group(body).await.map_err(CoreError::store)?;
  info!(slug = %group.slug, "group created");
  Ok((StatusCode::CREATED, Json(group)))
}

/// `PUT /groups/{slug}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  viewer: Viewer,
  Json(body): Json<NewGroup>,
) -> Result<Json<Group>, ApiError>
where
  S: PostStore + 'static,
{
  viewer.require()?;
  body.validate()?;
  let existing = find(&*state.store, &slug).await?;
  if body.slug != existing.slug {
    ensure_slug_free(&*state.store, &body.slug).await?;
  }

  let group = state
    .store
    .update_group(existing.group_id, body)
    .await
    .map_err(CoreError::store)?
    .ok_or_else(|| CoreError::not_found("group", &slug))?;
  info!(from = %slug, to = %group.slug, "group updated");
  Ok(Json(group))
}

/// `DELETE /groups/{slug}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  viewer: Viewer,
) -> Result<StatusCode, ApiError>
where
  S: PostStore + 'static,
{
  viewer.require()?;
  let group = find(&*state.store, &slug).await?;
  state
    .store
    .delete_group(group.group_id)
    .await
    .map_err(CoreError::store)?;
  info!(slug = %slug, "group deleted");
  Ok(StatusCode::NO_CONTENT)
}
