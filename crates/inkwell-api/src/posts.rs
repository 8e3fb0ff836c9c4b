//! Handlers for single posts and their comments.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/posts` | Body: `{"text":"…","group":"slug","image":"…"}` |
//! | `GET`    | `/posts/{id}` | post, comments newest first, author's post count |
//! | `PUT`    | `/posts/{id}` | author only |
//! | `DELETE` | `/posts/{id}` | author only; comments go with it |
//! | `POST`   | `/posts/{id}/comments` | Body: `{"text":"…"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use inkwell_core::{
  Error as CoreError,
  post::{Comment, NewComment, NewPost, Post, PostEdit, validate_text},
  store::{PostQuery, PostStore},
  user::User,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, Viewer, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct PostBody {
  pub text:  String,
  /// Slug of the group to file the post under.
  pub group: Option<String>,
  pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
  pub post:              Post,
  pub comments:          Vec<Comment>,
  pub author_post_count: usize,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Resolve an optional group slug to its id. An unknown slug is a client
/// error, not a missing resource.
async fn group_id<S>(store: &S, slug: Option<&str>) -> Result<Option<i64>, ApiError>
where
  S: PostStore,
{
  let Some(slug) = slug else { return Ok(None) };
  let group = store
    .get_group_by_slug(slug)
    .await
    .map_err(CoreError::store)?
    .ok_or_else(|| ApiError::BadRequest(format!("unknown group: {slug}")))?;
  Ok(Some(group.group_id))
}

async fn load<S>(store: &S, post_id: i64) -> Result<Post, ApiError>
where
  S: PostStore,
{
  let post = store
    .get_post(post_id)
    .await
    .map_err(CoreError::store)?
    .ok_or_else(|| CoreError::not_found("post", post_id))?;
  Ok(post)
}

/// Load a post the viewer is allowed to modify.
async fn load_own<S>(store: &S, post_id: i64, viewer: &User) -> Result<Post, ApiError>
where
  S: PostStore,
{
  let post = load(store, post_id).await?;
  if !post.is_authored_by(viewer) {
    return Err(ApiError::Forbidden(format!(
      "post {post_id} belongs to {}",
      post.author.username
    )));
  }
  Ok(post)
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /posts`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Json(body): Json<PostBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PostStore + 'static,
{
  let author = viewer.require()?;
  validate_text(&body.text)?;
  let group_id = group_id(&*state.store, body.group.as_deref()).await?;

  let post = state
    .store
    .create_post(NewPost {
      author_id: author.user_id,
      text: body.text,
      group_id,
      image: body.image,
    })
    .await
    .map_err(CoreError::store)?;
  info!(post_id = post.post_id, author = %author.username, "post created");
  Ok((StatusCode::CREATED, Json(post)))
}

// ─── Detail ──────────────────────────────────────────────────────────────────

/// `GET /posts/{id}`
pub async fn detail<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<PostDetail>, ApiError>
where
  S: PostStore + 'static,
{
  let post = load(&*state.store, id).await?;
  let comments = state
    .store
    .list_comments(id)
    .await
    .map_err(CoreError::store)?;
  let author_post_count = state
    .store
    .list_posts(&PostQuery::by_author(post.author.user_id))
    .await
    .map_err(CoreError::store)?
    .len();
  Ok(Json(PostDetail { post, comments, author_post_count }))
}

// ─── Edit ────────────────────────────────────────────────────────────────────

/// `PUT /posts/{id}`
pub async fn edit<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  viewer: Viewer,
  Json(body): Json<PostBody>,
) -> Result<Json<Post>, ApiError>
where
  S: PostStore + 'static,
{
  let user = viewer.require()?;
  load_own(&*state.store, id, &user).await?;
  validate_text(&body.text)?;
  let group_id = group_id(&*state.store, body.group.as_deref()).await?;

  let post = state
    .store
    .update_post(id, PostEdit {
      text: body.text,
      group_id,
      image: body.image,
    })
    .await
    .map_err(CoreError::store)?
    .ok_or_else(|| CoreError::not_found("post", id))?;
  info!(post_id = id, "post edited");
  Ok(Json(post))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /posts/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  viewer: Viewer,
) -> Result<StatusCode, ApiError>
where
  S: PostStore + 'static,
{
  let user = viewer.require()?;
  load_own(&*state.store, id, &user).await?;
  state.store.delete_post(id).await.map_err(CoreError::store)?;
  info!(post_id = id, "post deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// `POST /posts/{id}/comments`
pub async fn comment<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  viewer: Viewer,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PostStore + 'static,
{
  let author = viewer.require()?;
  validate_text(&body.text)?;
  load(&*state.store, id).await?;

  let comment = state
    .store
    .add_comment(NewComment {
      post_id:   id,
      author_id: author.user_id,
      text:      body.text,
    })
    .await
    .map_err(CoreError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}
