use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use inkwell_core::{
  cache::TtlCache,
  feed::{FeedBuilder, FeedSettings},
  post::{NewGroup, NewPost},
  store::PostStore,
};
use inkwell_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, api_router, viewer::REMOTE_USER_HEADER};

async fn make_state() -> AppState<SqliteStore> {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let feeds = FeedBuilder::new(
    store.clone(),
    Arc::new(TtlCache::new()),
    FeedSettings::default(),
  );
  AppState { store, feeds: Arc::new(feeds) }
}

fn router(state: &AppState<SqliteStore>) -> Router { api_router(state.clone()) }

async fn call(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  user: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    builder = builder.header(REMOTE_USER_HEADER, user);
  }
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = router(state).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn seed_post(state: &AppState<SqliteStore>, username: &str, text: &str) -> i64 {
  let author = state.store.ensure_user(username).await.unwrap();
  state
    .store
    .create_post(NewPost {
      author_id: author.user_id,
      text:      text.into(),
      group_id:  None,
      image:     None,
    })
    .await
    .unwrap()
    .post_id
}

fn item_texts(page: &Value) -> Vec<&str> {
  page["page"]["items"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["text"].as_str().unwrap())
    .collect()
}

// ── Feeds ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn global_feed_is_newest_first() {
  let state = make_state().await;
  seed_post(&state, "leo", "first").await;
  seed_post(&state, "leo", "second").await;

  let (status, page) = call(&state, "GET", "/posts", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(item_texts(&page), ["second", "first"]);
  assert_eq!(page["meta"]["kind"], "global");
  assert_eq!(page["page"]["number"], 1);
}

#[tokio::test]
async fn malformed_page_falls_back_to_first() {
  let state = make_state().await;
  seed_post(&state, "leo", "only").await;

  for uri in [
    "/posts?page=abc",
    "/posts?page=-3",
    "/posts?page=0",
    "/posts?page=99",
    "/posts?page=99999999999999999999",
  ] {
    let (status, page) = call(&state, "GET", uri, None, None).await;
    assert_eq!(status, StatusCode::OK, "{uri}");
    assert_eq!(page["page"]["number"], 1, "{uri}");
    assert_eq!(item_texts(&page), ["only"], "{uri}");
  }
}

#[tokio::test]
async fn unknown_group_is_404() {
  let state = make_state().await;
  let (status, body) = call(&state, "GET", "/groups/nope/posts", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn followed_feed_requires_viewer() {
  let state = make_state().await;
  let (status, _) = call(&state, "GET", "/follow/posts", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = call(&state, "GET", "/follow/posts", Some("  "), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn follow_then_feed_then_unfollow() {
  let state = make_state().await;
  seed_post(&state, "den_author", "followed text").await;
  seed_post(&state, "stranger", "other text").await;

  let (status, body) =
    call(&state, "POST", "/profiles/den_author/follow", Some("den_user"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["following"], true);

  let (_, page) = call(&state, "GET", "/follow/posts", Some("den_user"), None).await;
  assert_eq!(item_texts(&page), ["followed text"]);

  let (_, profile) =
    call(&state, "GET", "/profiles/den_author/posts", Some("den_user"), None).await;
  assert_eq!(profile["meta"]["following"], true);
  assert_eq!(profile["meta"]["post_count"], 1);

  let (status, body) =
    call(&state, "DELETE", "/profiles/den_author/follow", Some("den_user"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["following"], false);

  let (_, page) = call(&state, "GET", "/follow/posts", Some("den_user"), None).await;
  assert!(item_texts(&page).is_empty());
}

#[tokio::test]
async fn follow_unknown_author_is_404() {
  let state = make_state().await;
  let (status, _) = call(&state, "POST", "/profiles/ghost/follow", Some("me"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn global_feed_is_cached_until_cleared() {
  let state = make_state().await;
  seed_post(&state, "leo", "old").await;

  let (_, before) = call(&state, "GET", "/posts", None, None).await;
  seed_post(&state, "leo", "new").await;
  let (_, cached) = call(&state, "GET", "/posts", None, None).await;
  assert_eq!(before, cached);

  let (status, _) = call(&state, "DELETE", "/cache/feed", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _) = call(&state, "DELETE", "/cache/feed", Some("leo"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, fresh) = call(&state, "GET", "/posts", None, None).await;
  assert_eq!(item_texts(&fresh), ["new", "old"]);
}

// ── Posts ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_post_requires_viewer() {
  let state = make_state().await;
  let (status, _) =
    call(&state, "POST", "/posts", None, Some(json!({ "text": "hi" }))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_post_in_group() {
  let state = make_state().await;
  state
    .store
    .add_group(NewGroup {
      title:       "Classics".into(),
      slug:        "classics".into(),
      description: String::new(),
    })
    .await
    .unwrap();

  let (status, post) = call(
    &state,
    "POST",
    "/posts",
    Some("leo"),
    Some(json!({ "text": "Тестовый пост", "group": "classics" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(post["author"]["username"], "leo");
  assert_eq!(post["group"]["slug"], "classics");

  let (_, page) = call(&state, "GET", "/groups/classics/posts", None, None).await;
  assert_eq!(item_texts(&page), ["Тестовый пост"]);
}

#[tokio::test]
async fn create_post_with_text_only() {
  let state = make_state().await;
  let (status, post) =
    call(&state, "POST", "/posts", Some("leo"), Some(json!({ "text": "plain" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(post["group"].is_null());
  assert!(post["image"].is_null());
}

#[tokio::test]
async fn create_post_rejects_blank_text_and_unknown_group() {
  let state = make_state().await;
  let (status, _) =
    call(&state, "POST", "/posts", Some("leo"), Some(json!({ "text": "   " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(
    &state,
    "POST",
    "/posts",
    Some("leo"),
    Some(json!({ "text": "ok", "group": "missing" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_detail_includes_comments_and_count() {
  let state = make_state().await;
  let id = seed_post(&state, "leo", "one").await;
  seed_post(&state, "leo", "two").await;

  let uri = format!("/posts/{id}/comments");
  for text in ["c1", "c2"] {
    let (status, _) =
      call(&state, "POST", &uri, Some("reader"), Some(json!({ "text": text }))).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (status, detail) = call(&state, "GET", &format!("/posts/{id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(detail["post"]["text"], "one");
  assert_eq!(detail["author_post_count"], 2);
  assert_eq!(detail["comments"][0]["text"], "c2");
  assert_eq!(detail["comments"][1]["text"], "c1");
}

#[tokio::test]
async fn missing_post_is_404() {
  let state = make_state().await;
  let (status, _) = call(&state, "GET", "/posts/999", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) =
    call(&state, "POST", "/posts/999/comments", Some("x"), Some(json!({ "text": "hi" })))
      .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_author_edits_and_deletes() {
  let state = make_state().await;
  let id = seed_post(&state, "leo", "draft").await;
  let uri = format!("/posts/{id}");
  let edit = json!({ "text": "final" });

  let (status, _) = call(&state, "PUT", &uri, Some("mallory"), Some(edit.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = call(&state, "DELETE", &uri, Some("mallory"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, post) = call(&state, "PUT", &uri, Some("leo"), Some(edit)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(post["text"], "final");

  let (status, _) = call(&state, "DELETE", &uri, Some("leo"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&state, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Groups ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn group_lifecycle() {
  let state = make_state().await;
  let body = json!({ "title": "Tolkien", "slug": "tolkien", "description": "Middle-earth" });

  let (status, group) = call(&state, "POST", "/groups", Some("leo"), Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(group["slug"], "tolkien");

  let (status, _) = call(&state, "POST", "/groups", Some("leo"), Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, group) = call(
    &state,
    "PUT",
    "/groups/tolkien",
    Some("leo"),
    Some(json!({ "title": "Tolkien", "slug": "arda" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(group["slug"], "arda");

  let (_, groups) = call(&state, "GET", "/groups", None, None).await;
  assert_eq!(groups.as_array().unwrap().len(), 1);

  let (status, _) = call(&state, "DELETE", "/groups/arda", Some("leo"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&state, "DELETE", "/groups/arda", Some("leo"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn group_requires_title_and_slug() {
  let state = make_state().await;
  let (status, body) = call(
    &state,
    "POST",
    "/groups",
    Some("leo"),
    Some(json!({ "title": "", "slug": "x" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}
