//! Integration tests for `SqliteStore` against an in-memory database.


use inkwell_core::{
  post::{NewGroup, NewPost, Post},
  store::PostStore,
  user::User,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, username: &str) -> User {
  s.ensure_user(username).await.unwrap()
}

fn group_input(slug: &str) -> NewGroup {
  NewGroup {
    title:       format!("Group {slug}"),
    slug:        slug.to_owned(),
    description: "Тестовое описание".into(),
  }
}

async fn post(s: &SqliteStore, author: &User, text: &str, group_id: Option<i64>) -> Post {
  s.create_post(NewPost {
    author_id: author.user_id,
    text: text.into(),
    group_id,
    image: None,
  })
  .await
  .unwrap()
}

fn ids(posts: &[Post]) -> Vec<i64> { posts.iter().map(|p| p.post_id).collect() }
