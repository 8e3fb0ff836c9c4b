//! Core types and feed logic for the Inkwell blogging platform.
//!
//! This crate holds the domain model, the [`store::PostStore`] abstraction,
//! and the feed pipeline (query, order, paginate, cache). It has no HTTP or
//! database dependencies; backends and transports depend on it.

pub mod cache;
pub mod error;
pub mod feed;
pub mod paginate;
pub mod post;
pub mod store;
pub mod user;

pub use error::{Error, Result};
