//! Core types and capability traits for Chirp.
//!
//! This crate holds the post-writing and feed-assembly logic and the traits it
//! is written against. It carries no HTTP or database dependencies; storage,
//! identity lookup, and rate limiting are supplied by whoever composes it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod directory;
pub mod error;
pub mod feed;
pub mod identity;
pub mod limiter;
pub mod post;
pub mod store;
pub mod writer;

pub use error::{Error, ErrorKind, Result};

#[cfg(test)]
mod testing;
