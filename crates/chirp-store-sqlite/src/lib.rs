//! SQLite backend for Chirp.
//!
//! One database file holds posts, identities, and the rate-limit log, so a
//! single [`SqliteStore`] implements every capability `chirp-core` needs.
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod directory;
mod encode;
mod limiter;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use limiter::SqliteRateLimiter;
pub use store::{NewIdentity, SqliteStore};
