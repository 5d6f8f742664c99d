//! SQL schema for the Chirp SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Posts are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS posts (
    post_id     TEXT PRIMARY KEY,
    content     TEXT NOT NULL CHECK (length(content) BETWEEN 1 AND 255),
    author_id   TEXT NOT NULL,   -- identities.identity_id, not enforced
    created_at  TEXT NOT NULL    -- RFC 3339 UTC, fixed nanosecond width
);

CREATE INDEX IF NOT EXISTS posts_created_idx ON posts(created_at);
CREATE INDEX IF NOT EXISTS posts_author_idx  ON posts(author_id, created_at);

CREATE TABLE IF NOT EXISTS identities (
    identity_id   TEXT PRIMARY KEY,
    username      TEXT UNIQUE,     -- NULL for identities without a handle
    image_url     TEXT NOT NULL,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Sliding-window log: one row per admitted hit.
CREATE TABLE IF NOT EXISTS rate_limit_hits (
    key        TEXT    NOT NULL,
    hit_at_ms  INTEGER NOT NULL    -- unix epoch milliseconds
);

CREATE INDEX IF NOT EXISTS rate_limit_key_idx ON rate_limit_hits(key, hit_at_ms);

PRAGMA user_version = 1;
";
