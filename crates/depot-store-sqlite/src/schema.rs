//! SQL schema for the Depot SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Knowledge-base passages. Written by ingestion, never updated.
CREATE TABLE IF NOT EXISTS documents (
    passage_id    TEXT PRIMARY KEY,
    content       TEXT NOT NULL,
    title         TEXT NOT NULL,
    metadata      TEXT NOT NULL,   -- JSON-encoded PassageMetadata
    content_hash  TEXT NOT NULL,
    embedding     BLOB NOT NULL,   -- little-endian f32 values
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS image_captions (
    url          TEXT PRIMARY KEY,
    description  TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    profile_id    TEXT PRIMARY KEY,
    role          TEXT NOT NULL,   -- 'admin' | 'manager' | 'packer' | 'client'
    display_name  TEXT NOT NULL,
    is_banned     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    order_id            TEXT PRIMARY KEY,
    client_id           TEXT NOT NULL REFERENCES profiles(profile_id),
    title               TEXT NOT NULL,
    description         TEXT NOT NULL DEFAULT '',
    status              TEXT NOT NULL DEFAULT 'searching',
    accepted_packer_id  TEXT REFERENCES profiles(profile_id),
    is_disputed         INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bids (
    bid_id      TEXT PRIMARY KEY,
    order_id    TEXT NOT NULL REFERENCES orders(order_id),
    packer_id   TEXT NOT NULL REFERENCES profiles(profile_id),
    price       INTEGER NOT NULL CHECK (price > 0),
    days        INTEGER NOT NULL CHECK (days > 0),
    comment     TEXT,
    status      TEXT NOT NULL DEFAULT 'pending',
    created_at  TEXT NOT NULL
);

-- At most one accepted bid per order.
CREATE UNIQUE INDEX IF NOT EXISTS bids_one_accepted_idx
    ON bids(order_id) WHERE status = 'accepted';

CREATE TABLE IF NOT EXISTS messages (
    message_id  TEXT PRIMARY KEY,
    order_id    TEXT NOT NULL REFERENCES orders(order_id),
    sender_id   TEXT REFERENCES profiles(profile_id),
    packer_id   TEXT REFERENCES profiles(profile_id),
    content     TEXT NOT NULL,
    is_system   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_title_idx  ON documents(title);
CREATE INDEX IF NOT EXISTS documents_hash_idx   ON documents(content_hash);
CREATE INDEX IF NOT EXISTS orders_client_idx    ON orders(client_id);
CREATE INDEX IF NOT EXISTS bids_order_idx       ON bids(order_id);
CREATE INDEX IF NOT EXISTS messages_order_idx   ON messages(order_id, created_at);

PRAGMA user_version = 1;
";
