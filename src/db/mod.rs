//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - The key-value store behind the player profile

pub mod kv;
pub mod migrations;

pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError};
pub use migrations::init_db;
