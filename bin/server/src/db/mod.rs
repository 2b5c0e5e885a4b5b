//! Postgres storage for conversations and messages.

pub mod store;

pub use store::PgStore;
