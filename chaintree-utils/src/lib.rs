//! Utilities to work with chain trees outside of the core crate: a SQLite backed
//! [chaintree::TreeStore], graph and table dumps, and the `chaintree-cli` binary.
pub mod dump;
pub mod error;
pub mod sqlite;

pub use error::{Error, Result};
pub use sqlite::SqliteStore;
