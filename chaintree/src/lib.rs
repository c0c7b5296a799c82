//! # Chain trees
//!
//! Decay and transmutation chains form a forest: every node is produced from exactly one
//! parent with some relative production weight, and carries a species identifier code (kza).
//! The same species usually shows up at many places in the forest.
//!
//! This crate stores such forests in tables and answers two questions about a species:
//!
//! - which chains lead from a root to the species, and
//! - what do all these chains look like when merged into one tree, the *minimal tree*.
//!
//! ## Loading
//!
//! Forests come as flat binary files of fixed size big endian records, see [decode].
//! Records are streamed into a [store::TreeStore] one at a time. A row the store refuses
//! is counted and skipped, so a bad record never aborts a load. Loading does not check parent
//! links.
//!
//! ## Querying
//!
//! Chains are resolved lazily by following parent links up to a root, see [resolve]. A parent
//! link that points to a missing node or that forms a cycle only fails the one chain that
//! contains it.
//!
//! Resolved chains can be merged into a [merge::ChainMergeTree], where common prefixes are
//! shared, and rendered as indented text with [render::TreeRenderer].
//!
//! [query::QueryEngine] bundles all of this.
pub mod cancel;
pub mod config;
pub mod decode;
pub mod error;
pub mod merge;
pub mod node;
#[cfg(feature = "metrics")]
mod prom;
pub mod query;
pub mod render;
pub mod resolve;
pub mod store;

pub use cancel::CancelToken;
pub use config::Config;
pub use error::{Error, InsertError, Result};
pub use merge::{ChainMergeTree, ChainNode};
pub use node::{Chain, NodeId, TreeNode};
pub use query::{LoadReport, QueryEngine};
pub use store::{MemStore, TableHandle, TreeStore};

/// register the metrics of this crate with a prometheus registry
#[cfg(feature = "metrics")]
pub fn register_metrics(registry: &prometheus::Registry) -> Result<()> {
    prom::register(registry)
}

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
