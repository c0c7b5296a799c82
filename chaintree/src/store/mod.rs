//! interface to a tabular store of tree nodes
use crate::{
    error::{Error, InsertError, Result},
    node::{NodeId, TreeNode},
};
use std::{fmt, sync::Arc};
mod mem_store;

pub use mem_store::MemStore;

/// A bound table in a [TreeStore].
///
/// Handles are obtained via [TreeStore::select] or [TreeStore::select_or_create] and carry the
/// table name as it appears in the backend catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableHandle {
    name: String,
}

impl TableHandle {
    /// Table names end up in SQL statements, so only plain identifiers are allowed.
    pub fn validate_name(name: &str) -> Result<()> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(c) => {
                (c.is_ascii_alphabetic() || c == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidTableName(name.into()))
        }
    }

    /// Only for backends. Users get handles from the store.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Storage for tables of [TreeNode]s.
///
/// Tables have the fixed column layout `nodeId, identifierCode, parentId, weight`.
/// Rows are write once. There is no referential integrity: a parent id may point to
/// a node that does not exist.
pub trait TreeStore {
    /// names of all tables, as stored in the catalog
    fn table_names(&self) -> Result<Vec<String>>;

    /// create a new, empty table. Callers should go through [TreeStore::select_or_create].
    fn create_table(&self, name: &str) -> Result<TableHandle>;

    /// append a row. A failure only affects this row.
    fn insert(&self, table: &TableHandle, node: &TreeNode) -> std::result::Result<(), InsertError>;

    fn get_by_id(&self, table: &TableHandle, id: NodeId) -> Result<Option<TreeNode>>;

    /// all nodes with the given parent, in insertion order
    fn get_children(&self, table: &TableHandle, parent: NodeId) -> Result<Vec<TreeNode>>;

    /// all nodes with the given identifier code, by weight descending.
    ///
    /// Nodes with equal weight stay in insertion order.
    fn get_by_identifier(&self, table: &TableHandle, code: i32) -> Result<Vec<TreeNode>>;

    /// up to `limit` rows in insertion order, starting at row `offset`
    fn scan(&self, table: &TableHandle, offset: usize, limit: usize) -> Result<Vec<TreeNode>>;

    /// bind to an existing table, matching the name case insensitively
    fn select(&self, name: &str) -> Result<Option<TableHandle>> {
        TableHandle::validate_name(name)?;
        let found = self
            .table_names()?
            .into_iter()
            .find(|existing| existing.eq_ignore_ascii_case(name));
        found.map(TableHandle::new).transpose()
    }

    /// bind to an existing table, or create it if there is none
    fn select_or_create(&self, name: &str) -> Result<TableHandle> {
        match self.select(name)? {
            Some(handle) => {
                tracing::debug!("using existing table {}", handle);
                Ok(handle)
            }
            None => {
                tracing::info!("Create table {}", name);
                self.create_table(name)
            }
        }
    }

    /// bind to an existing table, or fail with [Error::NoSuchTable]
    fn require(&self, name: &str) -> Result<TableHandle> {
        self.select(name)?
            .ok_or_else(|| Error::NoSuchTable(name.into()))
    }
}

/// A tree store, we use dyn to avoid having just another type parameter
pub type ArcTreeStore = Arc<dyn TreeStore + Send + Sync + 'static>;

impl TreeStore for ArcTreeStore {
    fn table_names(&self) -> Result<Vec<String>> {
        self.as_ref().table_names()
    }

    fn create_table(&self, name: &str) -> Result<TableHandle> {
        self.as_ref().create_table(name)
    }

    fn insert(&self, table: &TableHandle, node: &TreeNode) -> std::result::Result<(), InsertError> {
        self.as_ref().insert(table, node)
    }

    fn get_by_id(&self, table: &TableHandle, id: NodeId) -> Result<Option<TreeNode>> {
        self.as_ref().get_by_id(table, id)
    }

    fn get_children(&self, table: &TableHandle, parent: NodeId) -> Result<Vec<TreeNode>> {
        self.as_ref().get_children(table, parent)
    }

    fn get_by_identifier(&self, table: &TableHandle, code: i32) -> Result<Vec<TreeNode>> {
        self.as_ref().get_by_identifier(table, code)
    }

    fn scan(&self, table: &TableHandle, offset: usize, limit: usize) -> Result<Vec<TreeNode>> {
        self.as_ref().scan(table, offset, limit)
    }
}

/// sort nodes by weight descending, keeping the order of equal weights
pub fn sort_by_weight_desc(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| b.weight.total_cmp(&a.weight));
}
