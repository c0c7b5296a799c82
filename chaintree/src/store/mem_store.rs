use super::{sort_by_weight_desc, TableHandle, TreeStore};
use crate::{
    error::{Error, InsertError, Result},
    node::{NodeId, TreeNode},
};
use fnv::FnvHashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// A MemStore is a pure in memory store. Mostly useful for testing.
///
/// Table names are stored as given and matched case insensitively, like a SQL catalog.
#[derive(Clone)]
pub struct MemStore(Arc<Inner>);

struct Inner {
    tables: Mutex<Tables>,
    max_rows: usize,
}

#[derive(Debug, Default)]
struct Tables {
    /// catalog, in creation order
    names: Vec<String>,
    /// keyed by the lower case name
    map: FnvHashMap<String, Table>,
    current_rows: usize,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<TreeNode>,
    by_id: FnvHashMap<NodeId, usize>,
    by_parent: FnvHashMap<NodeId, Vec<usize>>,
    by_code: FnvHashMap<i32, Vec<usize>>,
}

impl Table {
    fn rows_at<'a>(&'a self, indices: Option<&'a Vec<usize>>) -> Vec<TreeNode> {
        indices
            .map(|xs| xs.iter().map(|i| self.rows[*i]).collect())
            .unwrap_or_default()
    }
}

impl MemStore {
    /// Creates a store that holds at most `max_rows` rows over all tables.
    pub fn new(max_rows: usize) -> Self {
        Self(Arc::new(Inner {
            tables: Mutex::new(Tables::default()),
            max_rows,
        }))
    }

    /// number of rows over all tables
    pub fn len(&self) -> usize {
        self.0.tables.lock().current_rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_table<T>(&self, table: &TableHandle, f: impl FnOnce(&Table) -> T) -> Result<T> {
        let tables = self.0.tables.lock();
        let table = tables
            .map
            .get(&table.name().to_ascii_lowercase())
            .ok_or_else(|| Error::NoSuchTable(table.name().into()))?;
        Ok(f(table))
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl TreeStore for MemStore {
    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.0.tables.lock().names.clone())
    }

    fn create_table(&self, name: &str) -> Result<TableHandle> {
        let handle = TableHandle::new(name)?;
        let mut tables = self.0.tables.lock();
        let key = name.to_ascii_lowercase();
        if tables.map.contains_key(&key) {
            return Err(Error::TableExists(name.into()));
        }
        tables.names.push(name.into());
        tables.map.insert(key, Table::default());
        Ok(handle)
    }

    fn insert(&self, table: &TableHandle, node: &TreeNode) -> std::result::Result<(), InsertError> {
        let mut tables = self.0.tables.lock();
        if tables.current_rows >= self.0.max_rows {
            return Err(InsertError::new(node.node_id, "full"));
        }
        let t = tables
            .map
            .get_mut(&table.name().to_ascii_lowercase())
            .ok_or_else(|| InsertError::new(node.node_id, "no such table"))?;
        if t.by_id.contains_key(&node.node_id) {
            return Err(InsertError::new(node.node_id, "duplicate node id"));
        }
        let index = t.rows.len();
        t.rows.push(*node);
        t.by_id.insert(node.node_id, index);
        t.by_parent.entry(node.parent_id).or_default().push(index);
        t.by_code.entry(node.identifier_code).or_default().push(index);
        tables.current_rows += 1;
        Ok(())
    }

    fn get_by_id(&self, table: &TableHandle, id: NodeId) -> Result<Option<TreeNode>> {
        self.with_table(table, |t| t.by_id.get(&id).map(|i| t.rows[*i]))
    }

    fn get_children(&self, table: &TableHandle, parent: NodeId) -> Result<Vec<TreeNode>> {
        self.with_table(table, |t| t.rows_at(t.by_parent.get(&parent)))
    }

    fn get_by_identifier(&self, table: &TableHandle, code: i32) -> Result<Vec<TreeNode>> {
        let mut res = self.with_table(table, |t| t.rows_at(t.by_code.get(&code)))?;
        sort_by_weight_desc(&mut res);
        Ok(res)
    }

    fn scan(&self, table: &TableHandle, offset: usize, limit: usize) -> Result<Vec<TreeNode>> {
        self.with_table(table, |t| {
            t.rows.iter().skip(offset).take(limit).copied().collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_is_case_insensitive() -> anyhow::Result<()> {
        let store = MemStore::default();
        let created = store.select_or_create("FeTree")?;
        let selected = store.select_or_create("fetree")?;
        assert_eq!(created, selected);
        assert_eq!(selected.name(), "FeTree");
        assert_eq!(store.table_names()?, vec!["FeTree".to_string()]);
        assert!(store.select("other")?.is_none());
        Ok(())
    }

    #[test]
    fn handles_match_tables_regardless_of_case() -> anyhow::Result<()> {
        let store = MemStore::default();
        let created = store.create_table("FeTree")?;
        store.insert(&created, &TreeNode::new(1, 100, 0, 1.0))?;
        let upper = TableHandle::new("FETREE")?;
        store.insert(&upper, &TreeNode::new(2, 200, 1, 0.5))?;
        assert_eq!(store.scan(&upper, 0, 10)?.len(), 2);
        assert!(store.get_by_id(&created, NodeId(2))?.is_some());
        assert!(matches!(store.create_table("fetree"), Err(Error::TableExists(_))));
        assert_eq!(store.table_names()?, vec!["FeTree".to_string()]);
        Ok(())
    }

    #[test]
    fn duplicate_ids_and_full_store_fail_per_row() -> anyhow::Result<()> {
        let store = MemStore::new(2);
        let t = store.select_or_create("t")?;
        store.insert(&t, &TreeNode::new(1, 100, 0, 1.0))?;
        assert!(store.insert(&t, &TreeNode::new(1, 101, 0, 1.0)).is_err());
        store.insert(&t, &TreeNode::new(2, 200, 1, 0.5))?;
        assert!(store.insert(&t, &TreeNode::new(3, 300, 2, 0.5)).is_err());
        assert_eq!(store.len(), 2);
        Ok(())
    }

    #[test]
    fn lookups() -> anyhow::Result<()> {
        let store = MemStore::default();
        let t = store.select_or_create("t")?;
        for node in &[
            TreeNode::new(1, 100, 0, 1.0),
            TreeNode::new(2, 200, 1, 0.5),
            TreeNode::new(3, 200, 1, 0.8),
            TreeNode::new(4, 300, 3, 0.1),
        ] {
            store.insert(&t, node)?;
        }
        assert_eq!(store.get_by_id(&t, NodeId(3))?.map(|n| n.weight), Some(0.8));
        assert_eq!(store.get_by_id(&t, NodeId(9))?, None);
        let children = store.get_children(&t, NodeId(1))?;
        assert_eq!(
            children.iter().map(|n| n.node_id.0).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert!(store.get_children(&t, NodeId(4))?.is_empty());
        let by_code = store.get_by_identifier(&t, 200)?;
        assert_eq!(
            by_code.iter().map(|n| n.node_id.0).collect::<Vec<_>>(),
            vec![3, 2]
        );
        assert_eq!(store.scan(&t, 1, 2)?.len(), 2);
        assert_eq!(store.scan(&t, 3, 10)?.len(), 1);
        assert!(store.scan(&t, 10, 10)?.is_empty());
        Ok(())
    }
}
