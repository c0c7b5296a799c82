//! a [TreeStore] backed by a SQLite database
use crate::error::Result;
use chaintree::{
    error::{Error as CoreError, InsertError, Result as CoreResult},
    NodeId, TableHandle, TreeNode, TreeStore,
};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::{convert::TryFrom, path::Path, sync::Arc};
use tracing::debug;

/// A SQLite database holding one SQL table per tree table.
///
/// Rows keep their insertion order through the implicit `rowid`.
#[derive(Clone)]
pub struct SqliteStore(Arc<Mutex<Connection>>);

impl SqliteStore {
    /// open or create a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", &"WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", &"NORMAL")?;
        debug!(
            "opened sqlite store at {}, journal mode {}",
            path.as_ref().display(),
            mode
        );
        Ok(Self::new(conn))
    }

    /// a private in memory database
    pub fn memory() -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    pub fn new(conn: Connection) -> Self {
        Self(Arc::new(Mutex::new(conn)))
    }

    fn query(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> std::result::Result<Vec<TreeNode>, rusqlite::Error> {
        let conn = self.0.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, read_node)?;
        rows.collect()
    }
}

fn read_node(row: &Row) -> rusqlite::Result<TreeNode> {
    Ok(TreeNode::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
    ))
}

fn unavailable(cause: rusqlite::Error) -> CoreError {
    CoreError::StorageUnavailable(cause.to_string())
}

impl TreeStore for SqliteStore {
    fn table_names(&self) -> CoreResult<Vec<String>> {
        let conn = self.0.lock();
        let mut stmt = conn
            .prepare_cached("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY rowid")
            .map_err(unavailable)?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .map_err(unavailable)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(unavailable)?;
        Ok(names)
    }

    fn create_table(&self, name: &str) -> CoreResult<TableHandle> {
        let handle = TableHandle::new(name)?;
        if let Some(existing) = self.select(name)? {
            return Err(CoreError::TableExists(existing.name().into()));
        }
        // names are plain identifiers, but may still be keywords like `order`
        let sql = format!(
            r#"
            CREATE TABLE "{t}" (
              nodeId INTEGER NOT NULL UNIQUE,
              identifierCode INTEGER NOT NULL,
              parentId INTEGER NOT NULL,
              weight DOUBLE NOT NULL
            );
            CREATE INDEX "{t}_by_code" ON "{t}" (identifierCode);
            CREATE INDEX "{t}_by_parent" ON "{t}" (parentId);
            "#,
            t = handle.name()
        );
        self.0.lock().execute_batch(&sql).map_err(unavailable)?;
        Ok(handle)
    }

    fn insert(&self, table: &TableHandle, node: &TreeNode) -> std::result::Result<(), InsertError> {
        let sql = format!(
            "INSERT INTO \"{}\" (nodeId, identifierCode, parentId, weight) VALUES (?1, ?2, ?3, ?4)",
            table.name()
        );
        let conn = self.0.lock();
        conn.prepare_cached(&sql)
            .and_then(|mut stmt| {
                stmt.execute(params![
                    node.node_id.0,
                    node.identifier_code,
                    node.parent_id.0,
                    node.weight
                ])
            })
            .map_err(|cause| InsertError::new(node.node_id, cause))?;
        Ok(())
    }

    fn get_by_id(&self, table: &TableHandle, id: NodeId) -> CoreResult<Option<TreeNode>> {
        let sql = format!(
            "SELECT nodeId, identifierCode, parentId, weight FROM \"{}\" WHERE nodeId = ?1",
            table.name()
        );
        let conn = self.0.lock();
        let mut stmt = conn.prepare_cached(&sql).map_err(unavailable)?;
        stmt.query_row(params![id.0], read_node)
            .optional()
            .map_err(unavailable)
    }

    fn get_children(&self, table: &TableHandle, parent: NodeId) -> CoreResult<Vec<TreeNode>> {
        let sql = format!(
            "SELECT nodeId, identifierCode, parentId, weight FROM \"{}\" WHERE parentId = ?1 ORDER BY rowid",
            table.name()
        );
        self.query(&sql, params![parent.0]).map_err(unavailable)
    }

    fn get_by_identifier(&self, table: &TableHandle, code: i32) -> CoreResult<Vec<TreeNode>> {
        let sql = format!(
            "SELECT nodeId, identifierCode, parentId, weight FROM \"{}\" WHERE identifierCode = ?1 ORDER BY weight DESC, rowid",
            table.name()
        );
        self.query(&sql, params![code]).map_err(unavailable)
    }

    fn scan(&self, table: &TableHandle, offset: usize, limit: usize) -> CoreResult<Vec<TreeNode>> {
        let sql = format!(
            "SELECT nodeId, identifierCode, parentId, weight FROM \"{}\" ORDER BY rowid LIMIT ?1 OFFSET ?2",
            table.name()
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        self.query(&sql, params![limit, offset]).map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(nodes: &[TreeNode]) -> anyhow::Result<(SqliteStore, TableHandle)> {
        let store = SqliteStore::memory()?;
        let table = store.select_or_create("fe56")?;
        for node in nodes {
            store.insert(&table, node)?;
        }
        Ok((store, table))
    }

    #[test]
    fn tables_are_selected_case_insensitively() -> anyhow::Result<()> {
        let store = SqliteStore::memory()?;
        assert!(store.select("Fe56")?.is_none());
        let created = store.select_or_create("Fe56")?;
        let selected = store.select_or_create("FE56")?;
        assert_eq!(created, selected);
        assert_eq!(store.table_names()?, vec!["Fe56".to_string()]);
        assert!(matches!(store.require("co60"), Err(CoreError::NoSuchTable(_))));
        assert!(matches!(store.select("x y"), Err(CoreError::InvalidTableName(_))));
        Ok(())
    }

    #[test]
    fn keywords_are_valid_table_names() -> anyhow::Result<()> {
        let store = SqliteStore::memory()?;
        let order = store.select_or_create("order")?;
        let group = store.select_or_create("Group")?;
        store.insert(&order, &TreeNode::new(1, 100, 0, 1.0))?;
        store.insert(&order, &TreeNode::new(2, 200, 1, 0.5))?;
        store.insert(&group, &TreeNode::new(1, 300, 0, 1.0))?;
        assert_eq!(
            store.get_by_id(&order, NodeId(2))?.map(|n| n.identifier_code),
            Some(200)
        );
        assert_eq!(store.get_children(&order, NodeId(1))?.len(), 1);
        assert_eq!(store.get_by_identifier(&group, 300)?.len(), 1);
        assert_eq!(store.scan(&order, 0, 10)?.len(), 2);
        assert_eq!(
            store.table_names()?,
            vec!["order".to_string(), "Group".to_string()]
        );
        Ok(())
    }

    #[test]
    fn tables_are_created_once() -> anyhow::Result<()> {
        let store = SqliteStore::memory()?;
        store.create_table("Fe56")?;
        match store.create_table("FE56") {
            Err(CoreError::TableExists(name)) => assert_eq!(name, "Fe56"),
            other => panic!("unexpected {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn duplicate_node_ids_are_refused_per_row() -> anyhow::Result<()> {
        let (store, table) = store_with(&[TreeNode::new(1, 100, 0, 1.0)])?;
        let err = store
            .insert(&table, &TreeNode::new(1, 200, 0, 1.0))
            .unwrap_err();
        assert_eq!(err.node, NodeId(1));
        store.insert(&table, &TreeNode::new(2, 200, 1, 1.0))?;
        assert_eq!(store.scan(&table, 0, 10)?.len(), 2);
        Ok(())
    }

    #[test]
    fn identifier_lookup_is_weight_descending() -> anyhow::Result<()> {
        let (store, table) = store_with(&[
            TreeNode::new(1, 100, 0, 1.0),
            TreeNode::new(2, 200, 1, 0.5),
            TreeNode::new(3, 200, 1, 0.8),
            TreeNode::new(4, 200, 1, 0.5),
        ])?;
        let ids = store
            .get_by_identifier(&table, 200)?
            .into_iter()
            .map(|n| n.node_id.0)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 2, 4]);
        assert!(store.get_by_identifier(&table, 999)?.is_empty());
        Ok(())
    }

    #[test]
    fn lookups_and_scans() -> anyhow::Result<()> {
        let nodes = (1..=5)
            .map(|i| TreeNode::new(i, i * 10, i / 2, 0.25))
            .collect::<Vec<_>>();
        let (store, table) = store_with(&nodes)?;
        assert_eq!(store.get_by_id(&table, NodeId(3))?, Some(nodes[2]));
        assert_eq!(store.get_by_id(&table, NodeId(42))?, None);
        let children = store.get_children(&table, NodeId(2))?;
        assert_eq!(children, vec![nodes[3], nodes[4]]);
        assert_eq!(store.scan(&table, 1, 2)?, vec![nodes[1], nodes[2]]);
        assert!(store.scan(&table, 5, 2)?.is_empty());
        Ok(())
    }
}
