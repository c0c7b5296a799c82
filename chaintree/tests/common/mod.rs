#![allow(dead_code)]
//! helper methods for the tests
use chaintree::{
    error::{InsertError, Result},
    store::{TableHandle, TreeStore},
    NodeId, TreeNode,
};
use fnv::FnvHashSet;
use quickcheck::{Arbitrary, Gen};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// the three node example: a root 100 with two children 200
pub fn sample_nodes() -> Vec<TreeNode> {
    vec![
        TreeNode::new(1, 100, 0, 1.0),
        TreeNode::new(2, 200, 1, 0.5),
        TreeNode::new(3, 200, 1, 0.8),
    ]
}

/// A store wrapper that counts point lookups
#[derive(Clone)]
pub struct OpsCountingStore<S> {
    inner: S,
    lookups: Arc<AtomicU64>,
}

impl<S> OpsCountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lookups: Arc::new(AtomicU64::default()),
        }
    }

    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl<S: TreeStore> TreeStore for OpsCountingStore<S> {
    fn table_names(&self) -> Result<Vec<String>> {
        self.inner.table_names()
    }

    fn create_table(&self, name: &str) -> Result<TableHandle> {
        self.inner.create_table(name)
    }

    fn insert(&self, table: &TableHandle, node: &TreeNode) -> std::result::Result<(), InsertError> {
        self.inner.insert(table, node)
    }

    fn get_by_id(&self, table: &TableHandle, id: NodeId) -> Result<Option<TreeNode>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(table, id)
    }

    fn get_children(&self, table: &TableHandle, parent: NodeId) -> Result<Vec<TreeNode>> {
        self.inner.get_children(table, parent)
    }

    fn get_by_identifier(&self, table: &TableHandle, code: i32) -> Result<Vec<TreeNode>> {
        self.inner.get_by_identifier(table, code)
    }

    fn scan(&self, table: &TableHandle, offset: usize, limit: usize) -> Result<Vec<TreeNode>> {
        self.inner.scan(table, offset, limit)
    }
}

/// A store wrapper that refuses to insert some node ids
pub struct RefusingStore<S> {
    inner: S,
    refuse: FnvHashSet<NodeId>,
}

impl<S> RefusingStore<S> {
    pub fn new(inner: S, refuse: impl IntoIterator<Item = i32>) -> Self {
        Self {
            inner,
            refuse: refuse.into_iter().map(NodeId).collect(),
        }
    }
}

impl<S: TreeStore> TreeStore for RefusingStore<S> {
    fn table_names(&self) -> Result<Vec<String>> {
        self.inner.table_names()
    }

    fn create_table(&self, name: &str) -> Result<TableHandle> {
        self.inner.create_table(name)
    }

    fn insert(&self, table: &TableHandle, node: &TreeNode) -> std::result::Result<(), InsertError> {
        if self.refuse.contains(&node.node_id) {
            return Err(InsertError::new(node.node_id, "refused"));
        }
        self.inner.insert(table, node)
    }

    fn get_by_id(&self, table: &TableHandle, id: NodeId) -> Result<Option<TreeNode>> {
        self.inner.get_by_id(table, id)
    }

    fn get_children(&self, table: &TableHandle, parent: NodeId) -> Result<Vec<TreeNode>> {
        self.inner.get_children(table, parent)
    }

    fn get_by_identifier(&self, table: &TableHandle, code: i32) -> Result<Vec<TreeNode>> {
        self.inner.get_by_identifier(table, code)
    }

    fn scan(&self, table: &TableHandle, offset: usize, limit: usize) -> Result<Vec<TreeNode>> {
        self.inner.scan(table, offset, limit)
    }
}

/// A well formed forest with unique node ids and parents that precede their children
#[derive(Debug, Clone)]
pub struct TestForest(pub Vec<TreeNode>);

impl Arbitrary for TestForest {
    fn arbitrary(g: &mut Gen) -> Self {
        let specs: Vec<(u8, u8, u16)> = Arbitrary::arbitrary(g);
        let nodes = specs
            .into_iter()
            .enumerate()
            .map(|(i, (parent, code, weight))| {
                let id = i as i32 + 1;
                // parent is either 0 (root) or an earlier node
                let parent = (parent as i32) % id;
                TreeNode::new(id, (code % 8) as i32, parent, (weight as f32 / 1000.0) as f64)
            })
            .collect();
        Self(nodes)
    }
}
