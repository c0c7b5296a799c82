//! resolution of root paths by following parent links
use crate::{
    error::{Error, Result},
    node::{Chain, NodeId, TreeNode},
    store::{TableHandle, TreeStore},
};
use fnv::FnvHashSet;
use smallvec::SmallVec;
use tracing::trace;

/// Walks parent links from a node up to its root.
///
/// The data is not validated at load time, so the walk guards against parent links that
/// point to missing nodes and against cycles.
#[derive(Debug, Clone, Copy)]
pub struct ChainResolver {
    max_depth: usize,
}

impl Default for ChainResolver {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl ChainResolver {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// the chain from the root down to `node`
    pub fn root_path<S: TreeStore + ?Sized>(
        &self,
        store: &S,
        table: &TableHandle,
        node: NodeId,
    ) -> Result<Chain> {
        let start = store
            .get_by_id(table, node)?
            .ok_or(Error::DanglingReference {
                from: NodeId::ROOT,
                missing: node,
            })?;
        self.root_path_from(store, table, start)
    }

    /// the chain from the root down to `start`, for a node that was already loaded
    pub fn root_path_from<S: TreeStore + ?Sized>(
        &self,
        store: &S,
        table: &TableHandle,
        start: TreeNode,
    ) -> Result<Chain> {
        let res = self.walk(store, table, start);
        record_metrics(&res);
        res
    }

    fn walk<S: TreeStore + ?Sized>(
        &self,
        store: &S,
        table: &TableHandle,
        start: TreeNode,
    ) -> Result<Chain> {
        let mut visited = FnvHashSet::default();
        let mut nodes: SmallVec<[TreeNode; 16]> = SmallVec::new();
        let mut current = start;
        loop {
            if !visited.insert(current.node_id) {
                return Err(Error::CycleDetected(current.node_id));
            }
            if nodes.len() >= self.max_depth {
                return Err(Error::ChainTooDeep(self.max_depth));
            }
            nodes.push(current);
            if current.is_root() {
                break;
            }
            trace!("{} -> {}", current.node_id, current.parent_id);
            current = store
                .get_by_id(table, current.parent_id)?
                .ok_or(Error::DanglingReference {
                    from: current.node_id,
                    missing: current.parent_id,
                })?;
        }
        Ok(Chain::from_leaf_first(nodes))
    }
}

#[cfg(feature = "metrics")]
fn record_metrics(res: &Result<Chain>) {
    match res {
        Ok(chain) => {
            crate::prom::CHAINS_RESOLVED.inc();
            crate::prom::CHAIN_LEN_HIST.observe(chain.len() as f64);
        }
        Err(cause) if cause.is_chain_local() => crate::prom::CHAIN_FAILURES.inc(),
        Err(_) => {}
    }
}

#[cfg(not(feature = "metrics"))]
fn record_metrics(_: &Result<Chain>) {}
