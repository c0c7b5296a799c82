use crate::node::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("File not found: {}", .0)]
    FileNotFound(String),

    #[error(
        "Incomplete record after {} loaded and {} failed records, {} trailing bytes",
        .loaded,
        .failed,
        .remaining
    )]
    IncompleteRecord {
        loaded: u64,
        failed: u64,
        remaining: usize,
    },

    #[error("Storage unavailable: {}", .0)]
    StorageUnavailable(String),

    #[error("There is no table named {}", .0)]
    NoSuchTable(String),

    #[error("Invalid table name: {:?}", .0)]
    InvalidTableName(String),

    #[error("Table {} already exists", .0)]
    TableExists(String),

    #[error("Parent link of node {} points to missing node {}", .from, .missing)]
    DanglingReference { from: NodeId, missing: NodeId },

    #[error("Cycle detected at node {}", .0)]
    CycleDetected(NodeId),

    #[error("Chain deeper than {} nodes", .0)]
    ChainTooDeep(usize),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid config: {}", .0)]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Insert(#[from] InsertError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "metrics")]
    #[error(transparent)]
    Prometheus(#[from] prometheus::Error),
}

impl Error {
    /// true for errors that only affect a single chain of a query
    pub fn is_chain_local(&self) -> bool {
        matches!(
            self,
            Error::DanglingReference { .. } | Error::CycleDetected(_) | Error::ChainTooDeep(_)
        )
    }
}

/// A single row could not be written. Loading continues after this.
#[derive(Debug, thiserror::Error)]
#[error("Insert of node {} failed: {}", .node, .reason)]
pub struct InsertError {
    pub node: NodeId,
    pub reason: String,
}

impl InsertError {
    pub fn new(node: NodeId, reason: impl ToString) -> Self {
        Self {
            node,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
