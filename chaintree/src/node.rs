//! persisted rows and in-flight chains
use derive_more::{Display, From, Into};
use smallvec::SmallVec;

/// Id of a persisted node. `0` is reserved as the parent of roots.
#[derive(Debug, Display, From, Into, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i32);

impl NodeId {
    /// parent id of a root node
    pub const ROOT: NodeId = NodeId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

/// One row of a tree table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeNode {
    pub node_id: NodeId,
    /// species code (kza). Not unique across nodes.
    pub identifier_code: i32,
    pub parent_id: NodeId,
    /// relative production of this node from its parent
    pub weight: f64,
}

impl TreeNode {
    pub fn new(node_id: i32, identifier_code: i32, parent_id: i32, weight: f64) -> Self {
        Self {
            node_id: NodeId(node_id),
            identifier_code,
            parent_id: NodeId(parent_id),
            weight,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_root()
    }
}

/// A root-first sequence of nodes, ending at the node it was resolved for.
///
/// Decay chains are short, so the common case does not allocate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain(SmallVec<[TreeNode; 16]>);

impl Chain {
    /// build a chain from nodes collected while walking up from the target
    pub(crate) fn from_leaf_first(mut nodes: SmallVec<[TreeNode; 16]>) -> Self {
        nodes.reverse();
        Chain(nodes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.0
    }

    /// the node the chain was resolved for
    pub fn target(&self) -> Option<&TreeNode> {
        self.0.last()
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.0.iter()
    }

    pub fn identifier_codes(&self) -> Vec<i32> {
        self.0.iter().map(|n| n.identifier_code).collect()
    }
}

impl std::iter::FromIterator<TreeNode> for Chain {
    fn from_iter<I: IntoIterator<Item = TreeNode>>(iter: I) -> Self {
        Chain(iter.into_iter().collect())
    }
}

impl From<Vec<TreeNode>> for Chain {
    fn from(nodes: Vec<TreeNode>) -> Self {
        Chain(nodes.into())
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a TreeNode;
    type IntoIter = std::slice::Iter<'a, TreeNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
