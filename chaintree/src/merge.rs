//! Merging of chains into a minimal tree
//!
//! A [ChainMergeTree] collects root-first chains and shares common prefixes, so that ancestry
//! that is shared between several chains appears exactly once.
//!
//! Two nodes are considered the same if they have the same identifier code and the same
//! position in the tree. When a node has several children with the same identifier code,
//! the first one is followed. Weights are never compared.
//!
//! Nodes live in an arena and refer to their children by index, so neither merging nor
//! traversal needs recursion.
use crate::node::{Chain, NodeId, TreeNode};

/// index of a node in a [ChainMergeTree]
pub type NodeIndex = usize;

/// A node of a merge tree
#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    pub identifier_code: i32,
    pub weight: f64,
    /// position in the chain it was created from. The first chain element has depth 0.
    pub depth: usize,
    /// id of the stored node this was created from. Not used for matching.
    pub source: NodeId,
    children: Vec<NodeIndex>,
    is_root: bool,
}

impl ChainNode {
    fn root() -> Self {
        Self {
            identifier_code: 0,
            weight: 0.0,
            depth: 0,
            source: NodeId::ROOT,
            children: Vec::new(),
            is_root: true,
        }
    }

    fn new(node: &TreeNode, depth: usize) -> Self {
        Self {
            identifier_code: node.identifier_code,
            weight: node.weight,
            depth,
            source: node.node_id,
            children: Vec::new(),
            is_root: false,
        }
    }

    /// children in insertion order
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// true for the synthetic root that anchors the tree
    pub fn is_root(&self) -> bool {
        self.is_root
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainMergeTree {
    nodes: Vec<ChainNode>,
}

impl Default for ChainMergeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainMergeTree {
    /// index of the synthetic root
    pub const ROOT: NodeIndex = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![ChainNode::root()],
        }
    }

    /// Merge a root-first chain into the tree.
    ///
    /// Returns the number of nodes that were added. Inserting a chain that is already present
    /// adds nothing.
    pub fn insert_chain(&mut self, chain: &Chain) -> usize {
        self.insert_nodes(chain.nodes())
    }

    /// Merge a root-first sequence of nodes into the tree. See [ChainMergeTree::insert_chain].
    pub fn insert_nodes(&mut self, chain: &[TreeNode]) -> usize {
        let mut current = Self::ROOT;
        for (depth, node) in chain.iter().enumerate() {
            let existing = self.nodes[current]
                .children
                .iter()
                .copied()
                .find(|child| self.nodes[*child].identifier_code == node.identifier_code);
            match existing {
                Some(child) => current = child,
                None => {
                    // no match at this depth, the rest of the chain becomes a new branch
                    for (offset, node) in chain[depth..].iter().enumerate() {
                        current = self.push_child(current, ChainNode::new(node, depth + offset));
                    }
                    return chain.len() - depth;
                }
            }
        }
        0
    }

    /// append a node to `parent` without any matching
    pub(crate) fn append(&mut self, parent: NodeIndex, node: &TreeNode, depth: usize) -> NodeIndex {
        self.push_child(parent, ChainNode::new(node, depth))
    }

    fn push_child(&mut self, parent: NodeIndex, node: ChainNode) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(node);
        self.nodes[parent].children.push(index);
        index
    }

    pub fn get(&self, index: NodeIndex) -> Option<&ChainNode> {
        self.nodes.get(index)
    }

    pub fn root(&self) -> &ChainNode {
        &self.nodes[Self::ROOT]
    }

    /// number of nodes, not counting the synthetic root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// render the tree, see [crate::render::TreeRenderer]
    pub fn render(&self, highlight: Option<i32>) -> crate::render::TreeRenderer<'_> {
        crate::render::TreeRenderer::new(self, highlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    fn codes(tree: &ChainMergeTree, index: NodeIndex) -> Vec<i32> {
        tree.get(index)
            .unwrap()
            .children()
            .iter()
            .map(|c| tree.get(*c).unwrap().identifier_code)
            .collect()
    }

    #[test]
    fn shared_prefix_appears_once() {
        let mut tree = ChainMergeTree::new();
        tree.insert_nodes(&[TreeNode::new(1, 100, 0, 1.0), TreeNode::new(2, 200, 1, 0.5)]);
        tree.insert_nodes(&[TreeNode::new(1, 100, 0, 1.0), TreeNode::new(3, 300, 1, 0.8)]);
        assert_eq!(codes(&tree, ChainMergeTree::ROOT), vec![100]);
        let a = tree.root().children()[0];
        assert_eq!(codes(&tree, a), vec![200, 300]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn first_equal_identifier_wins() {
        let mut tree = ChainMergeTree::new();
        tree.insert_nodes(&[TreeNode::new(1, 1, 0, 1.0), TreeNode::new(2, 2, 1, 0.5)]);
        let added = tree.insert_nodes(&[TreeNode::new(1, 1, 0, 1.0), TreeNode::new(3, 2, 1, 0.8)]);
        assert_eq!(added, 0);
        let a = tree.root().children()[0];
        let a_children = tree.get(a).unwrap().children();
        assert_eq!(a_children.len(), 1);
        // the weight of the first chain is kept
        assert_eq!(tree.get(a_children[0]).unwrap().weight, 0.5);
    }

    #[test]
    fn unmatched_suffix_is_appended_as_a_run() {
        let mut tree = ChainMergeTree::new();
        tree.insert_nodes(&[TreeNode::new(1, 1, 0, 1.0)]);
        let added = tree.insert_nodes(&[
            TreeNode::new(1, 1, 0, 1.0),
            TreeNode::new(2, 2, 1, 1.0),
            TreeNode::new(3, 3, 2, 1.0),
        ]);
        assert_eq!(added, 2);
        let a = tree.root().children()[0];
        let b = tree.get(a).unwrap().children()[0];
        let c = tree.get(b).unwrap().children()[0];
        assert_eq!(tree.get(b).unwrap().depth, 1);
        assert_eq!(tree.get(c).unwrap().depth, 2);
        assert!(!tree.get(c).unwrap().has_children());
    }

    #[test]
    fn empty_chain_adds_nothing() {
        let mut tree = ChainMergeTree::new();
        assert_eq!(tree.insert_nodes(&[]), 0);
        assert!(tree.is_empty());
        assert!(tree.root().is_root());
    }

    #[derive(Debug, Clone)]
    struct Chains(Vec<Vec<TreeNode>>);

    impl Arbitrary for Chains {
        fn arbitrary(g: &mut Gen) -> Self {
            let chains: Vec<Vec<u8>> = Arbitrary::arbitrary(g);
            Self(
                chains
                    .into_iter()
                    .map(|codes| {
                        codes
                            .into_iter()
                            .enumerate()
                            // few distinct codes, so that chains actually share prefixes
                            .map(|(i, c)| {
                                TreeNode::new(i as i32 + 1, (c % 4) as i32, i as i32, 1.0)
                            })
                            .collect()
                    })
                    .collect(),
            )
        }
    }

    #[quickcheck]
    fn insert_chain_is_idempotent(chains: Chains) -> bool {
        let mut once = ChainMergeTree::new();
        for chain in &chains.0 {
            once.insert_nodes(chain);
        }
        let mut twice = once.clone();
        let added: usize = chains.0.iter().map(|c| twice.insert_nodes(c)).sum();
        added == 0 && once == twice
    }

    #[quickcheck]
    fn every_chain_is_a_path(chains: Chains) -> bool {
        let mut tree = ChainMergeTree::new();
        for chain in &chains.0 {
            tree.insert_nodes(chain);
        }
        chains.0.iter().all(|chain| {
            let mut current = ChainMergeTree::ROOT;
            chain.iter().all(|node| {
                let next = tree.get(current).unwrap().children().iter().copied().find(|c| {
                    tree.get(*c).unwrap().identifier_code == node.identifier_code
                });
                match next {
                    Some(next) => {
                        current = next;
                        true
                    }
                    None => false,
                }
            })
        })
    }
}
