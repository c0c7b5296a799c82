//! text rendering of merge trees and chains
use crate::{
    merge::{ChainMergeTree, ChainNode, NodeIndex},
    node::{Chain, TreeNode},
};
use smallvec::{smallvec, SmallVec};
use std::fmt::Write;

/// marker appended to nodes with the highlighted identifier code
pub const HIGHLIGHT: &str = " ** ";

/// Pre-order depth first rendering of a [ChainMergeTree], one line per node.
///
/// The synthetic root is not rendered. Each line is indented by `"  |"` per level of depth,
/// followed by `"  |-> kza:<code> RelProd:<weight>"`. Rendering does not modify the tree, so
/// rendering the same tree again gives the same lines.
pub struct TreeRenderer<'a> {
    tree: &'a ChainMergeTree,
    highlight: Option<i32>,
    stack: SmallVec<[TraverseState; 16]>,
}

struct TraverseState {
    index: NodeIndex,
    // next child to visit
    position: usize,
}

impl TraverseState {
    fn new(index: NodeIndex) -> Self {
        Self { index, position: 0 }
    }
}

impl<'a> TreeRenderer<'a> {
    pub fn new(tree: &'a ChainMergeTree, highlight: Option<i32>) -> Self {
        Self {
            tree,
            highlight,
            stack: smallvec![TraverseState::new(ChainMergeTree::ROOT)],
        }
    }
}

impl<'a> Iterator for TreeRenderer<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let head = self.stack.last_mut()?;
            let children = self.tree.get(head.index)?.children();
            if head.position >= children.len() {
                // exhausted: ascend
                self.stack.pop();
                continue;
            }
            let child = children[head.position];
            head.position += 1;
            self.stack.push(TraverseState::new(child));
            let node = self.tree.get(child)?;
            return Some(render_line(node, self.highlight));
        }
    }
}

/// render a single node of a merge tree
pub fn render_line(node: &ChainNode, highlight: Option<i32>) -> String {
    let mut line = "  |".repeat(node.depth);
    write!(
        line,
        "  |-> kza:{} RelProd:{:?}",
        node.identifier_code, node.weight
    )
    .ok();
    if highlight == Some(node.identifier_code) {
        line.push_str(HIGHLIGHT);
    }
    line
}

fn render_element(node: &TreeNode, highlight: i32) -> String {
    let mut res = format!("kza:{} RelProd:{:?}", node.identifier_code, node.weight);
    if node.identifier_code == highlight {
        res.push_str(HIGHLIGHT);
    }
    res
}

/// render a chain root first on one line, marking nodes with the given code
pub fn render_chain(chain: &Chain, highlight: i32) -> String {
    chain
        .iter()
        .map(|node| render_element(node, highlight))
        .collect::<Vec<_>>()
        .join(" ---> ")
}
