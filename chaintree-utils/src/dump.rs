//! graph and table dumps
use crate::error::Result;
use chaintree::{merge::NodeIndex, ChainMergeTree, TreeNode};
use std::io::Write;

type Node = NodeIndex;
type Edge = (NodeIndex, NodeIndex);

struct MergeGraph<'a> {
    tree: &'a ChainMergeTree,
    highlight: Option<i32>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl<'a> MergeGraph<'a> {
    fn new(tree: &'a ChainMergeTree, highlight: Option<i32>) -> Self {
        let mut nodes = Vec::with_capacity(tree.len());
        let mut edges = Vec::with_capacity(tree.len());
        // the synthetic root is not part of the graph, but its children are
        for index in 0..=tree.len() {
            let node = match tree.get(index) {
                Some(node) => node,
                None => continue,
            };
            if !node.is_root() {
                nodes.push(index);
                edges.extend(node.children().iter().map(|child| (index, *child)));
            }
        }
        Self {
            tree,
            highlight,
            nodes,
            edges,
        }
    }

    fn is_highlighted(&self, n: Node) -> bool {
        match (self.tree.get(n), self.highlight) {
            (Some(node), Some(code)) => node.identifier_code == code,
            _ => false,
        }
    }
}

impl<'a> dot::Labeller<'a, Node, Edge> for MergeGraph<'a> {
    fn graph_id(&'a self) -> dot::Id<'a> {
        dot::Id::new("chains").unwrap()
    }

    fn node_id(&'a self, n: &Node) -> dot::Id<'a> {
        dot::Id::new(format!("N{}", n)).unwrap()
    }

    fn node_label(&'a self, n: &Node) -> dot::LabelText<'a> {
        let label = match self.tree.get(*n) {
            Some(node) => format!("kza:{} RelProd:{:?}", node.identifier_code, node.weight),
            None => String::new(),
        };
        dot::LabelText::label(label)
    }

    fn node_shape(&'a self, n: &Node) -> Option<dot::LabelText<'a>> {
        let top = self.tree.get(*n).map(|node| node.depth == 0).unwrap_or_default();
        Some(dot::LabelText::label(if top { "box" } else { "ellipse" }))
    }

    fn node_color(&'a self, n: &Node) -> Option<dot::LabelText<'a>> {
        if self.is_highlighted(*n) {
            Some(dot::LabelText::label("grey"))
        } else {
            None
        }
    }

    fn node_style(&'a self, n: &Node) -> dot::Style {
        if self.is_highlighted(*n) {
            dot::Style::Filled
        } else {
            dot::Style::None
        }
    }
}

impl<'a> dot::GraphWalk<'a, Node, Edge> for MergeGraph<'a> {
    fn nodes(&'a self) -> dot::Nodes<'a, Node> {
        self.nodes.iter().copied().collect()
    }

    fn edges(&'a self) -> dot::Edges<'a, Edge> {
        self.edges.iter().copied().collect()
    }

    fn source(&'a self, edge: &Edge) -> Node {
        edge.0
    }

    fn target(&'a self, edge: &Edge) -> Node {
        edge.1
    }
}

/// Write a merge tree as a graphviz digraph. Nodes with the `highlight` code are filled.
///
/// Can be piped directly: `chaintree-cli graph ... | dot -Tpng -o chains.png`.
pub fn graph(
    tree: &ChainMergeTree,
    highlight: Option<i32>,
    mut out: impl Write,
) -> Result<()> {
    let graph = MergeGraph::new(tree, highlight);
    dot::render(&graph, &mut out)?;
    Ok(())
}

/// Write pages of table rows, repeating the header before every page.
pub fn table(
    name: &str,
    pages: impl IntoIterator<Item = chaintree::Result<Vec<TreeNode>>>,
    mut out: impl Write,
) -> Result<()> {
    for (i, page) in pages.into_iter().enumerate() {
        let page = page?;
        if i == 0 {
            writeln!(out, "{}", name)?;
        } else {
            writeln!(out, "{}  (continue)", name)?;
        }
        writeln!(out, "NodeNum\tKza\tParNumber\tRelProd")?;
        for node in page {
            writeln!(
                out,
                "{}\t{}\t{}\t{:?}",
                node.node_id, node.identifier_code, node.parent_id, node.weight
            )?;
        }
    }
    Ok(())
}
