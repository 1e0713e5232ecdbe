//! Arena-backed node tree and borrowed node handles

use super::{Node, NodeId, NodeKind};
use crate::envs::Envs;
use crate::error::{CoreError, Result};
use std::fmt;

/// An immutable pipeline tree: one Flow root plus its Steps.
///
/// The tree exclusively owns every node. Structural links are fixed once
/// `FlowBuilder::build` returns.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    /// The Flow is always the first node of the arena
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        debug_assert!(!nodes.is_empty() && nodes[0].kind == NodeKind::Flow);
        Self { nodes }
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: Self::ROOT,
        }
    }

    /// Raw node access by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Handle for a node id, failing for ids outside this tree's arena
    pub fn get(&self, id: NodeId) -> Result<NodeRef<'_>> {
        if id.0 < self.nodes.len() {
            Ok(NodeRef { tree: self, id })
        } else {
            Err(CoreError::UnknownNode(id.0))
        }
    }

    /// Find a node by its derived path, e.g. `/flow1/step2`
    pub fn find(&self, path: &str) -> Option<NodeRef<'_>> {
        self.iter().find(|node| node.path() == path)
    }

    /// All nodes in construction order (the Flow first, then its Steps)
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len()).map(move |index| NodeRef {
            tree: self,
            id: NodeId(index),
        })
    }

    /// Steps of the root in declaration order
    pub fn steps(&self) -> Vec<NodeRef<'_>> {
        self.root().children()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root, so this is never true
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Borrowed handle to a node inside a `NodeTree`.
///
/// Two handles are equal when they point at the same node of the same tree.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a NodeTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a Node {
        &self.tree.nodes[self.id.0]
    }

    fn handle(&self, id: NodeId) -> NodeRef<'a> {
        NodeRef { tree: self.tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.node().kind
    }

    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    pub fn path(&self) -> &'a str {
        &self.node().path
    }

    pub fn envs(&self) -> &'a Envs {
        &self.node().envs
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| self.handle(id))
    }

    pub fn children(&self) -> Vec<NodeRef<'a>> {
        self.node()
            .children
            .iter()
            .map(|id| self.handle(*id))
            .collect()
    }

    pub fn prev(&self) -> Option<NodeRef<'a>> {
        self.node().prev.map(|id| self.handle(id))
    }

    pub fn next(&self) -> Option<NodeRef<'a>> {
        self.node().next.map(|id| self.handle(id))
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id.0)
            .field("kind", &self.kind())
            .field("path", &self.path())
            .finish()
    }
}
