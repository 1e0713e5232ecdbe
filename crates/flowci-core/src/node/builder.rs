//! Single-pass construction of a node tree

use super::{check_name, Node, NodeId, NodeKind, NodeTree, PATH_SEPARATOR};
use crate::envs::Envs;
use crate::error::{CoreError, Result};

/// Builds a `NodeTree` rooted at a Flow.
///
/// Steps are appended in declaration order. Sibling links are assigned only in
/// `build`, once every child exists, so a half-built tree is never observable.
///
/// # Example
/// ```
/// use flowci_core::{Envs, FlowBuilder};
///
/// let mut builder = FlowBuilder::new("flow1", Envs::new()).unwrap();
/// builder.step("step1", Envs::new()).unwrap();
/// builder.step("step2", Envs::new()).unwrap();
/// let tree = builder.build();
///
/// assert_eq!(tree.root().path(), "/flow1");
/// assert_eq!(tree.root().children()[1].path(), "/flow1/step2");
/// ```
#[derive(Debug)]
pub struct FlowBuilder {
    nodes: Vec<Node>,
}

impl FlowBuilder {
    /// Start a tree with its Flow root
    pub fn new(name: impl Into<String>, envs: Envs) -> Result<Self> {
        let name = name.into();
        check_name(&name)?;

        let root = Node {
            kind: NodeKind::Flow,
            path: format!("{}{}", PATH_SEPARATOR, name),
            name,
            envs,
            parent: None,
            children: Vec::new(),
            prev: None,
            next: None,
        };

        Ok(Self { nodes: vec![root] })
    }

    /// Append a Step under the Flow root
    pub fn step(&mut self, name: impl Into<String>, envs: Envs) -> Result<NodeId> {
        self.child_of(NodeTree::ROOT, name.into(), envs)
    }

    fn child_of(&mut self, parent: NodeId, name: String, envs: Envs) -> Result<NodeId> {
        check_name(&name)?;

        let parent_node = self
            .nodes
            .get(parent.0)
            .ok_or(CoreError::UnknownNode(parent.0))?;

        let duplicate = parent_node
            .children
            .iter()
            .any(|child| self.nodes[child.0].name == name);
        if duplicate {
            return Err(CoreError::DuplicateName {
                parent: parent_node.path.clone(),
                name,
            });
        }

        let id = NodeId(self.nodes.len());
        let path = format!("{}{}{}", parent_node.path, PATH_SEPARATOR, name);
        self.nodes.push(Node {
            kind: NodeKind::Step,
            name,
            path,
            envs,
            parent: Some(parent),
            children: Vec::new(),
            prev: None,
            next: None,
        });
        self.nodes[parent.0].children.push(id);

        Ok(id)
    }

    /// Number of steps appended so far
    pub fn step_count(&self) -> usize {
        self.nodes[NodeTree::ROOT.0].children.len()
    }

    /// Link siblings and hand the finished tree to the caller
    pub fn build(mut self) -> NodeTree {
        for index in 0..self.nodes.len() {
            let children = self.nodes[index].children.clone();
            for pair in children.windows(2) {
                self.nodes[pair[0].0].next = Some(pair[1]);
                self.nodes[pair[1].0].prev = Some(pair[0]);
            }
        }

        log::debug!(
            "built node tree '{}' with {} nodes",
            self.nodes[NodeTree::ROOT.0].path,
            self.nodes.len()
        );

        NodeTree::from_nodes(self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_only() {
        let tree = FlowBuilder::new("flow1", Envs::new()).unwrap().build();
        let root = tree.root();

        assert_eq!(root.kind(), NodeKind::Flow);
        assert_eq!(root.path(), "/flow1");
        assert!(root.parent().is_none());
        assert!(root.children().is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_sibling_links() {
        let mut builder = FlowBuilder::new("flow1", Envs::new()).unwrap();
        let a = builder.step("a", Envs::new()).unwrap();
        let b = builder.step("b", Envs::new()).unwrap();
        let c = builder.step("c", Envs::new()).unwrap();
        assert_eq!(builder.step_count(), 3);
        let tree = builder.build();

        assert_eq!(tree.node(a).unwrap().prev(), None);
        assert_eq!(tree.node(a).unwrap().next(), Some(b));
        assert_eq!(tree.node(b).unwrap().prev(), Some(a));
        assert_eq!(tree.node(b).unwrap().next(), Some(c));
        assert_eq!(tree.node(c).unwrap().prev(), Some(b));
        assert_eq!(tree.node(c).unwrap().next(), None);
    }

    #[test]
    fn test_rejects_duplicate_step() {
        let mut builder = FlowBuilder::new("flow1", Envs::new()).unwrap();
        builder.step("step1", Envs::new()).unwrap();
        let err = builder.step("step1", Envs::new()).unwrap_err();

        assert_eq!(
            err,
            CoreError::DuplicateName {
                parent: "/flow1".to_string(),
                name: "step1".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert!(FlowBuilder::new("", Envs::new()).is_err());
        let mut builder = FlowBuilder::new("flow1", Envs::new()).unwrap();
        assert!(matches!(
            builder.step("a/b", Envs::new()),
            Err(CoreError::InvalidName { .. })
        ));
    }
}
