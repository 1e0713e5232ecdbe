//! Pipeline node definitions
//!
//! A pipeline is a tree with a single Flow at the root and ordered Steps below it.
//! Nodes live in an arena (`NodeTree`) and refer to each other through `NodeId`s,
//! so parent and sibling links never own the node they point at.

mod builder;
mod tree;

pub use builder::FlowBuilder;
pub use tree::{NodeRef, NodeTree};

use crate::envs::Envs;
use serde::{Deserialize, Serialize};

/// Separator used when deriving node paths
pub const PATH_SEPARATOR: char = '/';

/// Stable index of a node inside its `NodeTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Root of a pipeline definition
    Flow,
    /// Ordered unit of work nested under a Flow
    Step,
}

/// A single pipeline node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) envs: Envs,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path derived at construction: `/flow` for the root, `<parent path>/<name>` otherwise
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn envs(&self) -> &Envs {
        &self.envs
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

/// Validate a node name before it becomes a path segment
pub(crate) fn check_name(name: &str) -> crate::Result<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains(PATH_SEPARATOR) {
        "name contains the path separator '/'"
    } else if name.trim() != name {
        "name has leading or trailing whitespace"
    } else {
        return Ok(());
    };

    Err(crate::CoreError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_name() {
        assert!(check_name("step1").is_ok());
        assert!(check_name("build and test").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("a/b").is_err());
        assert!(check_name(" padded").is_err());
    }
}
