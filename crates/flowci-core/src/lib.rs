//! flowci Core - pipeline node model
//!
//! This crate provides the tree representation of a pipeline definition:
//! - `NodeTree`: an arena owning one Flow and its ordered Steps
//! - `FlowBuilder`: the single construction pass that derives paths and links
//! - `Envs`: insertion-ordered environment entries attached to every node
//! - Error types

pub mod envs;
pub mod error;
pub mod node;

// Re-export commonly used types
pub use envs::Envs;
pub use error::{CoreError, Result};
pub use node::{FlowBuilder, Node, NodeId, NodeKind, NodeRef, NodeTree, PATH_SEPARATOR};
