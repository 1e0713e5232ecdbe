//! Node tree example
//!
//! This example demonstrates:
//! - Building a node tree from a pipeline file in a given charset
//! - Walking parent, children and sibling links
//! - Dumping the tree back to YAML

use anyhow::{Context, Result};
use flowci_parser::{Charset, NodeParser, DEFAULT_CHARSET};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowci_parser=debug,flowci_core=debug".into()),
        )
        .init();

    println!("=== Build Flow Example ===\n");

    let charset = match std::env::args().nth(1) {
        Some(name) => name.parse::<Charset>().map_err(anyhow::Error::msg)?,
        None => DEFAULT_CHARSET,
    };

    let tree = NodeParser::build_from_file("demos/pipelines/flow.yml", charset)
        .with_context(|| format!("Failed to build demos/pipelines/flow.yml as {}", charset))?;

    for node in tree.iter() {
        println!("{:?} {}", node.kind(), node.path());
        if let Some(parent) = node.parent() {
            println!("  parent: {}", parent.path());
        }
        if let Some(prev) = node.prev() {
            println!("  prev:   {}", prev.path());
        }
        if let Some(next) = node.next() {
            println!("  next:   {}", next.path());
        }
        for (key, value) in node.envs().iter() {
            println!("  {} = {}", key, value);
        }
    }

    println!("\nRound trip:\n{}", NodeParser::to_yml(&tree)?);

    match NodeParser::build_from_yml("hello test") {
        Ok(_) => println!("unexpectedly accepted a plain string"),
        Err(e) => println!("Rejected plain string document: {}", e),
    }

    Ok(())
}
