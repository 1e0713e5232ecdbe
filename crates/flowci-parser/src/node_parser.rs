//! Pipeline node tree builder
//!
//! Maps a pipeline document onto its definition contracts and assembles the
//! resulting `NodeTree`:
//!
//! ```yaml
//! name: flow1
//! envs:
//!   FLOW_WORKSPACE: "echo hello"
//! steps:
//!   - name: step1
//!     envs:
//!       FLOW_WORKSPACE: "echo step"
//!   - name: step2
//! ```

use crate::config::{Charset, MappingOptions, ParserConfig};
use crate::contract::{FieldContract, FieldKind, YmlContract};
use crate::error::{ParseError, Result};
use crate::yml_parser::YmlParser;
use flowci_core::{Envs, FlowBuilder, NodeTree};
use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;
use std::path::Path;

/// Root of a pipeline document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub name: String,
    pub envs: Envs,
    /// Step documents, bound one by one while the tree is built
    pub steps: Vec<YamlValue>,
}

impl YmlContract for FlowDefinition {
    fn contract() -> Vec<FieldContract> {
        vec![
            FieldContract::new("name", FieldKind::String).validator("node_name"),
            FieldContract::new("envs", FieldKind::map_of(FieldKind::String)).optional(),
            FieldContract::new("steps", FieldKind::list_of(FieldKind::Raw)).optional(),
        ]
    }
}

/// One entry of a pipeline document's `steps`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    pub envs: Envs,
}

impl YmlContract for StepDefinition {
    fn contract() -> Vec<FieldContract> {
        vec![
            FieldContract::new("name", FieldKind::String).validator("node_name"),
            FieldContract::new("envs", FieldKind::map_of(FieldKind::String)).optional(),
        ]
    }
}

/// Node tree builder
pub struct NodeParser;

impl NodeParser {
    /// Build a node tree from pipeline YAML text
    pub fn build_from_yml(yaml_str: &str) -> Result<NodeTree> {
        Self::build_from_yml_with(yaml_str, &MappingOptions::default())
    }

    pub fn build_from_yml_with(yaml_str: &str, options: &MappingOptions) -> Result<NodeTree> {
        let definition: FlowDefinition = YmlParser::from_yml_with(yaml_str, options)?;
        Self::build_from_definition(definition, options)
    }

    /// Build a node tree from a pipeline file read in the given charset
    pub fn build_from_file(path: impl AsRef<Path>, charset: Charset) -> Result<NodeTree> {
        Self::build_from_file_with(path, &ParserConfig::new().with_charset(charset))
    }

    pub fn build_from_file_with(path: impl AsRef<Path>, config: &ParserConfig) -> Result<NodeTree> {
        let path = path.as_ref();
        log::debug!("loading pipeline file {} as {}", path.display(), config.charset);

        let bytes = std::fs::read(path)?;
        let yaml_str = config
            .charset
            .decode(&bytes)
            .map_err(|message| ParseError::Decode {
                path: path.display().to_string(),
                charset: config.charset.to_string(),
                message,
            })?;

        Self::build_from_yml_with(&yaml_str, &config.mapping)
    }

    /// Assemble the tree from a bound root definition.
    ///
    /// Steps are bound and appended in document order; sibling links are set
    /// only once all of them exist. Nothing is returned unless every step binds.
    pub fn build_from_definition(
        definition: FlowDefinition,
        options: &MappingOptions,
    ) -> Result<NodeTree> {
        log::debug!(
            "building flow '{}' with {} steps",
            definition.name,
            definition.steps.len()
        );
        let mut builder = FlowBuilder::new(definition.name, definition.envs)?;

        for (index, raw) in definition.steps.iter().enumerate() {
            let step: StepDefinition =
                YmlParser::from_value_with(raw, options).map_err(|e| e.in_step(index))?;
            builder
                .step(step.name, step.envs)
                .map_err(|e| ParseError::from(e).in_step(index))?;
        }

        Ok(builder.build())
    }

    /// Root definition describing an existing tree
    pub fn to_definition(tree: &NodeTree) -> Result<FlowDefinition> {
        let root = tree.root();
        let steps = root
            .children()
            .iter()
            .map(|step| {
                YmlParser::to_value(&StepDefinition {
                    name: step.name().to_string(),
                    envs: step.envs().clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FlowDefinition {
            name: root.name().to_string(),
            envs: root.envs().clone(),
            steps,
        })
    }

    /// Dump a tree back to a pipeline document
    pub fn to_yml(tree: &NodeTree) -> Result<String> {
        YmlParser::to_yml(&Self::to_definition(tree)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_without_steps() {
        let tree = NodeParser::build_from_yml("name: lonely").unwrap();
        assert_eq!(tree.root().path(), "/lonely");
        assert!(tree.steps().is_empty());
        assert!(tree.root().envs().is_empty());
    }

    #[test]
    fn test_step_error_carries_index() {
        let yaml = r#"
name: flow1
steps:
  - name: step1
  - envs:
      A: b
"#;
        let err = NodeParser::build_from_yml(yaml).unwrap_err();
        match err {
            ParseError::InStep { index, ref source } => {
                assert_eq!(index, 1);
                assert!(matches!(**source, ParseError::MissingField { ref field, .. } if field == "name"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_step_names_rejected() {
        let yaml = r#"
name: flow1
steps:
  - name: build
  - name: build
"#;
        let err = NodeParser::build_from_yml(yaml).unwrap_err();
        assert!(err.is_mapping());
        assert!(matches!(err.root_cause(), ParseError::Build(_)));
    }

    #[test]
    fn test_to_definition_keeps_step_order() {
        let yaml = r#"
name: flow1
steps:
  - name: b
  - name: a
"#;
        let tree = NodeParser::build_from_yml(yaml).unwrap();
        let definition = NodeParser::to_definition(&tree).unwrap();
        let names: Vec<&str> = definition
            .steps
            .iter()
            .filter_map(|step| step.get("name").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
