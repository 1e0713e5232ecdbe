//! Tests for building node trees from pipeline documents

use flowci_core::{NodeKind, NodeTree};
use flowci_parser::*;
use std::io::Write;
use tempfile::NamedTempFile;

const FLOW_YAML: &str = r#"
name: flow1
envs:
  FLOW_WORKSPACE: "echo hello"
  FLOW_VERSION: "echo version"
steps:
  - name: step1
    envs:
      FLOW_WORKSPACE: "echo step"
      FLOW_VERSION: "echo step version"
  - name: step2
    envs:
      FLOW_WORKSPACE: "echo step2"
"#;

fn assert_flow1(tree: &NodeTree) {
    let root = tree.root();
    assert_eq!(root.kind(), NodeKind::Flow);
    assert_eq!(root.name(), "flow1");
    assert_eq!(root.path(), "/flow1");
    assert!(root.parent().is_none());
    assert_eq!(root.envs().get("FLOW_WORKSPACE"), Some("echo hello"));
    assert_eq!(root.envs().get("FLOW_VERSION"), Some("echo version"));

    let steps = root.children();
    assert_eq!(steps.len(), 2);

    let step1 = steps[0];
    assert_eq!(step1.kind(), NodeKind::Step);
    assert_eq!(step1.path(), "/flow1/step1");
    assert_eq!(step1.envs().get("FLOW_WORKSPACE"), Some("echo step"));
    assert_eq!(step1.envs().get("FLOW_VERSION"), Some("echo step version"));
    assert_eq!(step1.parent(), Some(root));
    assert!(step1.prev().is_none());

    let step2 = steps[1];
    assert_eq!(step2.path(), "/flow1/step2");
    assert_eq!(step2.envs().len(), 1);
    assert_eq!(step2.envs().get("FLOW_WORKSPACE"), Some("echo step2"));
    assert!(step2.envs().get("FLOW_VERSION").is_none());
    assert_eq!(step2.parent(), Some(root));
    assert!(step2.next().is_none());

    assert_eq!(step1.next(), Some(step2));
    assert_eq!(step2.prev(), Some(step1));
}

#[test]
fn test_build_from_text() {
    let tree = NodeParser::build_from_yml(FLOW_YAML).unwrap();
    assert_flow1(&tree);
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_env_keys_are_plain_strings() {
    let yaml = r#"
name: flow1
envs:
  my-var: x
  FLOW.VERSION: y
steps:
  - name: step1
    envs:
      1: one
      with space: two
"#;
    let tree = NodeParser::build_from_yml(yaml).unwrap();

    let root = tree.root();
    assert_eq!(root.envs().get("my-var"), Some("x"));
    assert_eq!(root.envs().get("FLOW.VERSION"), Some("y"));

    let step1 = tree.find("/flow1/step1").unwrap();
    assert_eq!(step1.envs().get("1"), Some("one"));
    assert_eq!(step1.envs().get("with space"), Some("two"));
}

#[test]
fn test_env_keys_colliding_as_text_rejected() {
    let yaml = "name: flow1\nenvs:\n  1: a\n  '1': b\n";
    let err = NodeParser::build_from_yml(yaml).unwrap_err();
    match err {
        ParseError::TypeMismatch { field, actual, .. } => {
            assert_eq!(field, "envs");
            assert_eq!(actual, "duplicate key '1'");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_build_from_file_with_default_charset() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FLOW_YAML.as_bytes()).unwrap();

    let tree = NodeParser::build_from_file(file.path(), DEFAULT_CHARSET).unwrap();
    assert_flow1(&tree);
}

#[test]
fn test_build_from_file_with_bom() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"\xEF\xBB\xBF").unwrap();
    file.write_all(FLOW_YAML.as_bytes()).unwrap();

    let tree = NodeParser::build_from_file(file.path(), Charset::Utf8).unwrap();
    assert_flow1(&tree);
}

#[test]
fn test_build_from_latin1_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"name: flow1\nenvs:\n  GREETING: \"caf\xE9\"\n").unwrap();

    let tree = NodeParser::build_from_file(file.path(), Charset::Latin1).unwrap();
    assert_eq!(tree.root().envs().get("GREETING"), Some("café"));

    let err = NodeParser::build_from_file(file.path(), Charset::Utf8).unwrap_err();
    assert!(matches!(err, ParseError::Decode { ref charset, .. } if charset == "UTF-8"));
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_build_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = NodeParser::build_from_file(dir.path().join("absent.yml"), DEFAULT_CHARSET)
        .unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_non_mapping_document_rejected() {
    let err = NodeParser::build_from_yml("hello test").unwrap_err();
    assert!(err.is_mapping());
    assert!(matches!(err, ParseError::ShapeMismatch { .. }));
}

#[test]
fn test_invalid_node_name_rejected() {
    let err = NodeParser::build_from_yml("name: a/b").unwrap_err();
    assert!(err.is_validation());

    let yaml = "name: flow1\nsteps:\n  - name: ''\n";
    let err = NodeParser::build_from_yml(yaml).unwrap_err();
    assert!(matches!(err, ParseError::InStep { index: 0, .. }));
    assert!(err.root_cause().is_validation());
}

#[test]
fn test_strict_config_rejects_typos() {
    let yaml = "name: flow1\nstpes:\n  - name: step1\n";
    assert!(NodeParser::build_from_yml(yaml).unwrap().steps().is_empty());

    let strict = MappingOptions::strict();
    let err = NodeParser::build_from_yml_with(yaml, &strict).unwrap_err();
    match err {
        ParseError::UnknownFields { message, .. } => {
            assert!(message.contains("Did you mean 'steps'?"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_tree_round_trip_through_yml() {
    let tree = NodeParser::build_from_yml(FLOW_YAML).unwrap();
    let yml = NodeParser::to_yml(&tree).unwrap();
    let rebuilt = NodeParser::build_from_yml(&yml).unwrap();

    assert_flow1(&rebuilt);
    let paths: Vec<&str> = rebuilt.iter().map(|node| node.path()).collect();
    assert_eq!(paths, vec!["/flow1", "/flow1/step1", "/flow1/step2"]);
}

#[test]
fn test_parser_config_from_yaml() {
    let config: ParserConfig =
        serde_yaml::from_str("charset: ISO-8859-1\nmapping:\n  unknown_keys: deny\n").unwrap();
    assert_eq!(config.charset, Charset::Latin1);
    assert_eq!(config.mapping, MappingOptions::strict());

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"name: flow1\nextra: true\n").unwrap();
    let err = NodeParser::build_from_file_with(file.path(), &config).unwrap_err();
    assert!(matches!(err, ParseError::UnknownFields { .. }));
}
