//! Custom field contract example
//!
//! This example demonstrates:
//! - Declaring field contracts for an application type
//! - Registering a custom adaptor and validator
//! - Mapping a document list and writing it back

use anyhow::Result;
use flowci_core::Envs;
use flowci_parser::{
    register_adaptor, register_validator, FieldContract, FieldKind, MappingOptions, YmlContract,
    YmlParser,
};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Agent {
    zone: String,
    tags: Vec<String>,
}

impl YmlContract for Agent {
    fn contract() -> Vec<FieldContract> {
        vec![
            FieldContract::new("zone", FieldKind::String).adaptor("lowercase"),
            FieldContract::new("tags", FieldKind::list_of(FieldKind::String)).optional(),
        ]
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Job {
    name: String,
    timeout_secs: i64,
    envs: Envs,
    agent: Agent,
    /// Runtime state, never read from or written to documents
    attempts: u32,
}

impl YmlContract for Job {
    fn contract() -> Vec<FieldContract> {
        vec![
            FieldContract::new("name", FieldKind::String).validator("node_name"),
            FieldContract::new("timeout_secs", FieldKind::Integer)
                .rename("timeout")
                .adaptor("duration_secs")
                .validator("positive"),
            FieldContract::new("envs", FieldKind::map_of(FieldKind::String))
                .optional()
                .validator("env_key"),
            FieldContract::new("agent", FieldKind::object::<Agent>()),
            FieldContract::new("attempts", FieldKind::Integer).ignore(),
        ]
    }
}

/// Accepts plain seconds or `<n>s` / `<n>m` strings
fn duration_secs(raw: &Value) -> Result<Value, String> {
    if let Some(secs) = raw.as_i64() {
        return Ok(Value::from(secs));
    }

    let text = raw.as_str().ok_or("expected a duration")?.trim();
    let (digits, factor) = match text.strip_suffix('m') {
        Some(minutes) => (minutes, 60),
        None => (text.strip_suffix('s').unwrap_or(text), 1),
    };
    digits
        .parse::<i64>()
        .map(|n| Value::from(n * factor))
        .map_err(|_| format!("invalid duration '{}'", text))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowci_parser=debug".into()),
        )
        .init();

    println!("=== Custom Contract Example ===\n");

    register_adaptor("duration_secs", duration_secs);
    register_validator("positive", |value: &Value| match value.as_i64() {
        Some(n) if n > 0 => Ok(()),
        _ => Err("must be a positive number".to_string()),
    });

    let yaml = r#"
- name: build
  timeout: 5m
  envs:
    RUST_LOG: debug
  agent:
    zone: EU-WEST
    tags: [linux, 64]
- name: test
  timeout: '90'
  agent:
    zone: us-east
  attemps: 3
"#;

    let jobs: Vec<Job> = YmlParser::from_yml_seq(yaml)?;
    for job in &jobs {
        println!(
            "{}: timeout={}s zone={} tags={:?} envs={}",
            job.name,
            job.timeout_secs,
            job.agent.zone,
            job.agent.tags,
            job.envs.len()
        );
    }

    println!("\nWritten back:\n{}", YmlParser::to_yml_seq(&jobs)?);

    match YmlParser::from_yml_seq_with::<Job>(yaml, &MappingOptions::strict()) {
        Ok(_) => println!("strict mapping unexpectedly succeeded"),
        Err(e) => println!("Strict mapping failed: {}", e.root_cause()),
    }

    match YmlParser::from_yml::<Job>("name: deploy\ntimeout: 0\nagent: {zone: eu}") {
        Ok(_) => println!("zero timeout unexpectedly accepted"),
        Err(e) => println!("Validation failed: {}", e),
    }

    Ok(())
}
