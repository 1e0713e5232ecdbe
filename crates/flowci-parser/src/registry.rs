//! Adaptor and validator registry
//!
//! Field contracts name their adaptor and validator by a stable identifier.
//! Identifiers are resolved here once, when a type's descriptor table is
//! built, and the resolved capability is stored in the descriptor.
//!
//! Built-in adaptors: `trim`, `lowercase`, `uppercase`, `to_string`.
//! Built-in validators: `not_empty`, `node_name`, `env_key`, `non_negative`.

use dashmap::DashMap;
use serde_yaml::Value as YamlValue;
use std::sync::{Arc, OnceLock};

/// Converts a raw document value into the field's typed value
pub trait Adaptor: Send + Sync {
    fn convert(&self, raw: &YamlValue) -> Result<YamlValue, String>;
}

impl<F> Adaptor for F
where
    F: Fn(&YamlValue) -> Result<YamlValue, String> + Send + Sync,
{
    fn convert(&self, raw: &YamlValue) -> Result<YamlValue, String> {
        self(raw)
    }
}

/// Accepts or rejects an adapted value
pub trait Validator: Send + Sync {
    fn validate(&self, value: &YamlValue) -> Result<(), String>;
}

impl<F> Validator for F
where
    F: Fn(&YamlValue) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, value: &YamlValue) -> Result<(), String> {
        self(value)
    }
}

struct Registry {
    adaptors: DashMap<String, Arc<dyn Adaptor>>,
    validators: DashMap<String, Arc<dyn Validator>>,
}

impl Registry {
    fn with_builtins() -> Self {
        let registry = Self {
            adaptors: DashMap::new(),
            validators: DashMap::new(),
        };

        registry.adaptors.insert("trim".into(), Arc::new(trim));
        registry.adaptors.insert("lowercase".into(), Arc::new(lowercase));
        registry.adaptors.insert("uppercase".into(), Arc::new(uppercase));
        registry.adaptors.insert("to_string".into(), Arc::new(to_string));

        registry.validators.insert("not_empty".into(), Arc::new(not_empty));
        registry.validators.insert("node_name".into(), Arc::new(node_name));
        registry.validators.insert("env_key".into(), Arc::new(env_key));
        registry.validators.insert("non_negative".into(), Arc::new(non_negative));

        registry
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::with_builtins)
}

/// Register an adaptor under `id`, returning true if it replaced another one.
///
/// Descriptor tables are resolved once per type, so registration must happen
/// before the first mapping of any type that references `id`.
pub fn register_adaptor(id: impl Into<String>, adaptor: impl Adaptor + 'static) -> bool {
    let id = id.into();
    log::debug!("registering adaptor '{}'", id);
    registry().adaptors.insert(id, Arc::new(adaptor)).is_some()
}

/// Register a validator under `id`, returning true if it replaced another one
pub fn register_validator(id: impl Into<String>, validator: impl Validator + 'static) -> bool {
    let id = id.into();
    log::debug!("registering validator '{}'", id);
    registry().validators.insert(id, Arc::new(validator)).is_some()
}

pub fn adaptor(id: &str) -> Option<Arc<dyn Adaptor>> {
    registry().adaptors.get(id).map(|entry| Arc::clone(entry.value()))
}

pub fn validator(id: &str) -> Option<Arc<dyn Validator>> {
    registry().validators.get(id).map(|entry| Arc::clone(entry.value()))
}

/// Registered adaptor identifiers, sorted
pub fn adaptor_ids() -> Vec<String> {
    let mut ids: Vec<String> = registry().adaptors.iter().map(|e| e.key().clone()).collect();
    ids.sort();
    ids
}

/// Registered validator identifiers, sorted
pub fn validator_ids() -> Vec<String> {
    let mut ids: Vec<String> = registry().validators.iter().map(|e| e.key().clone()).collect();
    ids.sort();
    ids
}

fn expect_str<'a>(value: &'a YamlValue, what: &str) -> Result<&'a str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("{} expects a string, got {}", what, type_name(value)))
}

/// Name of a YAML value's shape, used in diagnostics
pub(crate) fn type_name(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "boolean",
        YamlValue::Number(n) if n.is_f64() => "float",
        YamlValue::Number(_) => "integer",
        YamlValue::String(_) => "string",
        YamlValue::Sequence(_) => "sequence",
        YamlValue::Mapping(_) => "mapping",
        YamlValue::Tagged(_) => "tagged value",
    }
}

fn trim(raw: &YamlValue) -> Result<YamlValue, String> {
    Ok(YamlValue::String(expect_str(raw, "trim")?.trim().to_string()))
}

fn lowercase(raw: &YamlValue) -> Result<YamlValue, String> {
    Ok(YamlValue::String(expect_str(raw, "lowercase")?.to_lowercase()))
}

fn uppercase(raw: &YamlValue) -> Result<YamlValue, String> {
    Ok(YamlValue::String(expect_str(raw, "uppercase")?.to_uppercase()))
}

fn to_string(raw: &YamlValue) -> Result<YamlValue, String> {
    match raw {
        YamlValue::String(_) => Ok(raw.clone()),
        YamlValue::Bool(b) => Ok(YamlValue::String(b.to_string())),
        YamlValue::Number(n) => Ok(YamlValue::String(n.to_string())),
        other => Err(format!("to_string expects a scalar, got {}", type_name(other))),
    }
}

fn not_empty(value: &YamlValue) -> Result<(), String> {
    let empty = match value {
        YamlValue::Null => true,
        YamlValue::String(s) => s.trim().is_empty(),
        YamlValue::Sequence(seq) => seq.is_empty(),
        YamlValue::Mapping(map) => map.is_empty(),
        _ => false,
    };

    if empty {
        Err("must not be empty".to_string())
    } else {
        Ok(())
    }
}

fn node_name(value: &YamlValue) -> Result<(), String> {
    let name = expect_str(value, "node_name")?;
    if name.is_empty() {
        Err("node name must not be empty".to_string())
    } else if name.contains('/') {
        Err(format!("node name '{}' must not contain '/'", name))
    } else if name.trim() != name {
        Err(format!("node name '{}' has leading or trailing whitespace", name))
    } else {
        Ok(())
    }
}

fn is_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn env_key(value: &YamlValue) -> Result<(), String> {
    let check = |key: &str| {
        if is_env_key(key) {
            Ok(())
        } else {
            Err(format!("'{}' is not a valid environment variable name", key))
        }
    };

    match value {
        YamlValue::String(key) => check(key.as_str()),
        YamlValue::Mapping(map) => map
            .iter()
            .try_for_each(|(key, _)| check(key.as_str().unwrap_or_default())),
        other => Err(format!("env_key expects a string or mapping, got {}", type_name(other))),
    }
}

fn non_negative(value: &YamlValue) -> Result<(), String> {
    match value.as_f64() {
        Some(n) if n >= 0.0 => Ok(()),
        Some(n) => Err(format!("{} is negative", n)),
        None => Err(format!("non_negative expects a number, got {}", type_name(value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> YamlValue {
        YamlValue::String(value.to_string())
    }

    #[test]
    fn test_builtins_are_registered() {
        for id in ["trim", "lowercase", "uppercase", "to_string"] {
            assert!(adaptor(id).is_some(), "missing adaptor {}", id);
        }
        for id in ["not_empty", "node_name", "env_key", "non_negative"] {
            assert!(validator(id).is_some(), "missing validator {}", id);
        }
        assert!(adaptor("does_not_exist").is_none());
    }

    #[test]
    fn test_string_adaptors() {
        assert_eq!(trim(&s("  abc ")).unwrap(), s("abc"));
        assert_eq!(lowercase(&s("ABC")).unwrap(), s("abc"));
        assert_eq!(uppercase(&s("abc")).unwrap(), s("ABC"));
        assert!(trim(&YamlValue::Bool(true)).is_err());
    }

    #[test]
    fn test_to_string_adaptor() {
        let number: YamlValue = serde_yaml::from_str("42").unwrap();
        assert_eq!(to_string(&number).unwrap(), s("42"));
        assert_eq!(to_string(&YamlValue::Bool(false)).unwrap(), s("false"));
        assert!(to_string(&YamlValue::Sequence(vec![])).is_err());
    }

    #[test]
    fn test_node_name_validator() {
        assert!(node_name(&s("step1")).is_ok());
        assert!(node_name(&s("")).is_err());
        assert!(node_name(&s("a/b")).is_err());
        assert!(node_name(&s("step ")).is_err());
    }

    #[test]
    fn test_env_key_validator() {
        let envs: YamlValue = serde_yaml::from_str("FLOW_WORKSPACE: x\n_under: y").unwrap();
        assert!(env_key(&envs).is_ok());

        let envs: YamlValue = serde_yaml::from_str("1BAD: x").unwrap();
        assert!(env_key(&envs).is_err());
        assert!(env_key(&s("WITH-DASH")).is_err());
    }

    #[test]
    fn test_not_empty_and_non_negative() {
        assert!(not_empty(&s("x")).is_ok());
        assert!(not_empty(&s("   ")).is_err());
        assert!(not_empty(&YamlValue::Null).is_err());

        let positive: YamlValue = serde_yaml::from_str("3").unwrap();
        let negative: YamlValue = serde_yaml::from_str("-1.5").unwrap();
        assert!(non_negative(&positive).is_ok());
        assert!(non_negative(&negative).is_err());
    }

    #[test]
    fn test_register_closure() {
        let replaced = register_adaptor("registry_test_double", |raw: &YamlValue| {
            raw.as_i64()
                .map(|n| YamlValue::from(n * 2))
                .ok_or_else(|| "expected an integer".to_string())
        });
        assert!(!replaced);

        let double = adaptor("registry_test_double").unwrap();
        assert_eq!(double.convert(&YamlValue::from(21)).unwrap(), YamlValue::from(42));
        assert!(adaptor_ids().contains(&"registry_test_double".to_string()));
    }
}
