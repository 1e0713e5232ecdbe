//! Declarative YAML mapping engine
//!
//! Binds YAML documents to `YmlContract` types field by field and writes them
//! back in descriptor order.

use crate::coercion::{coerce, scalar_text};
use crate::config::{MappingOptions, UnknownKeys};
use crate::contract::{
    default_mapping, descriptor_for, FieldDescriptor, FieldKind, TypeDescriptor, YmlContract,
};
use crate::error::{ParseError, Result};
use crate::registry::type_name;
use serde_yaml::{Mapping, Value as YamlValue};

/// YAML mapping engine
pub struct YmlParser;

impl YmlParser {
    /// Parse YAML text into a generic value
    pub fn parse(yaml_str: &str) -> Result<YamlValue> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    /// Map a YAML mapping document onto `T`
    pub fn from_yml<T: YmlContract>(yaml_str: &str) -> Result<T> {
        Self::from_yml_with(yaml_str, &MappingOptions::default())
    }

    pub fn from_yml_with<T: YmlContract>(yaml_str: &str, options: &MappingOptions) -> Result<T> {
        let document = Self::parse(yaml_str)?;
        Self::from_value_with(&document, options)
    }

    /// Map a YAML sequence document onto a list of `T`.
    ///
    /// Elements are bound in document order; the first failing element aborts
    /// the whole call.
    pub fn from_yml_seq<T: YmlContract>(yaml_str: &str) -> Result<Vec<T>> {
        Self::from_yml_seq_with(yaml_str, &MappingOptions::default())
    }

    pub fn from_yml_seq_with<T: YmlContract>(
        yaml_str: &str,
        options: &MappingOptions,
    ) -> Result<Vec<T>> {
        let document = Self::parse(yaml_str)?;
        let items = document.as_sequence().ok_or_else(|| ParseError::ShapeMismatch {
            type_name: format!("[{}]", T::type_name()),
            expected: "sequence".to_string(),
            actual: type_name(&document).to_string(),
        })?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                Self::from_value_with::<T>(item, options).map_err(|e| e.in_element(index))
            })
            .collect()
    }

    /// Map an already parsed (sub-)document onto `T`
    pub fn from_value<T: YmlContract>(value: &YamlValue) -> Result<T> {
        Self::from_value_with(value, &MappingOptions::default())
    }

    pub fn from_value_with<T: YmlContract>(value: &YamlValue, options: &MappingOptions) -> Result<T> {
        let descriptor = descriptor_for::<T>()?;
        let mapping = expect_mapping(value, descriptor.type_name())?;
        let bound = bind_mapping(&descriptor, mapping, options)?;
        let merged = merge_defaults(default_mapping::<T>()?, bound);

        serde_yaml::from_value(YamlValue::Mapping(merged)).map_err(|e| ParseError::Binding {
            type_name: descriptor.type_name().to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize `T` to a mapping keyed by source keys, in descriptor order
    pub fn to_value<T: YmlContract>(instance: &T) -> Result<YamlValue> {
        let descriptor = descriptor_for::<T>()?;
        let serialized = serde_yaml::to_value(instance)?;
        let mapping = expect_mapping(&serialized, descriptor.type_name())?;
        Ok(YamlValue::Mapping(emit_mapping(&descriptor, mapping)?))
    }

    pub fn to_yml<T: YmlContract>(instance: &T) -> Result<String> {
        Ok(serde_yaml::to_string(&Self::to_value(instance)?)?)
    }

    pub fn to_yml_seq<T: YmlContract>(instances: &[T]) -> Result<String> {
        let items = instances
            .iter()
            .map(Self::to_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(serde_yaml::to_string(&YamlValue::Sequence(items))?)
    }
}

fn expect_mapping<'a>(value: &'a YamlValue, target: &str) -> Result<&'a Mapping> {
    value.as_mapping().ok_or_else(|| ParseError::ShapeMismatch {
        type_name: target.to_string(),
        expected: "mapping".to_string(),
        actual: type_name(value).to_string(),
    })
}

/// Overlay bound fields on the serialized default of the target type, so that
/// skipped fields keep their `Default` value without `#[serde(default)]`
fn merge_defaults(mut defaults: Mapping, bound: Mapping) -> Mapping {
    for (key, value) in bound {
        defaults.insert(key, value);
    }
    defaults
}

/// Look up a document key; non-string scalar keys match by their text form
fn lookup<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a YamlValue> {
    mapping.get(key).or_else(|| {
        mapping
            .iter()
            .find(|(k, _)| !k.is_string() && scalar_text(k).as_deref() == Some(key))
            .map(|(_, v)| v)
    })
}

/// Bind every field of `descriptor` from `mapping`, keyed by field name
fn bind_mapping(
    descriptor: &TypeDescriptor,
    mapping: &Mapping,
    options: &MappingOptions,
) -> Result<Mapping> {
    check_unknown_keys(descriptor, mapping, options)?;

    let mut bound = Mapping::new();
    for field in descriptor.fields() {
        if field.ignore {
            continue;
        }

        let raw = match lookup(mapping, &field.source_key) {
            Some(value) if !value.is_null() => value,
            _ if field.required => {
                return Err(ParseError::MissingField {
                    type_name: descriptor.type_name().to_string(),
                    field: field.source_key.clone(),
                })
            }
            _ => continue,
        };

        let value = bind_field(descriptor, field, raw, options)?;
        bound.insert(YamlValue::String(field.name.clone()), value);
    }

    Ok(bound)
}

fn bind_field(
    descriptor: &TypeDescriptor,
    field: &FieldDescriptor,
    raw: &YamlValue,
    options: &MappingOptions,
) -> Result<YamlValue> {
    let adapted = match &field.adaptor {
        Some(bound) => bound
            .adaptor
            .convert(raw)
            .map_err(|message| ParseError::AdaptorFailed {
                type_name: descriptor.type_name().to_string(),
                field: field.source_key.clone(),
                adaptor: bound.id.clone(),
                message,
            })?,
        None => coerce(raw.clone(), &field.kind).map_err(|actual| ParseError::TypeMismatch {
            type_name: descriptor.type_name().to_string(),
            field: field.source_key.clone(),
            expected: field.kind.describe(),
            actual,
        })?,
    };

    if let Some(bound) = &field.validator {
        bound
            .validator
            .validate(&adapted)
            .map_err(|message| ParseError::Validation {
                type_name: descriptor.type_name().to_string(),
                field: field.source_key.clone(),
                message,
            })?;
    }

    if field.kind.has_contract() {
        bind_nested(&field.kind, adapted, options)
    } else {
        Ok(adapted)
    }
}

/// Recurse into values whose kind carries its own field contracts
fn bind_nested(kind: &FieldKind, value: YamlValue, options: &MappingOptions) -> Result<YamlValue> {
    match kind {
        FieldKind::Object(contract) => {
            let nested = contract.descriptor()?;
            let mapping = expect_mapping(&value, nested.type_name())?;
            let bound = bind_mapping(&nested, mapping, options)?;
            Ok(YamlValue::Mapping(merge_defaults(contract.default_mapping()?, bound)))
        }
        FieldKind::List(inner) if inner.has_contract() => match value {
            YamlValue::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    bind_nested(inner, item, options).map_err(|e| e.in_element(index))
                })
                .collect::<Result<Vec<_>>>()
                .map(YamlValue::Sequence),
            other => Err(ParseError::ShapeMismatch {
                type_name: kind.describe(),
                expected: "sequence".to_string(),
                actual: type_name(&other).to_string(),
            }),
        },
        FieldKind::Map(inner) if inner.has_contract() => match value {
            YamlValue::Mapping(entries) => {
                let mut bound = Mapping::with_capacity(entries.len());
                for (key, item) in entries {
                    bound.insert(key, bind_nested(inner, item, options)?);
                }
                Ok(YamlValue::Mapping(bound))
            }
            other => Err(ParseError::ShapeMismatch {
                type_name: kind.describe(),
                expected: "mapping".to_string(),
                actual: type_name(&other).to_string(),
            }),
        },
        _ => Ok(value),
    }
}

/// Re-key a serialized instance by source keys, skipping ignored fields
fn emit_mapping(descriptor: &TypeDescriptor, serialized: &Mapping) -> Result<Mapping> {
    let mut emitted = Mapping::new();
    for field in descriptor.fields() {
        if field.ignore {
            continue;
        }

        let value = match serialized.get(field.name.as_str()) {
            Some(YamlValue::Null) | None => continue,
            Some(value) => value.clone(),
        };

        emitted.insert(
            YamlValue::String(field.source_key.clone()),
            emit_nested(&field.kind, value)?,
        );
    }
    Ok(emitted)
}

fn emit_nested(kind: &FieldKind, value: YamlValue) -> Result<YamlValue> {
    match (kind, value) {
        (FieldKind::Object(contract), YamlValue::Mapping(mapping)) => {
            let nested = contract.descriptor()?;
            Ok(YamlValue::Mapping(emit_mapping(&nested, &mapping)?))
        }
        (FieldKind::List(inner), YamlValue::Sequence(items)) if inner.has_contract() => items
            .into_iter()
            .map(|item| emit_nested(inner, item))
            .collect::<Result<Vec<_>>>()
            .map(YamlValue::Sequence),
        (FieldKind::Map(inner), YamlValue::Mapping(entries)) if inner.has_contract() => {
            let mut emitted = Mapping::with_capacity(entries.len());
            for (key, item) in entries {
                emitted.insert(key, emit_nested(inner, item)?);
            }
            Ok(YamlValue::Mapping(emitted))
        }
        (_, value) => Ok(value),
    }
}

fn check_unknown_keys(
    descriptor: &TypeDescriptor,
    mapping: &Mapping,
    options: &MappingOptions,
) -> Result<()> {
    if options.unknown_keys == UnknownKeys::Allow {
        return Ok(());
    }

    let known = descriptor.source_keys();
    let unknown: Vec<String> = mapping
        .iter()
        .filter_map(|(key, _)| scalar_text(key))
        .filter(|key| !descriptor.claims_key(key))
        .map(|key| match find_similar_key(&key, &known) {
            Some(similar) => format!(
                "Unknown field '{}' in {}. Did you mean '{}'?",
                key,
                descriptor.type_name(),
                similar
            ),
            None => format!("Unknown field '{}' in {}", key, descriptor.type_name()),
        })
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }

    match options.unknown_keys {
        UnknownKeys::Deny => Err(ParseError::UnknownFields {
            type_name: descriptor.type_name().to_string(),
            message: unknown.join("; "),
        }),
        _ => {
            for warning in &unknown {
                log::warn!("{}", warning);
            }
            Ok(())
        }
    }
}

/// Closest known key within an edit distance of 2
fn find_similar_key<'a>(key: &str, known: &[&'a str]) -> Option<&'a str> {
    known
        .iter()
        .map(|candidate| (levenshtein_distance(key, candidate), *candidate))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(row[j + 1] + 1);
        }
    }

    row[b.len()]
}
