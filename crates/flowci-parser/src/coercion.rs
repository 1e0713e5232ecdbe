//! Built-in coercion of raw document values to declared field kinds
//!
//! Applied to fields without an adaptor. Scalars are converted, containers
//! are checked for shape and their elements coerced; values of nested
//! contract types are only checked to be mappings here, their fields are
//! bound afterwards by the engine.

use crate::contract::FieldKind;
use crate::registry::type_name;
use serde_yaml::{Mapping, Value as YamlValue};

/// Description of the offending value when coercion fails
pub(crate) type Mismatch = String;

pub(crate) fn coerce(value: YamlValue, kind: &FieldKind) -> Result<YamlValue, Mismatch> {
    match kind {
        FieldKind::Raw => Ok(value),
        FieldKind::String => to_string(value),
        FieldKind::Integer => to_integer(value),
        FieldKind::Float => to_float(value),
        FieldKind::Bool => to_bool(value),
        FieldKind::Object(_) => match value {
            YamlValue::Mapping(_) => Ok(value),
            other => Err(describe(&other)),
        },
        FieldKind::List(inner) => match value {
            YamlValue::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    coerce(item, inner).map_err(|actual| format!("{} at index {}", actual, index))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(YamlValue::Sequence),
            other => Err(describe(&other)),
        },
        FieldKind::Map(inner) => match value {
            YamlValue::Mapping(entries) => {
                let mut coerced = Mapping::with_capacity(entries.len());
                for (key, item) in entries {
                    let key = scalar_text(&key)
                        .ok_or_else(|| format!("{} key", type_name(&key)))?;
                    let item = coerce(item, inner)
                        .map_err(|actual| format!("{} at key '{}'", actual, key))?;
                    if coerced.insert(YamlValue::String(key.clone()), item).is_some() {
                        return Err(format!("duplicate key '{}'", key));
                    }
                }
                Ok(YamlValue::Mapping(coerced))
            }
            other => Err(describe(&other)),
        },
    }
}

/// Text form of a scalar, used for string coercion and key comparison
pub(crate) fn scalar_text(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn describe(value: &YamlValue) -> Mismatch {
    match value {
        YamlValue::String(s) => format!("string '{}'", s),
        YamlValue::Number(n) => format!("{} {}", type_name(value), n),
        YamlValue::Bool(b) => format!("boolean {}", b),
        other => type_name(other).to_string(),
    }
}

fn to_string(value: YamlValue) -> Result<YamlValue, Mismatch> {
    match scalar_text(&value) {
        Some(text) => Ok(YamlValue::String(text)),
        None => Err(describe(&value)),
    }
}

fn to_integer(value: YamlValue) -> Result<YamlValue, Mismatch> {
    match &value {
        YamlValue::Number(n) if n.is_i64() || n.is_u64() => Ok(value),
        YamlValue::String(s) => {
            let token = s.trim();
            if let Ok(n) = token.parse::<i64>() {
                Ok(YamlValue::from(n))
            } else if let Ok(n) = token.parse::<u64>() {
                Ok(YamlValue::from(n))
            } else {
                Err(describe(&value))
            }
        }
        _ => Err(describe(&value)),
    }
}

fn to_float(value: YamlValue) -> Result<YamlValue, Mismatch> {
    match &value {
        YamlValue::Number(n) => match n.as_f64() {
            Some(f) => Ok(YamlValue::from(f)),
            None => Err(describe(&value)),
        },
        YamlValue::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(YamlValue::from(f)),
            _ => Err(describe(&value)),
        },
        _ => Err(describe(&value)),
    }
}

fn to_bool(value: YamlValue) -> Result<YamlValue, Mismatch> {
    match &value {
        YamlValue::Bool(_) => Ok(value),
        YamlValue::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(YamlValue::Bool(true)),
        YamlValue::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(YamlValue::Bool(false)),
        _ => Err(describe(&value)),
    }
}
