//! Field contracts and the per-type descriptor cache
//!
//! A type opts into YAML mapping by implementing `YmlContract`, declaring one
//! `FieldContract` per field in declaration order. The first time a type is
//! mapped, its contract is resolved into a `TypeDescriptor` (adaptor and
//! validator identifiers looked up in the registry, duplicates rejected) and
//! cached for the rest of the process.

use crate::error::{ParseError, Result};
use crate::registry::{self, Adaptor, Validator};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value as YamlValue};
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A type whose fields bind to YAML keys under declared contracts.
///
/// Field `name`s must match the serde names of the type's fields. Fields the
/// document leaves out (optional or ignored ones) keep their `Default` value.
///
/// # Example
/// ```
/// use flowci_parser::{FieldContract, FieldKind, YmlContract, YmlParser};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Job {
///     name: String,
///     retries: i64,
/// }
///
/// impl YmlContract for Job {
///     fn contract() -> Vec<FieldContract> {
///         vec![
///             FieldContract::new("name", FieldKind::String),
///             FieldContract::new("retries", FieldKind::Integer).optional(),
///         ]
///     }
/// }
///
/// let job: Job = YmlParser::from_yml("name: build\nretries: '3'").unwrap();
/// assert_eq!(job.retries, 3);
/// ```
pub trait YmlContract: Serialize + DeserializeOwned + Default + 'static {
    /// Declared field contracts, in declaration order
    fn contract() -> Vec<FieldContract>;

    /// Name used in error messages: the type's own name, without module path
    /// or generic arguments
    fn type_name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Semantic type of a field, driving built-in coercion and nesting
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Bool,
    /// Mapping with string keys and values of the inner kind
    Map(Box<FieldKind>),
    /// Sequence of the inner kind
    List(Box<FieldKind>),
    /// Nested type with its own field contracts
    Object(ContractRef),
    /// Any value, passed through untouched
    Raw,
}

impl FieldKind {
    pub fn map_of(inner: FieldKind) -> Self {
        FieldKind::Map(Box::new(inner))
    }

    pub fn list_of(inner: FieldKind) -> Self {
        FieldKind::List(Box::new(inner))
    }

    pub fn object<T: YmlContract>() -> Self {
        FieldKind::Object(ContractRef::of::<T>())
    }

    /// True when binding this kind recurses into another contract
    pub fn has_contract(&self) -> bool {
        match self {
            FieldKind::Object(_) => true,
            FieldKind::Map(inner) | FieldKind::List(inner) => inner.has_contract(),
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FieldKind::String => "string".to_string(),
            FieldKind::Integer => "integer".to_string(),
            FieldKind::Float => "float".to_string(),
            FieldKind::Bool => "boolean".to_string(),
            FieldKind::Map(inner) => format!("mapping of {}", inner.describe()),
            FieldKind::List(inner) => format!("list of {}", inner.describe()),
            FieldKind::Object(contract) => contract.type_name().to_string(),
            FieldKind::Raw => "any value".to_string(),
        }
    }
}

/// Lazy reference to another contract type.
///
/// Nested descriptors are resolved at bind time through the cache, which keeps
/// resolution of self-referencing types finite.
#[derive(Clone, Copy)]
pub struct ContractRef {
    type_name: fn() -> &'static str,
    resolve: fn() -> Result<Arc<TypeDescriptor>>,
    defaults: fn() -> Result<Mapping>,
}

impl ContractRef {
    pub fn of<T: YmlContract>() -> Self {
        Self {
            type_name: T::type_name,
            resolve: descriptor_for::<T>,
            defaults: default_mapping::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    pub fn descriptor(&self) -> Result<Arc<TypeDescriptor>> {
        (self.resolve)()
    }

    /// Serialized `Default` value of the referenced type
    pub fn default_mapping(&self) -> Result<Mapping> {
        (self.defaults)()
    }
}

/// `T::default()` serialized to a mapping keyed by field name
pub fn default_mapping<T: YmlContract>() -> Result<Mapping> {
    match serde_yaml::to_value(T::default())? {
        YamlValue::Mapping(defaults) => Ok(defaults),
        _ => Ok(Mapping::new()),
    }
}

impl fmt::Debug for ContractRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractRef({})", self.type_name())
    }
}

/// Declared contract for one field
#[derive(Debug, Clone)]
pub struct FieldContract {
    name: &'static str,
    kind: FieldKind,
    rename: Option<&'static str>,
    required: bool,
    ignore: bool,
    adaptor: Option<&'static str>,
    validator: Option<&'static str>,
}

impl FieldContract {
    /// New contract for `name`; fields are required unless marked otherwise
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            rename: None,
            required: true,
            ignore: false,
            adaptor: None,
            validator: None,
        }
    }

    /// Read and write the field under a different document key
    pub fn rename(mut self, key: &'static str) -> Self {
        self.rename = Some(key);
        self
    }

    pub fn optional(self) -> Self {
        self.required(false)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Never read from nor written to documents
    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn adaptor(mut self, id: &'static str) -> Self {
        self.adaptor = Some(id);
        self
    }

    pub fn validator(mut self, id: &'static str) -> Self {
        self.validator = Some(id);
        self
    }
}

/// Adaptor resolved from the registry
#[derive(Clone)]
pub struct BoundAdaptor {
    pub id: String,
    pub adaptor: Arc<dyn Adaptor>,
}

/// Validator resolved from the registry
#[derive(Clone)]
pub struct BoundValidator {
    pub id: String,
    pub validator: Arc<dyn Validator>,
}

impl fmt::Debug for BoundAdaptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundAdaptor({})", self.id)
    }
}

impl fmt::Debug for BoundValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundValidator({})", self.id)
    }
}

/// Resolved contract for one field
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Serde name of the field on the target type
    pub name: String,
    /// Document key the field binds to
    pub source_key: String,
    pub required: bool,
    pub ignore: bool,
    pub kind: FieldKind,
    pub adaptor: Option<BoundAdaptor>,
    pub validator: Option<BoundValidator>,
}

/// Ordered field descriptors of one contract type
#[derive(Debug)]
pub struct TypeDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Resolve declared contracts against the registry
    pub fn resolve(type_name: &'static str, contracts: Vec<FieldContract>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        let mut fields = Vec::with_capacity(contracts.len());

        for contract in contracts {
            let source_key = contract.rename.unwrap_or(contract.name);
            if !names.insert(contract.name) {
                return Err(ParseError::DuplicateField {
                    type_name: type_name.to_string(),
                    key: contract.name.to_string(),
                });
            }
            if !keys.insert(source_key) {
                return Err(ParseError::DuplicateField {
                    type_name: type_name.to_string(),
                    key: source_key.to_string(),
                });
            }

            let adaptor = match contract.adaptor {
                Some(id) => Some(BoundAdaptor {
                    id: id.to_string(),
                    adaptor: registry::adaptor(id).ok_or_else(|| ParseError::UnknownAdaptor {
                        type_name: type_name.to_string(),
                        field: contract.name.to_string(),
                        adaptor: id.to_string(),
                    })?,
                }),
                None => None,
            };

            let validator = match contract.validator {
                Some(id) => Some(BoundValidator {
                    id: id.to_string(),
                    validator: registry::validator(id).ok_or_else(|| {
                        ParseError::UnknownValidator {
                            type_name: type_name.to_string(),
                            field: contract.name.to_string(),
                            validator: id.to_string(),
                        }
                    })?,
                }),
                None => None,
            };

            fields.push(FieldDescriptor {
                name: contract.name.to_string(),
                source_key: source_key.to_string(),
                required: contract.required,
                ignore: contract.ignore,
                kind: contract.kind,
                adaptor,
                validator,
            });
        }

        Ok(Self { type_name, fields })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Field descriptors in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// True when some field, ignored or not, binds to `key`
    pub fn claims_key(&self, key: &str) -> bool {
        self.fields.iter().any(|field| field.source_key == key)
    }

    /// Document keys in declaration order
    pub fn source_keys(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.source_key.as_str()).collect()
    }
}

static DESCRIPTORS: OnceLock<DashMap<TypeId, Arc<TypeDescriptor>>> = OnceLock::new();

fn descriptors() -> &'static DashMap<TypeId, Arc<TypeDescriptor>> {
    DESCRIPTORS.get_or_init(DashMap::new)
}

/// Resolved descriptor table for `T`, built on first use and cached.
///
/// Concurrent first uses may each build a table; the first one inserted wins
/// and every caller receives that same table.
pub fn descriptor_for<T: YmlContract>() -> Result<Arc<TypeDescriptor>> {
    let type_id = TypeId::of::<T>();
    if let Some(cached) = descriptors().get(&type_id) {
        return Ok(Arc::clone(cached.value()));
    }

    let resolved = Arc::new(TypeDescriptor::resolve(T::type_name(), T::contract())?);
    log::debug!(
        "resolved field contract for '{}' ({} fields)",
        resolved.type_name(),
        resolved.fields().len()
    );

    let entry = descriptors().entry(type_id).or_insert(resolved);
    Ok(Arc::clone(entry.value()))
}

/// Number of contract types resolved so far in this process
pub fn cached_type_count() -> usize {
    descriptors().len()
}
