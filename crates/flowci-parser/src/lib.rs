//! flowci Parser - field-contract YAML mapping and node tree building
//!
//! This crate converts YAML documents into typed values under declared field
//! contracts (rename, required, ignore, adaptor, validator) and builds pipeline
//! node trees from pipeline documents.

mod coercion;
pub mod config;
pub mod contract;
pub mod error;
pub mod node_parser;
pub mod registry;
pub mod yml_parser;

// Re-export main parser types
pub use config::{Charset, MappingOptions, ParserConfig, UnknownKeys, DEFAULT_CHARSET};
pub use contract::{
    cached_type_count, descriptor_for, ContractRef, FieldContract, FieldDescriptor, FieldKind,
    TypeDescriptor, YmlContract,
};
pub use error::{ErrorKind, ParseError, Result};
pub use node_parser::{FlowDefinition, NodeParser, StepDefinition};
pub use registry::{register_adaptor, register_validator, Adaptor, Validator};
pub use yml_parser::YmlParser;
