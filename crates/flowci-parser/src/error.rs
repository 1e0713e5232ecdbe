//! Parser error types

use flowci_core::CoreError;
use thiserror::Error;

/// Broad category of a `ParseError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed document, shape mismatch, missing field, unconvertible value
    Mapping,
    /// A declared validator rejected an adapted value
    Validation,
    /// Reading or decoding a pipeline file failed
    Io,
}

/// Parser error
#[derive(Error, Debug)]
pub enum ParseError {
    /// YAML syntax error reported by the codec
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Top-level or nested document has the wrong shape for the target type
    #[error("Expected a {expected} for '{type_name}', got {actual}")]
    ShapeMismatch {
        type_name: String,
        expected: String,
        actual: String,
    },

    /// Required field absent from the document
    #[error("Missing required field '{field}' for '{type_name}'")]
    MissingField { type_name: String, field: String },

    /// Raw value cannot be coerced to the declared field kind
    #[error("Type mismatch for field '{field}' of '{type_name}': expected {expected}, got {actual}")]
    TypeMismatch {
        type_name: String,
        field: String,
        expected: String,
        actual: String,
    },

    /// Declared adaptor refused the raw value
    #[error("Adaptor '{adaptor}' failed for field '{field}' of '{type_name}': {message}")]
    AdaptorFailed {
        type_name: String,
        field: String,
        adaptor: String,
        message: String,
    },

    #[error("Unknown adaptor '{adaptor}' declared on field '{field}' of '{type_name}'")]
    UnknownAdaptor {
        type_name: String,
        field: String,
        adaptor: String,
    },

    #[error("Unknown validator '{validator}' declared on field '{field}' of '{type_name}'")]
    UnknownValidator {
        type_name: String,
        field: String,
        validator: String,
    },

    /// Two contract entries share a field name or a source key
    #[error("Field contract for '{type_name}' declares '{key}' more than once")]
    DuplicateField { type_name: String, key: String },

    /// Document keys not claimed by any field (strict mode only)
    #[error("Unknown fields for '{type_name}': {message}")]
    UnknownFields { type_name: String, message: String },

    /// Normalized document could not be bound to (or read from) the target type
    #[error("Failed to bind '{type_name}': {message}")]
    Binding { type_name: String, message: String },

    /// Declared validator rejected the adapted value
    #[error("Validation failed for field '{field}' of '{type_name}': {message}")]
    Validation {
        type_name: String,
        field: String,
        message: String,
    },

    /// Failure inside one element of a sequence document
    #[error("Element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<ParseError>,
    },

    /// Failure while building one step of a pipeline document
    #[error("Step {index}: {source}")]
    InStep {
        index: usize,
        #[source]
        source: Box<ParseError>,
    },

    /// Structural rule of the node tree violated
    #[error("Invalid node tree: {0}")]
    Build(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File content is not valid in the requested charset
    #[error("Cannot decode '{path}' as {charset}: {message}")]
    Decode {
        path: String,
        charset: String,
        message: String,
    },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Validation { .. } => ErrorKind::Validation,
            ParseError::Io(_) | ParseError::Decode { .. } => ErrorKind::Io,
            ParseError::Element { source, .. } | ParseError::InStep { source, .. } => source.kind(),
            _ => ErrorKind::Mapping,
        }
    }

    pub fn is_mapping(&self) -> bool {
        self.kind() == ErrorKind::Mapping
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Innermost error, skipping element/step context
    pub fn root_cause(&self) -> &ParseError {
        match self {
            ParseError::Element { source, .. } | ParseError::InStep { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    pub(crate) fn in_element(self, index: usize) -> Self {
        ParseError::Element {
            index,
            source: Box::new(self),
        }
    }

    pub(crate) fn in_step(self, index: usize) -> Self {
        ParseError::InStep {
            index,
            source: Box::new(self),
        }
    }
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
