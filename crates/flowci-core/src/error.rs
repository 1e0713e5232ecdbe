//! Error types for flowci Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid node name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Duplicate node name '{name}' under '{parent}'")]
    DuplicateName { parent: String, name: String },

    #[error("Unknown node id: {0}")]
    UnknownNode(usize),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let error = CoreError::InvalidName {
            name: "a/b".to_string(),
            reason: "contains '/'".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid node name 'a/b': contains '/'");

        let error = CoreError::DuplicateName {
            parent: "/flow1".to_string(),
            name: "step1".to_string(),
        };
        assert!(error.to_string().contains("/flow1"));
        assert!(error.to_string().contains("step1"));

        assert_eq!(CoreError::UnknownNode(7).to_string(), "Unknown node id: 7");
    }
}
