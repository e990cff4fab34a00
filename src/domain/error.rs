use std::error::Error as StdError;

use thiserror::Error;

/// Common error types for the flow engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// File system related errors
    #[error("{0}")]
    FileSystem(String),

    /// Bad option name, type or value
    #[error("{0}")]
    Configuration(String),

    /// Option name collides with a serialization keyword
    #[error("{0}")]
    ReservedName(String),

    /// Variable or storage name outside the allowed charset
    #[error("{0}")]
    InvalidName(String),

    /// Class key missing from the registry
    #[error("{0}")]
    UnregisteredType(String),

    /// Director precondition failures
    #[error("{0}")]
    Structural(String),

    /// Actor execution errors
    #[error("{0}")]
    Execution(String),

    /// Boolean condition evaluation errors
    #[error("{0}")]
    Evaluation(String),

    /// Serialization/deserialization errors
    #[error("{0}")]
    Serialization(String),

    /// Template rendering errors
    #[error("{0}")]
    Template(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String)
}

pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    pub fn reserved_name(name: &str) -> Self {
        FlowError::ReservedName(format!("Option name is reserved: {}", name))
    }

    pub fn invalid_variable_name(name: &str) -> Self {
        FlowError::InvalidName(format!("Not a valid variable name: {}", name))
    }

    pub fn invalid_storage_name(name: &str) -> Self {
        FlowError::InvalidName(format!("Not a valid storage name: {}", name))
    }

    pub fn unregistered_type(key: &str) -> Self {
        FlowError::UnregisteredType(format!("Unregistered type: {}", key))
    }

    pub fn invalid_option_type(name: &str, expected: impl std::fmt::Display, received: impl std::fmt::Display) -> Self {
        FlowError::Configuration(format!(
            "Invalid config type for {}: expected={}, received={}",
            name, expected, received
        ))
    }

    /// Whether the error is a wiring problem detected before anything ran
    pub fn is_structural(&self) -> bool {
        matches!(self, FlowError::Structural(_))
    }
}

/// Convert from anyhow::Error
impl From<anyhow::Error> for FlowError {
    fn from(err: anyhow::Error) -> Self {
        FlowError::Generic(format!("{:#}", err))
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for FlowError {
    fn from(err: std::io::Error) -> Self {
        FlowError::FileSystem(err.to_string())
    }
}

/// Convert from serde_yaml::Error
impl From<serde_yaml::Error> for FlowError {
    fn from(err: serde_yaml::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}

/// Convert from serde_json::Error
impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}

/// Convert from tera::Error, keeping the nested causes tera hides behind its
/// top-level message
impl From<tera::Error> for FlowError {
    fn from(err: tera::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        FlowError::Template(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_the_offending_name() {
        assert_eq!(FlowError::invalid_storage_name("a.b").to_string(), "Not a valid storage name: a.b");
        assert_eq!(FlowError::unregistered_type("sources.Nope").to_string(), "Unregistered type: sources.Nope");
        assert!(FlowError::Structural("x".to_string()).is_structural());
        assert!(!FlowError::Execution("x".to_string()).is_structural());
    }

    #[test]
    fn test_template_error_keeps_cause() {
        let err: FlowError = tera::Tera::one_off("{% if %}", &tera::Context::new(), false).unwrap_err().into();
        match err {
            FlowError::Template(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected template error, got {:?}", other)
        }
    }
}
