use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Malformed JSON at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unresolved constant or enumeration: {0}")]
    UnresolvedReference(String),

    #[error("No registered class of type {0}")]
    ClassNotFound(String),

    #[error("Function {0} not found")]
    FunctionNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{type_name}: {message}")]
    Factory { type_name: String, message: String },
}

impl ConvertError {
    /// Shorthand for factories and accessors reporting a construction failure.
    pub fn factory(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Factory {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        ConvertError::Parse {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
    }
}
