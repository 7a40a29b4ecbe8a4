use thiserror::Error;

#[derive(Error, Debug)]
pub enum VarscopeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid event at line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },

    #[error("Invalid config value {key}={value:?}")]
    InvalidConfig { key: String, value: String },
}

impl From<serde_json::Error> for VarscopeError {
    fn from(e: serde_json::Error) -> Self {
        VarscopeError::Serialize(e.to_string())
    }
}
