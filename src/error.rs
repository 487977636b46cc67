use thiserror::Error;

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for LogError {
    fn from(err: reqwest::Error) -> Self {
        Self::TransportError(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Hash engine unavailable: {0}")]
    HashEngineUnavailable(String),

    #[error("Corrupted tree state: {0}")]
    CorruptedState(String),

    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, LogError>;

impl LogError {
    pub fn leaf_out_of_range(index: u64, tree_size: u64) -> Self {
        Self::OutOfRange(format!(
            "leaf index {} is not below tree size {}",
            index, tree_size
        ))
    }

    pub fn size_out_of_range(requested: u64, current: u64) -> Self {
        Self::OutOfRange(format!(
            "tree size {} exceeds current size {}",
            requested, current
        ))
    }

    pub fn reversed_range(old_size: u64, new_size: u64) -> Self {
        Self::InvalidRange(format!(
            "old size {} is greater than new size {}",
            old_size, new_size
        ))
    }

    /// Short machine-readable name, used by the HTTP layer.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OutOfRange(_) => "out_of_range",
            Self::InvalidRange(_) => "invalid_range",
            Self::NotFound(_) => "not_found",
            Self::HashEngineUnavailable(_) => "hash_engine_unavailable",
            Self::CorruptedState(_) => "corrupted_state",
            Self::InvalidDigest(_) => "invalid_digest",
            Self::ConfigError(_) => "config_error",
            Self::IoError(_) => "io_error",
            Self::TransportError(_) => "transport_error",
            Self::SerializationError(_) => "serialization_error",
        }
    }

    /// The message without the kind prefix
    pub fn detail(&self) -> &str {
        match self {
            Self::OutOfRange(msg)
            | Self::InvalidRange(msg)
            | Self::NotFound(msg)
            | Self::HashEngineUnavailable(msg)
            | Self::CorruptedState(msg)
            | Self::InvalidDigest(msg)
            | Self::ConfigError(msg)
            | Self::IoError(msg)
            | Self::TransportError(msg)
            | Self::SerializationError(msg) => msg,
        }
    }

    /// Request-level failures that leave the log untouched and are the caller's fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfRange(_) | Self::InvalidRange(_) | Self::InvalidDigest(_)
        )
    }
}
