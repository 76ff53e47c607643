//! Registry error types
//!
//! Error types for channel registry operations.

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Channel name is empty
    EmptyChannel,
    /// Message payload is empty
    EmptyPayload,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::EmptyChannel => write!(f, "channel name must not be empty"),
            RegistryError::EmptyPayload => write!(f, "message must not be empty"),
        }
    }
}

impl std::error::Error for RegistryError {}
