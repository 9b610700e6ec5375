//! Error types for profile resolution and container mutation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that can occur while resolving or mutating profile containers.
///
/// Missing tree data (an unknown variant, an unresolved material) is not an
/// error: those lookups return `None` and log a warning. The variants here
/// cover caller bugs and hard failures only.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// A machine definition id that the registry has never seen.
    #[error("Unknown machine definition: {0}")]
    UnknownDefinition(String),

    /// A container id that does not exist in the registry.
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// A container with this id is already registered.
    #[error("Duplicate container id: {0}")]
    DuplicateContainer(String),

    /// The container ships with the application and cannot be changed.
    #[error("Container is read-only: {0}")]
    ReadOnly(String),

    /// No quality type can be resolved for the machine at all.
    #[error("No quality type available for machine {machine}")]
    NoQualityAvailable { machine: String },

    /// An operation needs an active machine and there is none.
    #[error("No active machine")]
    NoActiveMachine,

    /// Metadata is missing a required field or carries an invalid value.
    #[error("Invalid {kind} metadata: {message}")]
    InvalidMetadata { kind: &'static str, message: String },

    /// Configuration could not be read or written.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error while reading or writing configuration or profile packs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProfileError {
    /// Create a container-not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::ContainerNotFound(id.into())
    }

    /// Create an unknown-definition error.
    pub fn unknown_definition(id: impl Into<String>) -> Self {
        Self::UnknownDefinition(id.into())
    }

    /// Create an invalid instance metadata error.
    pub fn invalid_instance(message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            kind: "instance",
            message: message.into(),
        }
    }

    /// Create an invalid definition metadata error.
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            kind: "definition",
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
