//! Graph-specific error types.

use thiserror::Error;

/// Flowsheet construction, validation, and sequencing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unit '{name}' already exists in the flowsheet")]
    DuplicateUnit { name: String },

    #[error("Unit '{unit}' declares port '{port}' more than once")]
    DuplicatePort { unit: String, port: String },

    #[error("Unit '{name}' not found in flowsheet")]
    UnknownUnit { name: String },

    #[error("Stream '{name}' not found in flowsheet")]
    UnknownStream { name: String },

    #[error("Unit '{unit}' has no port named '{port}'")]
    UnknownPort { unit: String, port: String },

    #[error("Port '{port}' of unit '{unit}' is already connected")]
    PortAlreadyConnected { unit: String, port: String },

    #[error("Stream '{stream}' already has a producer")]
    MultipleProducers { stream: String },

    /// Topology incomplete: a declared port has no stream attached.
    #[error("Missing stream: port '{port}' of unit '{unit}' is not connected")]
    MissingStream { unit: String, port: String },

    /// Unresolvable cycle structure.
    #[error("Topology error: {what}")]
    Topology { what: String },
}

pub type GraphResult<T> = Result<T, GraphError>;
