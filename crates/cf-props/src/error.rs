//! Error types for property and kinetics evaluation.

use thiserror::Error;

/// Errors surfaced by property packages and reaction models.
///
/// These never reach the convergence engine directly: unit operations wrap
/// them at their own boundary.
#[derive(Error, Debug, Clone)]
pub enum PropertyError {
    #[error("Unknown component: {name}")]
    UnknownComponent { name: String },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Evaluation failed: {message}")]
    Evaluation { message: String },
}

pub type PropertyResult<T> = Result<T, PropertyError>;
