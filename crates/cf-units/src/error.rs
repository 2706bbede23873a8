//! Error types for unit-operation solves.

use cf_props::PropertyError;
use thiserror::Error;

/// Errors that can occur while solving a unit operation.
///
/// Property-package failures never leak raw: units wrap them into
/// `Convergence` at their boundary so the orchestrator sees one failure kind
/// per unit.
#[derive(Error, Debug, Clone)]
pub enum UnitError {
    #[error("Unit '{unit}' has no stream on inlet port '{port}'")]
    MissingInlet { unit: String, port: String },

    /// The unit's internal balance iteration did not converge, or a
    /// collaborator failed while it was iterating.
    #[error("Unit '{unit}' failed to converge: {what}")]
    Convergence { unit: String, what: String },

    #[error("Unit '{unit}' produced a non-physical result: {what}")]
    NonPhysical { unit: String, what: &'static str },

    #[error("Invalid unit configuration: {what}")]
    InvalidConfig { what: &'static str },
}

pub type UnitResult<T> = Result<T, UnitError>;

impl UnitError {
    /// Wrap a property/kinetics failure at the unit boundary.
    pub fn from_property(unit: &str, err: PropertyError) -> Self {
        UnitError::Convergence {
            unit: unit.to_string(),
            what: format!("property evaluation failed: {err}"),
        }
    }
}
