//! Error types for solver setup and orchestration.

use cf_graph::GraphError;
use thiserror::Error;

/// Errors raised while preparing or sequencing a solve.
///
/// Runtime unit failures do not surface here: a unit error during iteration
/// terminates the solve with a `Failed` report carrying the culprit, so the
/// caller still gets the last stable stream snapshot.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Solver setup error: {what}")]
    Setup { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    pub(crate) fn setup(what: impl Into<String>) -> Self {
        SolverError::Setup { what: what.into() }
    }
}
