//! Convergence trace records.

use cf_core::Real;

/// Worst-field change of one tear stream on one outer pass.
///
/// One entry per tear per pass; the full trace reconstructs the convergence
/// history without the caller hooking a tracing subscriber.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry {
    /// Outer pass number, starting at 1.
    pub pass: usize,
    /// Tear stream name.
    pub stream: String,
    /// Field with the largest relative change this pass.
    pub field: String,
    /// That field's relative change.
    pub rel_change: Real,
}
