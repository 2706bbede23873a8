//! Solver configuration.

use std::collections::BTreeMap;

use cf_core::Real;
use cf_props::Stream;

/// Knobs for the outer convergence loop.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Convergence tolerance on the per-field relative change of every tear
    /// stream. A tear is settled when its worst field changes by less than
    /// this on two consecutive passes.
    pub tolerance: Real,

    /// Hard bound on outer passes; exhausting it reports divergence.
    pub max_passes: usize,

    /// Apply Wegstein acceleration to tear updates. Off means plain
    /// successive substitution.
    pub acceleration: bool,

    /// Declare divergence early after this many consecutive passes in which
    /// the worst tear-stream change grew instead of shrinking.
    pub divergence_window: usize,

    /// Streams to tear unconditionally, by name, in addition to whatever the
    /// sequencer selects for cycles these leave unbroken.
    pub forced_tears: Vec<String>,

    /// Initial guesses for tear streams, by name. Tears without an entry are
    /// seeded with a zero-flow stream at feed conditions.
    pub tear_guesses: BTreeMap<String, Stream>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_passes: 50,
            acceleration: true,
            divergence_window: 5,
            forced_tears: Vec::new(),
            tear_guesses: BTreeMap::new(),
        }
    }
}
