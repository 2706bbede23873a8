//! Core trait for unit-operation models.

use std::collections::BTreeMap;

use crate::error::UnitResult;
use cf_props::Stream;

/// Streams keyed by port name.
pub type PortMap = BTreeMap<String, Stream>;

/// Trait for unit-operation models.
///
/// A unit is a pure function of its declared inlets and its configuration:
/// no hidden dependence on solver iteration state. Implementations must be
/// thread-safe (Send + Sync) so independent solves can share models.
pub trait UnitModel: Send + Sync {
    /// Unit name for diagnostics and identification.
    fn name(&self) -> &str;

    /// Declared inlet port names, in order.
    fn inlet_ports(&self) -> &[String];

    /// Declared outlet port names, in order.
    fn outlet_ports(&self) -> &[String];

    /// Compute outlet streams from inlet streams.
    ///
    /// Must return one stream per declared outlet port. Total flow is
    /// conserved; reaction stoichiometry adjustments are the explicit
    /// exception.
    fn solve(&self, inlets: &PortMap) -> UnitResult<PortMap>;
}
