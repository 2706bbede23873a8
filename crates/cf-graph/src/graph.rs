//! Core flowsheet graph data structures.

use cf_core::{StreamId, UnitId};

/// A (unit, port-index) endpoint of a stream.
///
/// The port index points into the unit's outlet-port list for producers and
/// its inlet-port list for consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub unit: UnitId,
    pub port: usize,
}

/// A unit-operation node: a name plus its declared, fixed port sets.
///
/// The node carries no balance equations; those live in the unit model that
/// the solver attaches by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitNode {
    pub id: UnitId,
    pub name: String,
    pub inlet_ports: Vec<String>,
    pub outlet_ports: Vec<String>,
}

/// A named stream edge.
///
/// A stream has exactly one producer, or none when it is an external feed.
/// It may have any number of consumers; a stream with no consuming unit is an
/// external product leaving the flowsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEdge {
    pub id: StreamId,
    pub name: String,
    pub producer: Option<PortRef>,
    pub consumers: Vec<PortRef>,
}

impl StreamEdge {
    /// External feed: no producing unit inside the flowsheet.
    pub fn is_feed(&self) -> bool {
        self.producer.is_none()
    }

    /// External product: no consuming unit inside the flowsheet.
    pub fn is_product(&self) -> bool {
        self.consumers.is_empty()
    }
}

/// The flowsheet graph: a validated, immutable collection of units and the
/// streams connecting them.
///
/// Connectivity is index-based and owned entirely by the graph; units are
/// referenced by id, never by live references, which keeps ownership simple
/// for the solver layer.
#[derive(Debug, Clone)]
pub struct FlowsheetGraph {
    pub(crate) units: Vec<UnitNode>,
    pub(crate) streams: Vec<StreamEdge>,

    /// Stream feeding each inlet port: inlet_streams[unit][port].
    pub(crate) inlet_streams: Vec<Vec<StreamId>>,

    /// Stream leaving each outlet port: outlet_streams[unit][port].
    pub(crate) outlet_streams: Vec<Vec<StreamId>>,
}

impl FlowsheetGraph {
    /// Return all units.
    pub fn units(&self) -> &[UnitNode] {
        &self.units
    }

    /// Return all streams, in declaration order.
    pub fn streams(&self) -> &[StreamEdge] {
        &self.streams
    }

    /// Get a unit by id (returns None if id out of bounds).
    pub fn unit(&self, id: UnitId) -> Option<&UnitNode> {
        self.units.get(id.index() as usize)
    }

    /// Get a stream by id (returns None if id out of bounds).
    pub fn stream(&self, id: StreamId) -> Option<&StreamEdge> {
        self.streams.get(id.index() as usize)
    }

    /// Look up a unit by name.
    pub fn unit_by_name(&self, name: &str) -> Option<&UnitNode> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Look up a stream by name.
    pub fn stream_by_name(&self, name: &str) -> Option<&StreamEdge> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Streams feeding a unit's inlet ports, in declared port order.
    pub fn inlet_streams(&self, unit: UnitId) -> &[StreamId] {
        self.inlet_streams
            .get(unit.index() as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Streams leaving a unit's outlet ports, in declared port order.
    pub fn outlet_streams(&self, unit: UnitId) -> &[StreamId] {
        self.outlet_streams
            .get(unit.index() as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// External feed streams (no producer), in declaration order.
    pub fn feeds(&self) -> impl Iterator<Item = &StreamEdge> + '_ {
        self.streams.iter().filter(|s| s.is_feed())
    }

    /// External product streams (no consumers), in declaration order.
    pub fn products(&self) -> impl Iterator<Item = &StreamEdge> + '_ {
        self.streams.iter().filter(|s| s.is_product())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FlowsheetBuilder;

    #[test]
    fn feed_and_product_classification() {
        let mut b = FlowsheetBuilder::new();
        b.add_unit("R1", &["in"], &["out"]).unwrap();
        b.connect_inlet("R1", "in", "feed").unwrap();
        b.connect_outlet("R1", "out", "product").unwrap();
        let g = b.build().unwrap();

        let feed = g.stream_by_name("feed").unwrap();
        assert!(feed.is_feed());
        assert!(!feed.is_product());

        let product = g.stream_by_name("product").unwrap();
        assert!(product.is_product());
        assert!(!product.is_feed());
    }

    #[test]
    fn port_order_is_preserved() {
        let mut b = FlowsheetBuilder::new();
        b.add_unit("M1", &["hot", "cold"], &["out"]).unwrap();
        b.connect_inlet("M1", "cold", "c").unwrap();
        b.connect_inlet("M1", "hot", "h").unwrap();
        b.connect_outlet("M1", "out", "mixed").unwrap();
        let g = b.build().unwrap();

        let m1 = g.unit_by_name("M1").unwrap();
        let inlets = g.inlet_streams(m1.id);
        // Declared order (hot, cold), not connection order.
        assert_eq!(g.stream(inlets[0]).unwrap().name, "h");
        assert_eq!(g.stream(inlets[1]).unwrap().name, "c");
    }
}
