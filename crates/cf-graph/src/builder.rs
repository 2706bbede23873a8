//! Incremental flowsheet builder.

use std::collections::HashMap;

use cf_core::{StreamId, UnitId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{FlowsheetGraph, PortRef, StreamEdge, UnitNode};

/// Builder for constructing a flowsheet graph incrementally.
///
/// Streams are created implicitly the first time a connection names them, so
/// a recycle stream can be consumed before the unit producing it is wired up.
/// Call `build()` to validate connectivity and freeze the graph.
#[derive(Debug, Default)]
pub struct FlowsheetBuilder {
    units: Vec<UnitNode>,
    unit_names: HashMap<String, UnitId>,
    streams: Vec<StreamEdge>,
    stream_names: HashMap<String, StreamId>,

    /// Per-unit inlet port connections (None = not yet connected).
    inlet_conns: Vec<Vec<Option<StreamId>>>,
    /// Per-unit outlet port connections.
    outlet_conns: Vec<Vec<Option<StreamId>>>,
}

impl FlowsheetBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit with its declared inlet and outlet port names.
    pub fn add_unit(
        &mut self,
        name: impl Into<String>,
        inlet_ports: &[&str],
        outlet_ports: &[&str],
    ) -> GraphResult<UnitId> {
        let name = name.into();
        if self.unit_names.contains_key(&name) {
            return Err(GraphError::DuplicateUnit { name });
        }
        for ports in [inlet_ports, outlet_ports] {
            for (i, p) in ports.iter().enumerate() {
                if ports[..i].contains(p) {
                    return Err(GraphError::DuplicatePort {
                        unit: name.clone(),
                        port: (*p).to_string(),
                    });
                }
            }
        }

        let id = UnitId::from_index(self.units.len() as u32);
        self.unit_names.insert(name.clone(), id);
        self.inlet_conns.push(vec![None; inlet_ports.len()]);
        self.outlet_conns.push(vec![None; outlet_ports.len()]);
        self.units.push(UnitNode {
            id,
            name,
            inlet_ports: inlet_ports.iter().map(|s| s.to_string()).collect(),
            outlet_ports: outlet_ports.iter().map(|s| s.to_string()).collect(),
        });
        Ok(id)
    }

    /// Get or create a stream by name. Declaration order is the order in
    /// which names first appear; the sequencer uses it for tie-breaking.
    pub fn stream(&mut self, name: impl Into<String>) -> StreamId {
        let name = name.into();
        if let Some(&id) = self.stream_names.get(&name) {
            return id;
        }
        let id = StreamId::from_index(self.streams.len() as u32);
        self.stream_names.insert(name.clone(), id);
        self.streams.push(StreamEdge {
            id,
            name,
            producer: None,
            consumers: Vec::new(),
        });
        id
    }

    /// Attach a stream to a unit's outlet port, making the unit its producer.
    pub fn connect_outlet(&mut self, unit: &str, port: &str, stream: &str) -> GraphResult<()> {
        let (unit_id, port_idx) = self.resolve_port(unit, port, false)?;
        let stream_id = self.stream(stream);
        let edge = &mut self.streams[stream_id.index() as usize];
        if edge.producer.is_some() {
            return Err(GraphError::MultipleProducers {
                stream: edge.name.clone(),
            });
        }
        let slot = &mut self.outlet_conns[unit_id.index() as usize][port_idx];
        if slot.is_some() {
            return Err(GraphError::PortAlreadyConnected {
                unit: unit.to_string(),
                port: port.to_string(),
            });
        }
        edge.producer = Some(PortRef {
            unit: unit_id,
            port: port_idx,
        });
        *slot = Some(stream_id);
        Ok(())
    }

    /// Attach a stream to a unit's inlet port, adding the unit as a consumer.
    pub fn connect_inlet(&mut self, unit: &str, port: &str, stream: &str) -> GraphResult<()> {
        let (unit_id, port_idx) = self.resolve_port(unit, port, true)?;
        let stream_id = self.stream(stream);
        let slot = &mut self.inlet_conns[unit_id.index() as usize][port_idx];
        if slot.is_some() {
            return Err(GraphError::PortAlreadyConnected {
                unit: unit.to_string(),
                port: port.to_string(),
            });
        }
        self.streams[stream_id.index() as usize]
            .consumers
            .push(PortRef {
                unit: unit_id,
                port: port_idx,
            });
        *slot = Some(stream_id);
        Ok(())
    }

    /// Connect two units with a named stream in one call.
    pub fn connect(
        &mut self,
        stream: &str,
        from_unit: &str,
        from_port: &str,
        to_unit: &str,
        to_port: &str,
    ) -> GraphResult<()> {
        self.connect_outlet(from_unit, from_port, stream)?;
        self.connect_inlet(to_unit, to_port, stream)
    }

    fn resolve_port(&self, unit: &str, port: &str, inlet: bool) -> GraphResult<(UnitId, usize)> {
        let unit_id = *self
            .unit_names
            .get(unit)
            .ok_or_else(|| GraphError::UnknownUnit {
                name: unit.to_string(),
            })?;
        let node = &self.units[unit_id.index() as usize];
        let ports = if inlet {
            &node.inlet_ports
        } else {
            &node.outlet_ports
        };
        let port_idx = ports
            .iter()
            .position(|p| p == port)
            .ok_or_else(|| GraphError::UnknownPort {
                unit: unit.to_string(),
                port: port.to_string(),
            })?;
        Ok((unit_id, port_idx))
    }

    /// Validate connectivity and freeze the graph.
    ///
    /// Every declared port must have a stream attached; an unconnected port
    /// is a `MissingStream` error and the solve never starts.
    pub fn build(self) -> GraphResult<FlowsheetGraph> {
        let mut inlet_streams = Vec::with_capacity(self.units.len());
        let mut outlet_streams = Vec::with_capacity(self.units.len());

        for (u, unit) in self.units.iter().enumerate() {
            let mut inlets = Vec::with_capacity(unit.inlet_ports.len());
            for (p, slot) in self.inlet_conns[u].iter().enumerate() {
                match slot {
                    Some(id) => inlets.push(*id),
                    None => {
                        return Err(GraphError::MissingStream {
                            unit: unit.name.clone(),
                            port: unit.inlet_ports[p].clone(),
                        });
                    }
                }
            }
            inlet_streams.push(inlets);

            let mut outlets = Vec::with_capacity(unit.outlet_ports.len());
            for (p, slot) in self.outlet_conns[u].iter().enumerate() {
                match slot {
                    Some(id) => outlets.push(*id),
                    None => {
                        return Err(GraphError::MissingStream {
                            unit: unit.name.clone(),
                            port: unit.outlet_ports[p].clone(),
                        });
                    }
                }
            }
            outlet_streams.push(outlets);
        }

        Ok(FlowsheetGraph {
            units: self.units,
            streams: self.streams,
            inlet_streams,
            outlet_streams,
        })
    }
}
