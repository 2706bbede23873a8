//! Problem assembly: graph + unit models + feed values.

use std::collections::HashMap;

use cf_core::{StreamId, UnitId};
use cf_graph::{FlowsheetGraph, GraphError};
use cf_props::Stream;
use cf_units::UnitModel;

use crate::error::{SolverError, SolverResult};

/// A solvable flowsheet: the connectivity graph, one balance model per unit,
/// and a stream value for every external feed.
///
/// The graph owns names and topology; models are attached by unit name and
/// must declare exactly the ports the graph node declares, so the solver can
/// route streams to ports positionally without guessing.
pub struct FlowsheetProblem {
    graph: FlowsheetGraph,
    models: HashMap<UnitId, Box<dyn UnitModel>>,
    feeds: HashMap<StreamId, Stream>,
}

impl FlowsheetProblem {
    pub fn new(graph: FlowsheetGraph) -> Self {
        Self {
            graph,
            models: HashMap::new(),
            feeds: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &FlowsheetGraph {
        &self.graph
    }

    /// Attach the balance model for a unit.
    ///
    /// The model's declared inlet and outlet ports must match the graph
    /// node's, in order; a mismatch here would otherwise surface later as a
    /// confusing missing-stream failure mid-solve.
    pub fn set_model(&mut self, unit: &str, model: Box<dyn UnitModel>) -> SolverResult<()> {
        let node = self
            .graph
            .unit_by_name(unit)
            .ok_or_else(|| SolverError::setup(format!("unknown unit '{unit}'")))?;

        if node.inlet_ports != model.inlet_ports() || node.outlet_ports != model.outlet_ports() {
            return Err(SolverError::setup(format!(
                "model ports for '{unit}' do not match the flowsheet declaration \
                 (graph: in={:?} out={:?}, model: in={:?} out={:?})",
                node.inlet_ports,
                node.outlet_ports,
                model.inlet_ports(),
                model.outlet_ports(),
            )));
        }

        self.models.insert(node.id, model);
        Ok(())
    }

    /// Set the value of an external feed stream.
    pub fn set_feed(&mut self, stream: &str, value: Stream) -> SolverResult<()> {
        let edge = self
            .graph
            .stream_by_name(stream)
            .ok_or_else(|| GraphError::UnknownStream {
                name: stream.to_string(),
            })?;
        if !edge.is_feed() {
            return Err(SolverError::setup(format!(
                "stream '{stream}' is produced inside the flowsheet and cannot be a feed"
            )));
        }
        value
            .validate()
            .map_err(|e| SolverError::setup(format!("feed '{stream}' is invalid: {e}")))?;

        self.feeds.insert(edge.id, value);
        Ok(())
    }

    pub(crate) fn model(&self, unit: UnitId) -> Option<&dyn UnitModel> {
        self.models.get(&unit).map(Box::as_ref)
    }

    pub(crate) fn feeds(&self) -> impl Iterator<Item = (StreamId, &Stream)> + '_ {
        self.feeds.iter().map(|(id, s)| (*id, s))
    }

    /// Check that the problem is fully specified: a model on every unit and a
    /// value on every feed.
    pub fn validate(&self) -> SolverResult<()> {
        for unit in self.graph.units() {
            if !self.models.contains_key(&unit.id) {
                return Err(SolverError::setup(format!(
                    "unit '{}' has no model attached",
                    unit.name
                )));
            }
        }
        for feed in self.graph.feeds() {
            if !self.feeds.contains_key(&feed.id) {
                return Err(SolverError::setup(format!(
                    "feed stream '{}' has no value",
                    feed.name
                )));
            }
        }
        Ok(())
    }
}
