//! Outer-loop orchestrator: sequencing, tear seeding, and the pass loop.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cf_core::units::constants::{P_ATM_PA, T_REF_K};
use cf_core::{k, pa, rel_change, Real, StreamId};
use cf_graph::{sequence_with_forced_tears, FlowsheetGraph, GraphError};
use cf_props::{Composition, Stream};
use cf_units::PortMap;
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::accel::{self, Wegstein};
use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::problem::FlowsheetProblem;
use crate::registry::StreamRegistry;
use crate::trace::TraceEntry;

/// Lifecycle of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveState {
    /// Seeded but no pass run yet.
    Initialized,
    /// At least one pass run, outcome undecided.
    Iterating,
    /// Every tear stream settled within tolerance on two consecutive passes.
    Converged,
    /// The iteration did not settle within the pass budget, or the tear
    /// changes grew for too many consecutive passes.
    Diverged,
    /// A unit model returned an error mid-pass.
    Failed,
    /// The caller cancelled the solve between passes.
    Cancelled,
}

/// What went wrong, when a solve ends in `Diverged` or `Failed`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveFailure {
    /// Unit whose model errored (`Failed` only).
    pub unit: Option<String>,
    /// Worst tear stream at termination (`Diverged` only).
    pub stream: Option<String>,
    /// Worst field of that stream.
    pub field: Option<String>,
    pub what: String,
}

/// Outcome of a solve: terminal state, pass count, stream values by name,
/// and the per-pass convergence trace.
///
/// On `Failed` the stream values are the snapshot after the last fully
/// completed pass (the seeds, if the first pass failed), never the
/// half-written state of the aborted pass.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveReport {
    pub state: SolveState,
    /// Completed outer passes.
    pub passes: usize,
    pub streams: BTreeMap<String, Stream>,
    pub trace: Vec<TraceEntry>,
    pub failure: Option<SolveFailure>,
}

/// Cooperative cancellation handle, checked between passes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Solve a flowsheet to steady state.
pub fn solve(problem: &FlowsheetProblem, config: &SolverConfig) -> SolverResult<SolveReport> {
    solve_with_cancel(problem, config, &CancelToken::new())
}

/// Solve with a cancellation token; cancellation is honored at pass
/// boundaries and yields a `Cancelled` report with the current streams.
pub fn solve_with_cancel(
    problem: &FlowsheetProblem,
    config: &SolverConfig,
    cancel: &CancelToken,
) -> SolverResult<SolveReport> {
    solve_case(problem, config, &BTreeMap::new(), cancel)
}

/// Solve many feed scenarios of the same flowsheet in parallel.
///
/// Each case maps feed stream names to override values; feeds without an
/// override keep their problem-level value. The unit models are shared
/// read-only across worker threads.
pub fn solve_batch(
    problem: &FlowsheetProblem,
    config: &SolverConfig,
    cases: &[BTreeMap<String, Stream>],
) -> Vec<SolverResult<SolveReport>> {
    cases
        .par_iter()
        .map(|case| solve_case(problem, config, case, &CancelToken::new()))
        .collect()
}

fn solve_case(
    problem: &FlowsheetProblem,
    config: &SolverConfig,
    feed_overrides: &BTreeMap<String, Stream>,
    cancel: &CancelToken,
) -> SolverResult<SolveReport> {
    problem.validate()?;
    let graph = problem.graph();

    let mut forced = Vec::with_capacity(config.forced_tears.len());
    for name in &config.forced_tears {
        let edge = graph
            .stream_by_name(name)
            .ok_or_else(|| GraphError::UnknownStream { name: name.clone() })?;
        forced.push(edge.id);
    }
    let seq = sequence_with_forced_tears(graph, &forced)?;
    debug!(
        units = seq.order.len(),
        tears = seq.tears.len(),
        "flowsheet sequenced"
    );

    // Populate feeds, then overrides on top.
    let mut registry = StreamRegistry::new(graph.streams().len());
    for (id, s) in problem.feeds() {
        registry.set(id, s.clone());
    }
    for (name, s) in feed_overrides {
        let edge = graph
            .stream_by_name(name)
            .ok_or_else(|| GraphError::UnknownStream { name: name.clone() })?;
        if !edge.is_feed() {
            return Err(SolverError::setup(format!(
                "feed override '{name}' targets an interior stream"
            )));
        }
        s.validate()
            .map_err(|e| SolverError::setup(format!("feed override '{name}' is invalid: {e}")))?;
        registry.set(edge.id, s.clone());
    }

    // Seed every tear: explicit guess by name, or a zero-flow stream at feed
    // conditions with a uniform composition over all fed components.
    let default_seed = default_tear_seed(graph, &registry)?;
    for &tear in &seq.tears {
        let name = edge_name(graph, tear);
        match config.tear_guesses.get(&name) {
            Some(guess) => {
                guess.validate().map_err(|e| {
                    SolverError::setup(format!("tear guess for '{name}' is invalid: {e}"))
                })?;
                registry.set(tear, guess.clone());
            }
            None => registry.set(tear, default_seed.clone()),
        }
    }

    let mut accels = vec![Wegstein::new(config.acceleration); seq.tears.len()];
    let mut trace_log: Vec<TraceEntry> = Vec::new();
    let mut last_stable = registry.clone();

    let mut consecutive_ok = 0usize;
    let mut prev_worst: Option<Real> = None;
    let mut growing = 0usize;
    let mut last_worst: Option<(String, String, Real)> = None;

    for pass in 1..=config.max_passes {
        if cancel.is_cancelled() {
            info!(passes = pass - 1, "solve cancelled");
            return Ok(make_report(
                SolveState::Cancelled,
                pass - 1,
                graph,
                &last_stable,
                trace_log,
                None,
            ));
        }

        // Tear inputs as seen by this pass.
        let mut inputs = Vec::with_capacity(seq.tears.len());
        for &tear in &seq.tears {
            let s = registry
                .get(tear)
                .ok_or_else(|| SolverError::setup("tear stream lost its value".to_string()))?;
            inputs.push(accel::stream_to_vector(s));
        }

        for &unit_id in &seq.order {
            let node = graph
                .unit(unit_id)
                .ok_or_else(|| SolverError::setup("sequencer produced an unknown unit".to_string()))?;
            let model = problem.model(unit_id).ok_or_else(|| {
                SolverError::setup(format!("unit '{}' has no model attached", node.name))
            })?;

            let mut inlets = PortMap::new();
            for (port, &sid) in graph.inlet_streams(unit_id).iter().enumerate() {
                let s = registry.get(sid).ok_or_else(|| {
                    SolverError::setup(format!(
                        "stream '{}' has no value when '{}' runs; sequencing is inconsistent",
                        edge_name(graph, sid),
                        node.name
                    ))
                })?;
                inlets.insert(node.inlet_ports[port].clone(), s.clone());
            }

            match model.solve(&inlets) {
                Ok(outs) => {
                    trace!(unit = %node.name, pass, "unit solved");
                    for (port, &sid) in graph.outlet_streams(unit_id).iter().enumerate() {
                        let port_name = &node.outlet_ports[port];
                        let s = outs.get(port_name).ok_or_else(|| {
                            SolverError::setup(format!(
                                "model for '{}' produced no outlet '{port_name}'",
                                node.name
                            ))
                        })?;
                        registry.set(sid, s.clone());
                    }
                }
                Err(e) => {
                    warn!(unit = %node.name, error = %e, pass, "unit failed; aborting solve");
                    let failure = SolveFailure {
                        unit: Some(node.name.clone()),
                        stream: None,
                        field: None,
                        what: e.to_string(),
                    };
                    return Ok(make_report(
                        SolveState::Failed,
                        pass - 1,
                        graph,
                        &last_stable,
                        trace_log,
                        Some(failure),
                    ));
                }
            }
        }

        // Measure tear changes and propose next guesses. Proposals are
        // committed only if another pass actually runs: a terminal report
        // must carry the values the producing units computed, not the
        // accelerator's extrapolated guess for a pass that never happens.
        let mut worst: Real = 0.0;
        let mut proposals: Vec<(StreamId, Stream)> = Vec::with_capacity(seq.tears.len());
        for (t_idx, &tear) in seq.tears.iter().enumerate() {
            let computed = registry
                .get(tear)
                .cloned()
                .ok_or_else(|| SolverError::setup("tear stream was not produced".to_string()))?;
            let name = edge_name(graph, tear);
            let x = &inputs[t_idx];
            let gx = accel::stream_to_vector(&computed);

            let (tear_worst, field) = if x.len() == gx.len() {
                let mut w = 0.0;
                let mut w_idx = 0;
                for i in 0..x.len() {
                    let c = rel_change(x[i], gx[i]);
                    if c > w {
                        w = c;
                        w_idx = i;
                    }
                }
                (w, accel::field_name(&computed, w_idx))
            } else {
                // Component set changed under the tear; field-wise comparison
                // is meaningless, so force another pass from scratch.
                accels[t_idx].reset();
                (1.0, "layout".to_string())
            };

            trace!(pass, stream = %name, field = %field, rel_change = tear_worst, "tear update");
            trace_log.push(TraceEntry {
                pass,
                stream: name.clone(),
                field: field.clone(),
                rel_change: tear_worst,
            });
            if tear_worst >= worst {
                worst = tear_worst;
                last_worst = Some((name, field, tear_worst));
            }

            if x.len() == gx.len() {
                let mut proposal = accels[t_idx].propose(x, &gx);
                accel::guard_physical(&mut proposal, &gx);
                proposals.push((tear, accel::stream_from_vector(&computed, &proposal)));
            }
        }

        debug!(pass, worst, "outer pass complete");
        last_stable = registry.clone();

        if worst < config.tolerance {
            consecutive_ok += 1;
            if consecutive_ok >= 2 || seq.tears.is_empty() {
                info!(passes = pass, "flowsheet converged");
                return Ok(make_report(
                    SolveState::Converged,
                    pass,
                    graph,
                    &registry,
                    trace_log,
                    None,
                ));
            }
        } else {
            consecutive_ok = 0;
        }

        if let Some(prev) = prev_worst {
            growing = if worst > prev { growing + 1 } else { 0 };
            if growing >= config.divergence_window {
                warn!(pass, worst, "tear changes growing; declaring divergence");
                let failure = divergence_failure(
                    &last_worst,
                    format!(
                        "tear change grew for {} consecutive passes",
                        config.divergence_window
                    ),
                );
                return Ok(make_report(
                    SolveState::Diverged,
                    pass,
                    graph,
                    &registry,
                    trace_log,
                    Some(failure),
                ));
            }
        }
        prev_worst = Some(worst);

        for (tear, next) in proposals {
            registry.set(tear, next);
        }
    }

    warn!(passes = config.max_passes, "pass budget exhausted without convergence");
    let failure = divergence_failure(
        &last_worst,
        format!("did not converge within {} passes", config.max_passes),
    );
    Ok(make_report(
        SolveState::Diverged,
        config.max_passes,
        graph,
        &last_stable,
        trace_log,
        Some(failure),
    ))
}

fn divergence_failure(
    last_worst: &Option<(String, String, Real)>,
    what: String,
) -> SolveFailure {
    SolveFailure {
        unit: None,
        stream: last_worst.as_ref().map(|(s, _, _)| s.clone()),
        field: last_worst.as_ref().map(|(_, f, _)| f.clone()),
        what,
    }
}

fn make_report(
    state: SolveState,
    passes: usize,
    graph: &FlowsheetGraph,
    registry: &StreamRegistry,
    trace: Vec<TraceEntry>,
    failure: Option<SolveFailure>,
) -> SolveReport {
    let mut streams = BTreeMap::new();
    for (id, s) in registry.iter() {
        streams.insert(edge_name(graph, id), s.clone());
    }
    SolveReport {
        state,
        passes,
        streams,
        trace,
        failure,
    }
}

fn edge_name(graph: &FlowsheetGraph, id: StreamId) -> String {
    graph
        .stream(id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| format!("stream-{id}"))
}

/// Default tear seed: zero flow at the first feed's temperature and
/// pressure, uniform composition over every component any feed carries.
fn default_tear_seed(graph: &FlowsheetGraph, registry: &StreamRegistry) -> SolverResult<Stream> {
    let mut components: BTreeSet<String> = BTreeSet::new();
    let mut t = None;
    let mut p = None;
    for feed in graph.feeds() {
        if let Some(s) = registry.get(feed.id) {
            if t.is_none() {
                t = Some(s.temperature);
                p = Some(s.pressure);
            }
            for name in s.composition.names() {
                components.insert(name.to_string());
            }
        }
    }

    if components.is_empty() {
        return Err(SolverError::setup(
            "cannot seed tear streams: no feed provides a composition".to_string(),
        ));
    }
    let equal = 1.0 / components.len() as Real;
    let composition =
        Composition::from_fractions(components.into_iter().map(|n| (n, equal)))
            .map_err(|e| SolverError::setup(format!("tear seed composition invalid: {e}")))?;

    Ok(Stream::new(
        0.0,
        t.unwrap_or_else(|| k(T_REF_K)),
        p.unwrap_or_else(|| pa(P_ATM_PA)),
        composition,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_graph::FlowsheetBuilder;

    #[test]
    fn cancel_token_round_trip() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn default_seed_merges_feed_components() {
        let mut b = FlowsheetBuilder::new();
        b.add_unit("M1", &["in1", "in2"], &["out"]).unwrap();
        b.connect_inlet("M1", "in1", "f1").unwrap();
        b.connect_inlet("M1", "in2", "f2").unwrap();
        b.connect_outlet("M1", "out", "p1").unwrap();
        let g = b.build().unwrap();

        let mut reg = StreamRegistry::new(g.streams().len());
        let f1 = g.stream_by_name("f1").unwrap().id;
        let f2 = g.stream_by_name("f2").unwrap().id;
        reg.set(f1, Stream::new(1.0, k(320.0), pa(2e5), Composition::pure("A")));
        reg.set(f2, Stream::new(1.0, k(400.0), pa(1e5), Composition::pure("B")));

        let seed = default_tear_seed(&g, &reg).unwrap();
        assert_eq!(seed.flow, 0.0);
        // First-declared feed sets the seed conditions.
        assert!((seed.temperature.value - 320.0).abs() < 1e-9);
        assert!((seed.composition.fraction("A") - 0.5).abs() < 1e-12);
        assert!((seed.composition.fraction("B") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn seed_without_feeds_is_an_error() {
        let mut b = FlowsheetBuilder::new();
        b.add_unit("R1", &["in"], &["out"]).unwrap();
        b.connect_inlet("R1", "in", "feed").unwrap();
        b.connect_outlet("R1", "out", "p1").unwrap();
        let g = b.build().unwrap();

        let reg = StreamRegistry::new(g.streams().len());
        assert!(default_tear_seed(&g, &reg).is_err());
    }
}
