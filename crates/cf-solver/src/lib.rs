//! cf-solver: sequential-modular flowsheet convergence engine for chemflow.
//!
//! The solver takes a validated [`cf_graph::FlowsheetGraph`], a unit model
//! per node, and feed stream values; it sequences the flowsheet, seeds the
//! tear streams, and iterates outer passes until every tear stream settles
//! within tolerance on two consecutive passes. Wegstein acceleration is
//! applied per scalar field of each tear stream and can be disabled for
//! plain successive substitution.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use cf_core::{k, pa};
//! use cf_graph::FlowsheetBuilder;
//! use cf_props::{ChemComponent, Composition, IdealPropertyPackage, Stream};
//! use cf_solver::{solve, FlowsheetProblem, SolverConfig, SolveState};
//! use cf_units::Mixer;
//!
//! let prop = Arc::new(
//!     IdealPropertyPackage::new(vec![ChemComponent::new("A", "A", 30.0, 100.0)]).unwrap(),
//! );
//!
//! let mut b = FlowsheetBuilder::new();
//! b.add_unit("M1", &["in1"], &["out"]).unwrap();
//! b.connect_inlet("M1", "in1", "feed").unwrap();
//! b.connect_outlet("M1", "out", "product").unwrap();
//! let graph = b.build().unwrap();
//!
//! let mut problem = FlowsheetProblem::new(graph);
//! problem.set_model("M1", Box::new(Mixer::new("M1", 1, prop).unwrap())).unwrap();
//! problem
//!     .set_feed("feed", Stream::new(1.0, k(300.0), pa(1e5), Composition::pure("A")))
//!     .unwrap();
//!
//! let report = solve(&problem, &SolverConfig::default()).unwrap();
//! assert_eq!(report.state, SolveState::Converged);
//! assert!((report.streams["product"].flow - 1.0).abs() < 1e-9);
//! ```

pub mod accel;
pub mod config;
pub mod error;
pub mod problem;
pub mod registry;
pub mod solve;
pub mod trace;

// Re-exports for ergonomics
pub use accel::Wegstein;
pub use config::SolverConfig;
pub use error::{SolverError, SolverResult};
pub use problem::FlowsheetProblem;
pub use registry::StreamRegistry;
pub use solve::{
    solve, solve_batch, solve_with_cancel, CancelToken, SolveFailure, SolveReport, SolveState,
};
pub use trace::TraceEntry;
