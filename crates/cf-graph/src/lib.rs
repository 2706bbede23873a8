//! cf-graph: flowsheet graph and sequencing layer for chemflow.
//!
//! Provides:
//! - Core graph data structures (UnitNode, StreamEdge, FlowsheetGraph)
//! - Incremental flowsheet builder with connectivity validation
//! - The sequencer: topological evaluation order plus tear-stream selection
//!   for recycle loops
//!
//! # Example
//!
//! ```
//! use cf_graph::FlowsheetBuilder;
//!
//! let mut builder = FlowsheetBuilder::new();
//! builder.add_unit("R1", &["in"], &["out"]).unwrap();
//! builder.add_unit("S1", &["in"], &["product"]).unwrap();
//! builder.connect_inlet("R1", "in", "feed").unwrap();
//! builder.connect("s1", "R1", "out", "S1", "in").unwrap();
//! builder.connect_outlet("S1", "product", "p1").unwrap();
//! let graph = builder.build().unwrap();
//!
//! let seq = cf_graph::sequence(&graph).unwrap();
//! assert!(seq.tears.is_empty());
//! assert_eq!(seq.order.len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod sequence;

// Re-exports for ergonomics
pub use builder::FlowsheetBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{FlowsheetGraph, PortRef, StreamEdge, UnitNode};
pub use sequence::{sequence, sequence_with_forced_tears, Sequence};
