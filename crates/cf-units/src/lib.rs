//! cf-units: unit-operation models for chemflow.
//!
//! Every variant implements the same `UnitModel` contract: declared named
//! ports plus a pure `solve(inlets) -> outlets` function. Variants differ
//! only in their balance equations; all conserve total flow unless explicit
//! reaction stoichiometry says otherwise, and all wrap property-package
//! failures at their own boundary.

pub mod common;
pub mod error;
pub mod heat_exchanger;
pub mod mixer;
pub mod reactor;
pub mod separator;
pub mod splitter;
pub mod traits;

// Re-exports for ergonomics
pub use error::{UnitError, UnitResult};
pub use heat_exchanger::{HeatExchanger, HxSpec};
pub use mixer::Mixer;
pub use reactor::{Cstr, FixedConversionReactor};
pub use separator::Separator;
pub use splitter::Splitter;
pub use traits::{PortMap, UnitModel};
