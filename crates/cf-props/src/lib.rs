//! cf-props: stream data model and collaborator contracts for chemflow.
//!
//! Provides:
//! - `Composition` (validated, normalized component fractions)
//! - `Stream` (immutable value snapshot of a material stream)
//! - `ChemComponent` and the `PropertyPackage` contract with an ideal backend
//! - `ReactionModel` contract with a power-law/Arrhenius implementation
//!
//! Property packages and reaction models are the external collaborators of
//! the convergence engine: unit operations call them, the engine never does.

pub mod component;
pub mod composition;
pub mod error;
pub mod package;
pub mod reaction;
pub mod stream;

// Re-exports for ergonomics
pub use component::ChemComponent;
pub use composition::Composition;
pub use error::{PropertyError, PropertyResult};
pub use package::{IdealPropertyPackage, PropertyPackage};
pub use reaction::{PowerLawReaction, ReactionModel};
pub use stream::Stream;
