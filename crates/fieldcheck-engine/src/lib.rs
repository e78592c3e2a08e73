//! fieldcheck Engine
//!
//! Pure functions over a [`Catalog`](fieldcheck_model::Catalog) and a
//! [`Draft`](fieldcheck_model::Draft). Nothing in this crate performs I/O
//! or holds state between calls, so every answer it gives can be recomputed
//! from the draft alone.
//!
//! - [`ValidationEngine`]: section progress, missing fields, completeness
//! - [`ScoringEngine`]: per-checklist and global 0–5 scores
//! - [`FinalizationGate`]: blocking rules and the finalize state machine

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod gate;
mod scoring;
mod validation;

#[cfg(test)]
mod testing;

pub use error::GateError;
pub use gate::{
    allowed_transitions, validate_transition, Assessment, FinalizationGate, FinalizeState,
    GateMachine, NavigationTarget,
};
pub use scoring::{
    ChecklistStats, GlobalScore, ItemRef, ScoreBand, ScoringEngine, SectionPreview, SCALE,
};
pub use validation::{ChecklistProgress, MissingField, SectionStatus, ValidationEngine};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Assessment, ChecklistStats, FinalizationGate, FinalizeState, GlobalScore, MissingField,
        ScoringEngine, SectionStatus, ValidationEngine,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
