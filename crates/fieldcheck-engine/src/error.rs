//! Error types for the engine

use crate::gate::FinalizeState;

/// Finalization gate errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// Transition not in the gate's transition table
    #[error("illegal finalize transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: FinalizeState,
        to: FinalizeState,
    },
}
