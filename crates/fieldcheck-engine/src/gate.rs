//! Finalization gate: states, transitions and the pure assessment
//!
//! ```text
//! Idle -> Validating -> BlockedNoActive
//!                    -> BlockedNoneComplete
//!                    -> BlockedIncompleteRemaining
//!                    -> Persisting -> Committed | Failed | Duplicate
//! ```
//!
//! Terminal states return to `Idle` on the next finalize attempt. The
//! remote half of `Persisting` lives with the session; this module decides
//! everything that can be decided from the draft alone.

use crate::error::GateError;
use crate::scoring::{GlobalScore, ScoringEngine};
use crate::validation::{ChecklistProgress, MissingField, ValidationEngine};
use fieldcheck_model::{Catalog, ChecklistId, Draft};
use serde::Serialize;
use std::sync::Arc;

/// Finalization state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FinalizeState {
    /// No finalize in progress
    Idle,
    /// Checking completeness
    Validating,
    /// Every checklist is ignored
    BlockedNoActive,
    /// No active checklist is complete
    BlockedNoneComplete,
    /// Some but not all active checklists are complete
    BlockedIncompleteRemaining,
    /// Submitting the report
    Persisting,
    /// Report stored, draft cleared
    Committed,
    /// Report store refused or failed
    Failed,
    /// Same report already stored recently
    Duplicate,
}

impl FinalizeState {
    /// Blocked by validation
    #[inline]
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            Self::BlockedNoActive | Self::BlockedNoneComplete | Self::BlockedIncompleteRemaining
        )
    }

    /// End state of one finalize attempt
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_blocked() || matches!(self, Self::Committed | Self::Failed | Self::Duplicate)
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: FinalizeState) -> Vec<FinalizeState> {
    use FinalizeState::*;
    match from {
        Idle => vec![Validating],
        Validating => vec![
            BlockedNoActive,
            BlockedNoneComplete,
            BlockedIncompleteRemaining,
            Persisting,
        ],
        Persisting => vec![Committed, Failed, Duplicate],
        BlockedNoActive | BlockedNoneComplete | BlockedIncompleteRemaining | Committed | Failed
        | Duplicate => vec![Idle],
    }
}

/// Validates a transition against the table
pub fn validate_transition(from: FinalizeState, to: FinalizeState) -> Result<(), GateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(GateError::IllegalTransition { from, to })
    }
}

/// Tracks the state of one finalize attempt
#[derive(Debug, Clone)]
pub struct GateMachine {
    state: FinalizeState,
    trail: Vec<FinalizeState>,
}

impl GateMachine {
    /// Start in `Idle`
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: FinalizeState::Idle,
            trail: vec![FinalizeState::Idle],
        }
    }

    /// Move to `to`
    ///
    /// # Errors
    /// `GateError::IllegalTransition` if the table forbids it; state is unchanged.
    pub fn advance(&mut self, to: FinalizeState) -> Result<(), GateError> {
        validate_transition(self.state, to)?;
        tracing::debug!(from = ?self.state, ?to, "finalize transition");
        self.state = to;
        self.trail.push(to);
        Ok(())
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> FinalizeState {
        self.state
    }

    /// Every state visited, in order
    #[inline]
    #[must_use]
    pub fn trail(&self) -> &[FinalizeState] {
        &self.trail
    }
}

impl Default for GateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the UI should take the auditor after a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    /// Checklist to open
    pub checklist: ChecklistId,
    /// Field to scroll to
    pub first_missing: Option<MissingField>,
}

/// Outcome of the draft-only part of finalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Assessment {
    /// Every checklist is ignored
    NoActive,
    /// No active checklist is complete
    NoneComplete {
        /// Most advanced checklist
        target: NavigationTarget,
        /// Completion of every active checklist, in definition order
        progress: Vec<ChecklistProgress>,
    },
    /// At least one complete, at least one not
    IncompleteRemaining {
        /// First incomplete checklist
        target: NavigationTarget,
        /// Every incomplete active checklist, in definition order
        incomplete: Vec<ChecklistId>,
        /// Completion of every active checklist, in definition order
        progress: Vec<ChecklistProgress>,
    },
    /// All active checklists complete
    Ready {
        /// Active checklists, in definition order
        active: Vec<ChecklistId>,
        /// Global score to file with the report
        score: GlobalScore,
    },
}

impl Assessment {
    /// Gate state this assessment leads to
    #[must_use]
    pub fn next_state(&self) -> FinalizeState {
        match self {
            Self::NoActive => FinalizeState::BlockedNoActive,
            Self::NoneComplete { .. } => FinalizeState::BlockedNoneComplete,
            Self::IncompleteRemaining { .. } => FinalizeState::BlockedIncompleteRemaining,
            Self::Ready { .. } => FinalizeState::Persisting,
        }
    }

    /// Navigation target, if blocked on a checklist
    #[must_use]
    pub fn target(&self) -> Option<&NavigationTarget> {
        match self {
            Self::NoneComplete { target, .. } | Self::IncompleteRemaining { target, .. } => {
                Some(target)
            }
            Self::NoActive | Self::Ready { .. } => None,
        }
    }
}

/// Validation + scoring, wired for finalization
#[derive(Debug, Clone)]
pub struct FinalizationGate {
    validation: ValidationEngine,
    scoring: ScoringEngine,
}

impl FinalizationGate {
    /// Create gate over a catalog with default signature roles
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            validation: ValidationEngine::new(Arc::clone(&catalog)),
            scoring: ScoringEngine::new(catalog),
        }
    }

    /// Create gate from configured engines
    #[must_use]
    pub fn from_engines(validation: ValidationEngine, scoring: ScoringEngine) -> Self {
        Self { validation, scoring }
    }

    /// Validation engine
    #[inline]
    #[must_use]
    pub fn validation(&self) -> &ValidationEngine {
        &self.validation
    }

    /// Scoring engine
    #[inline]
    #[must_use]
    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    /// Evaluate the blocking rules in order
    #[must_use]
    pub fn assess(&self, draft: &Draft) -> Assessment {
        let active: Vec<_> = self
            .validation
            .catalog()
            .checklists()
            .iter()
            .filter(|def| !draft.is_ignored(def.id.as_str()))
            .collect();

        if active.is_empty() {
            return Assessment::NoActive;
        }

        let progress: Vec<ChecklistProgress> = active
            .iter()
            .map(|def| self.validation.progress_of(def, draft))
            .collect();

        let target_for = |checklist: &ChecklistId| NavigationTarget {
            checklist: checklist.clone(),
            first_missing: self.validation.first_missing(checklist.as_str(), draft),
        };

        if !progress.iter().any(ChecklistProgress::is_complete) {
            // strictly greater keeps the earliest checklist on ties
            let best = progress
                .iter()
                .fold(&progress[0], |best, p| if p.percent > best.percent { p } else { best });
            return Assessment::NoneComplete {
                target: target_for(&best.checklist),
                progress,
            };
        }

        let incomplete: Vec<ChecklistId> = progress
            .iter()
            .filter(|p| !p.is_complete())
            .map(|p| p.checklist.clone())
            .collect();

        if let Some(first) = incomplete.first() {
            return Assessment::IncompleteRemaining {
                target: target_for(first),
                incomplete,
                progress,
            };
        }

        Assessment::Ready {
            active: active.iter().map(|def| def.id.clone()).collect(),
            score: self.scoring.global_score(draft),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fill_required, sample_catalog, sign_all};
    use fieldcheck_model::{PassFail, Role};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn gate() -> FinalizationGate {
        FinalizationGate::new(Arc::new(sample_catalog()))
    }

    fn ignore_all_but(draft: &mut Draft, keep: &[&str]) {
        for id in ["gerencial", "limpeza", "notas"] {
            if !keep.contains(&id) {
                draft.toggle_ignored(id.into());
            }
        }
    }

    #[test]
    fn no_active_checklists() {
        let mut draft = Draft::new();
        ignore_all_but(&mut draft, &[]);

        let assessment = gate().assess(&draft);
        assert_eq!(assessment, Assessment::NoActive);
        assert_eq!(assessment.next_state(), FinalizeState::BlockedNoActive);
        assert!(assessment.target().is_none());
    }

    #[test]
    fn none_complete_targets_most_advanced() {
        let mut draft = Draft::new();
        ignore_all_but(&mut draft, &["gerencial", "limpeza"]);
        // limpeza: 1/3, gerencial: 1/4
        draft.set_answer("limpeza".into(), "filial".into(), "Loja".into());
        draft.set_answer("gerencial".into(), "filial".into(), "Loja".into());

        let assessment = gate().assess(&draft);
        let Assessment::NoneComplete { target, progress } = &assessment else {
            panic!("expected NoneComplete, got {assessment:?}");
        };
        assert_eq!(target.checklist.as_str(), "limpeza");
        assert_eq!(
            target.first_missing,
            Some(MissingField::Signature { role: Role::manager() })
        );
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].checklist.as_str(), "gerencial");
    }

    #[test]
    fn none_complete_ties_break_by_definition_order() {
        let mut draft = Draft::new();
        ignore_all_but(&mut draft, &["gerencial", "limpeza"]);

        let assessment = gate().assess(&draft);
        assert_eq!(assessment.target().unwrap().checklist.as_str(), "gerencial");
        assert_eq!(
            assessment.target().unwrap().first_missing,
            Some(MissingField::Item { section: "info_basica".into(), item: "filial".into() })
        );
    }

    #[test]
    fn incomplete_remaining_targets_first_incomplete() {
        let catalog = sample_catalog();
        let mut draft = Draft::new();
        sign_all(&mut draft);
        fill_required(&catalog, "limpeza", &mut draft);
        draft.toggle_ignored("notas".into());

        let assessment = gate().assess(&draft);
        let Assessment::IncompleteRemaining { target, incomplete, .. } = &assessment else {
            panic!("expected IncompleteRemaining, got {assessment:?}");
        };
        assert_eq!(target.checklist.as_str(), "gerencial");
        assert_eq!(incomplete, &vec![ChecklistId::from("gerencial")]);
        assert_eq!(assessment.next_state(), FinalizeState::BlockedIncompleteRemaining);
    }

    #[test]
    fn ready_when_all_active_complete() {
        let catalog = sample_catalog();
        let mut draft = Draft::new();
        sign_all(&mut draft);
        fill_required(&catalog, "gerencial", &mut draft);
        for item in ["pop_1", "pop_2", "pop_3", "pop_4"] {
            draft.set_answer("gerencial".into(), item.into(), PassFail::Pass.into());
        }
        ignore_all_but(&mut draft, &["gerencial"]);

        let assessment = gate().assess(&draft);
        let Assessment::Ready { active, score } = &assessment else {
            panic!("expected Ready, got {assessment:?}");
        };
        assert_eq!(active, &vec![ChecklistId::from("gerencial")]);
        assert_eq!(score.to_string(), "5.0");
        assert_eq!(assessment.next_state(), FinalizeState::Persisting);
    }

    #[test]
    fn machine_walks_happy_path() {
        let mut machine = GateMachine::new();
        machine.advance(FinalizeState::Validating).unwrap();
        machine.advance(FinalizeState::Persisting).unwrap();
        machine.advance(FinalizeState::Committed).unwrap();

        assert_eq!(
            machine.trail(),
            [
                FinalizeState::Idle,
                FinalizeState::Validating,
                FinalizeState::Persisting,
                FinalizeState::Committed,
            ]
        );
    }

    #[test]
    fn machine_rejects_skipping_validation() {
        let mut machine = GateMachine::new();
        let err = machine.advance(FinalizeState::Persisting).unwrap_err();
        assert_eq!(
            err,
            GateError::IllegalTransition {
                from: FinalizeState::Idle,
                to: FinalizeState::Persisting
            }
        );
        assert_eq!(machine.state(), FinalizeState::Idle);
    }

    #[test]
    fn blocked_states_cannot_persist() {
        assert!(
            validate_transition(FinalizeState::BlockedNoActive, FinalizeState::Persisting).is_err()
        );
        assert!(validate_transition(FinalizeState::Failed, FinalizeState::Committed).is_err());
        assert!(validate_transition(FinalizeState::Failed, FinalizeState::Idle).is_ok());
    }

    const ALL_STATES: [FinalizeState; 9] = [
        FinalizeState::Idle,
        FinalizeState::Validating,
        FinalizeState::BlockedNoActive,
        FinalizeState::BlockedNoneComplete,
        FinalizeState::BlockedIncompleteRemaining,
        FinalizeState::Persisting,
        FinalizeState::Committed,
        FinalizeState::Failed,
        FinalizeState::Duplicate,
    ];

    proptest! {
        #[test]
        fn prop_validate_matches_table(from in 0usize..9, to in 0usize..9) {
            let (from, to) = (ALL_STATES[from], ALL_STATES[to]);
            let allowed = allowed_transitions(from);
            prop_assert_eq!(validate_transition(from, to).is_ok(), allowed.contains(&to));
        }

        #[test]
        fn prop_terminal_states_only_reset(state in 0usize..9) {
            let state = ALL_STATES[state];
            if state.is_terminal() {
                prop_assert_eq!(allowed_transitions(state), vec![FinalizeState::Idle]);
            }
        }
    }
}
