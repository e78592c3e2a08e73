//! Finalize: assessment, report submission and commit
//!
//! The draft-only rules live in [`FinalizationGate`]; this module runs the
//! remote half of `Persisting` and drives the [`GateMachine`] through every
//! state it visits.
//!
//! - `Committed`: draft cleared locally, remote draft deleted (or blanked
//!   when the delete fails), report summary pushed onto the cache. Edits
//!   made while the report was in flight keep the draft instead.
//! - `Failed`: draft kept, cached report listing refreshed best-effort
//! - `Duplicate`: draft kept, nothing submitted

use crate::autosave::AutosaveScheduler;
use crate::cache::ReportCache;
use crate::error::RemoteError;
use crate::remote::{DraftRemote, ReportRemote};
use crate::store::DraftStore;
use fieldcheck_engine::{
    Assessment, FinalizationGate, FinalizeState, GateError, GateMachine, NavigationTarget,
};
use fieldcheck_model::{Author, CreatedReport, Draft, ReportId, ReportSnapshot, ReportSummary};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Result of one finalize attempt
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    /// Terminal state
    pub state: FinalizeState,
    /// Draft assessment the attempt started from
    pub assessment: Assessment,
    /// Created report, when committed
    pub report: Option<CreatedReport>,
    /// Submission error, when failed
    pub error: Option<RemoteError>,
    /// Every state visited, starting at `Idle`
    pub trail: Vec<FinalizeState>,
}

impl FinalizeOutcome {
    /// Where to send the auditor, for blocked outcomes
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&NavigationTarget> {
        self.assessment.target()
    }

    /// Id of the created report
    #[must_use]
    pub fn report_id(&self) -> Option<&ReportId> {
        self.report.as_ref().map(|r| &r.id)
    }

    #[inline]
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.state == FinalizeState::Committed
    }
}

/// Runs finalize attempts for one auditor, one at a time
pub struct Finalizer {
    gate: FinalizationGate,
    store: Arc<DraftStore>,
    autosave: AutosaveScheduler,
    drafts: Arc<dyn DraftRemote>,
    reports: Arc<dyn ReportRemote>,
    cache: ReportCache,
    author: Author,
    site_name: String,
    duplicate_window: Option<Duration>,
    running: Mutex<()>,
}

impl std::fmt::Debug for Finalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finalizer")
            .field("author", &self.author)
            .field("site_name", &self.site_name)
            .field("duplicate_window", &self.duplicate_window)
            .finish_non_exhaustive()
    }
}

impl Finalizer {
    /// Create finalizer
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        gate: FinalizationGate,
        store: Arc<DraftStore>,
        autosave: AutosaveScheduler,
        drafts: Arc<dyn DraftRemote>,
        reports: Arc<dyn ReportRemote>,
        cache: ReportCache,
        author: Author,
        site_name: String,
    ) -> Self {
        Self {
            gate,
            store,
            autosave,
            drafts,
            reports,
            cache,
            author,
            site_name,
            duplicate_window: None,
            running: Mutex::new(()),
        }
    }

    /// Refuse reports identical to one filed within `window`
    #[must_use]
    pub fn with_duplicate_guard(mut self, window: Option<Duration>) -> Self {
        self.duplicate_window = window;
        self
    }

    /// Gate used for assessment
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &FinalizationGate {
        &self.gate
    }

    /// Report listing cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &ReportCache {
        &self.cache
    }

    /// Filing auditor
    #[inline]
    #[must_use]
    pub fn author(&self) -> &Author {
        &self.author
    }

    /// Validate and, when everything active is complete, file the report
    ///
    /// Concurrent calls wait for each other.
    ///
    /// # Errors
    /// `GateError` only if the state machine is driven out of order.
    pub async fn finalize(&self) -> Result<FinalizeOutcome, GateError> {
        let _running = self.running.lock().await;
        let mut machine = GateMachine::new();
        machine.advance(FinalizeState::Validating)?;

        let revision = self.store.revision();
        let draft = revision.draft;
        let assessment = self.gate.assess(&draft);
        machine.advance(assessment.next_state())?;

        let score = match &assessment {
            Assessment::Ready { score, .. } => score.to_string(),
            blocked => {
                tracing::info!(
                    state = ?machine.state(),
                    target = ?blocked.target().map(|t| &t.checklist),
                    "finalize blocked"
                );
                return Ok(outcome(machine, assessment, None, None));
            }
        };

        let snapshot =
            ReportSnapshot::capture(self.author.clone(), self.site_name.clone(), score, &draft);

        if self.is_duplicate(&snapshot).await {
            machine.advance(FinalizeState::Duplicate)?;
            tracing::info!(score = %snapshot.score, "identical report already filed");
            return Ok(outcome(machine, assessment, None, None));
        }

        let error = match self.reports.create_report(&snapshot).await {
            Ok(Some(created)) => {
                machine.advance(FinalizeState::Committed)?;
                self.commit(&snapshot, &created, revision.generation).await;
                return Ok(outcome(machine, assessment, Some(created), None));
            }
            Ok(None) => RemoteError::Rejected("report store returned no report".into()),
            Err(error) => error,
        };

        machine.advance(FinalizeState::Failed)?;
        tracing::warn!(%error, "report submission failed, draft kept");
        if let Err(refresh) =
            self.cache.refresh(&self.author.user_id, self.reports.as_ref()).await
        {
            tracing::warn!(error = %refresh, "report list refresh failed");
        }
        Ok(outcome(machine, assessment, None, Some(error)))
    }

    async fn is_duplicate(&self, snapshot: &ReportSnapshot) -> bool {
        let Some(window) = self.duplicate_window else {
            return false;
        };
        match self.reports.report_exists(snapshot, window).await {
            Ok(exists) => exists,
            Err(error) => {
                tracing::warn!(%error, "duplicate check failed, submitting anyway");
                false
            }
        }
    }

    async fn commit(&self, snapshot: &ReportSnapshot, created: &CreatedReport, generation: u64) {
        let user = &self.author.user_id;
        if self.store.clear_if(generation).is_some() {
            self.autosave.cancel();
            self.autosave.settled().await;

            if let Err(error) = self.drafts.delete_draft(user).await {
                tracing::warn!(%error, "draft delete failed, blanking remote copy");
                if let Err(error) = self.drafts.save_draft(user, &Draft::new()).await {
                    tracing::warn!(%error, "blanking remote draft failed");
                }
            }
        } else {
            tracing::warn!(report = %created.id, "draft edited during submission, keeping it");
        }

        self.cache
            .prepend(user, ReportSummary::from_created(created, snapshot))
            .await;
        tracing::info!(report = %created.id, score = %snapshot.score, "report committed");
    }
}

fn outcome(
    machine: GateMachine,
    assessment: Assessment,
    report: Option<CreatedReport>,
    error: Option<RemoteError>,
) -> FinalizeOutcome {
    FinalizeOutcome {
        state: machine.state(),
        assessment,
        report,
        error,
        trail: machine.trail().to_vec(),
    }
}
