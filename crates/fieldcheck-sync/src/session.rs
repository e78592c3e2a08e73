//! Draft session
//!
//! Wires the store, autosave scheduler, reconciler and finalizer for one
//! auditor and exposes them as a single handle. Opening a session hydrates
//! the draft from the remote copy and starts the background tasks; they stop
//! on [`DraftSession::shutdown`] or drop.

use crate::activity::ActivityTracker;
use crate::autosave::{AutosaveScheduler, SaveStatus};
use crate::cache::ReportCache;
use crate::config::SyncConfig;
use crate::error::{DraftError, RemoteError, SessionError};
use crate::finalize::{FinalizeOutcome, Finalizer};
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::remote::{DraftRemote, ReportRemote};
use crate::store::{DraftStore, Revision};
use fieldcheck_engine::{
    Assessment, ChecklistProgress, ChecklistStats, FinalizationGate, GlobalScore, MissingField,
    ScoringEngine, SectionPreview, SectionStatus, ValidationEngine,
};
use fieldcheck_model::{AnswerValue, Author, Catalog, Draft, ReportSummary, Role, UserId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Remote collaborators of a session
#[derive(Clone)]
pub struct Remotes {
    /// Draft mirror
    pub drafts: Arc<dyn DraftRemote>,
    /// Report store
    pub reports: Arc<dyn ReportRemote>,
}

impl Remotes {
    /// Separate draft and report stores
    #[must_use]
    pub fn new(drafts: Arc<dyn DraftRemote>, reports: Arc<dyn ReportRemote>) -> Self {
        Self { drafts, reports }
    }

    /// One backend serving both roles
    #[must_use]
    pub fn shared<R>(remote: Arc<R>) -> Self
    where
        R: DraftRemote + ReportRemote + 'static,
    {
        Self {
            drafts: Arc::clone(&remote) as Arc<dyn DraftRemote>,
            reports: remote,
        }
    }
}

/// Everything one auditor does with a draft
pub struct DraftSession {
    user: UserId,
    store: Arc<DraftStore>,
    autosave: AutosaveScheduler,
    reconciler: Reconciler,
    finalizer: Finalizer,
    drafts: Arc<dyn DraftRemote>,
    reports: Arc<dyn ReportRemote>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for DraftSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftSession")
            .field("user", &self.user)
            .field("generation", &self.store.generation())
            .field("autosave", &self.autosave)
            .finish_non_exhaustive()
    }
}

impl DraftSession {
    /// Hydrate the draft and start autosave and reconciliation
    ///
    /// A failed fetch starts from an empty draft; the reconciler picks up the
    /// remote copy once the auditor is idle.
    ///
    /// # Errors
    /// `SessionError::Config` when `config` does not validate.
    pub async fn open(
        catalog: Arc<Catalog>,
        remotes: Remotes,
        author: Author,
        site_name: impl Into<String>,
        config: SyncConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let user = author.user_id.clone();

        let draft = match remotes.drafts.fetch_draft(&user).await {
            Ok(Some(draft)) => {
                tracing::info!(user = %user, "draft hydrated from remote");
                draft
            }
            Ok(None) => {
                tracing::info!(user = %user, "no remote draft, starting empty");
                Draft::new()
            }
            Err(error) => {
                tracing::warn!(user = %user, %error, "draft fetch failed, starting empty");
                Draft::new()
            }
        };

        let store = Arc::new(DraftStore::new(
            Arc::clone(&catalog),
            Arc::new(ActivityTracker::new()),
            &config,
            draft,
        ));
        let autosave = AutosaveScheduler::new(
            Arc::clone(&store),
            Arc::clone(&remotes.drafts),
            user.clone(),
            &config,
        );
        let reconciler = Reconciler::new(
            Arc::clone(&store),
            Arc::clone(&remotes.drafts),
            autosave.clone(),
            user.clone(),
            &config,
        );

        let gate = FinalizationGate::from_engines(
            ValidationEngine::new(Arc::clone(&catalog))
                .with_signature_roles(config.signature_roles.clone()),
            ScoringEngine::new(catalog),
        );
        let finalizer = Finalizer::new(
            gate,
            Arc::clone(&store),
            autosave.clone(),
            Arc::clone(&remotes.drafts),
            Arc::clone(&remotes.reports),
            ReportCache::with_ttl(64, config.report_cache_ttl()),
            author,
            site_name.into(),
        )
        .with_duplicate_guard(config.duplicate_guard.then(|| config.duplicate_window()));

        let tasks = vec![autosave.spawn_driver(), reconciler.clone().spawn()];

        Ok(Self {
            user,
            store,
            autosave,
            reconciler,
            finalizer,
            drafts: remotes.drafts,
            reports: remotes.reports,
            tasks: Mutex::new(tasks),
        })
    }

    // ---- observation ----

    /// Owning user
    #[inline]
    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<DraftStore> {
        &self.store
    }

    /// Current draft
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.store.snapshot()
    }

    /// Observe draft revisions
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.store.subscribe()
    }

    /// Observe the autosave indicator
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.autosave.subscribe_status()
    }

    /// Current autosave indicator
    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        self.autosave.status()
    }

    // ---- mutators ----

    /// See [`DraftStore::set_answer`]
    pub fn set_answer(
        &self,
        checklist: &str,
        item: &str,
        value: impl Into<AnswerValue>,
    ) -> Result<u64, DraftError> {
        self.store.set_answer(checklist, item, value.into())
    }

    /// See [`DraftStore::add_image`]
    pub fn add_image(
        &self,
        checklist: &str,
        section: &str,
        image: impl Into<String>,
    ) -> Result<usize, DraftError> {
        self.store.add_image(checklist, section, image.into())
    }

    /// See [`DraftStore::remove_image`]
    pub fn remove_image(
        &self,
        checklist: &str,
        section: &str,
        index: usize,
    ) -> Result<Option<String>, DraftError> {
        self.store.remove_image(checklist, section, index)
    }

    /// See [`DraftStore::set_signature`]
    pub fn set_signature(&self, role: Role, image: impl Into<String>) -> Result<u64, DraftError> {
        self.store.set_signature(role, image.into())
    }

    /// See [`DraftStore::toggle_ignored`]
    pub fn toggle_ignored(&self, checklist: &str) -> Result<bool, DraftError> {
        self.store.toggle_ignored(checklist)
    }

    // ---- queries ----

    fn validation(&self) -> &ValidationEngine {
        self.finalizer.gate().validation()
    }

    fn scoring(&self) -> &ScoringEngine {
        self.finalizer.gate().scoring()
    }

    /// See [`ValidationEngine::section_status`]
    #[must_use]
    pub fn section_status(&self, checklist: &str, section: &str) -> Option<SectionStatus> {
        self.validation().section_status(checklist, section, &self.draft())
    }

    /// See [`ScoringEngine::section_preview`]
    #[must_use]
    pub fn section_preview(&self, checklist: &str, section: &str) -> Option<SectionPreview> {
        self.scoring().section_preview(checklist, section, &self.draft())
    }

    /// See [`ValidationEngine::is_checklist_complete`]
    #[must_use]
    pub fn is_checklist_complete(&self, checklist: &str) -> bool {
        self.validation().is_checklist_complete(checklist, &self.draft())
    }

    /// See [`ValidationEngine::missing_fields`]
    #[must_use]
    pub fn missing_fields(&self, checklist: &str) -> Vec<MissingField> {
        self.validation().missing_fields(checklist, &self.draft())
    }

    /// See [`ValidationEngine::completion`]
    #[must_use]
    pub fn completion(&self, checklist: &str) -> Option<ChecklistProgress> {
        self.validation().completion(checklist, &self.draft())
    }

    /// See [`ScoringEngine::checklist_stats`]
    #[must_use]
    pub fn checklist_stats(&self, checklist: &str) -> ChecklistStats {
        self.scoring().checklist_stats(checklist, &self.draft())
    }

    /// See [`ScoringEngine::global_score`]
    #[must_use]
    pub fn global_score(&self) -> GlobalScore {
        self.scoring().global_score(&self.draft())
    }

    /// Draft-only finalize verdict, without submitting
    #[must_use]
    pub fn assess(&self) -> Assessment {
        self.finalizer.gate().assess(&self.draft())
    }

    // ---- lifecycle ----

    /// See [`Finalizer::finalize`]
    ///
    /// # Errors
    /// `SessionError::Gate` if the finalize state machine is misused.
    pub async fn finalize(&self) -> Result<FinalizeOutcome, SessionError> {
        Ok(self.finalizer.finalize().await?)
    }

    /// Discard the draft locally and remotely
    pub async fn reset(&self) {
        self.store.clear();
        self.autosave.cancel();
        self.autosave.settled().await;

        if let Err(error) = self.drafts.delete_draft(&self.user).await {
            tracing::warn!(%error, "remote draft delete failed on reset");
        }
        tracing::info!(user = %self.user, "draft reset");
    }

    /// Write pending local edits now
    ///
    /// # Errors
    /// The remote's error when the write fails.
    pub async fn flush(&self) -> Result<bool, RemoteError> {
        self.autosave.flush().await
    }

    /// Run one reconcile step outside the timer
    pub async fn reconcile_now(&self) -> ReconcileOutcome {
        self.reconciler.tick().await
    }

    /// Report history, from cache or the report store
    pub async fn cached_reports(&self) -> Vec<ReportSummary> {
        let cache = self.finalizer.cache();
        if let Some(reports) = cache.get(&self.user).await {
            return reports;
        }
        match cache.refresh(&self.user, self.reports.as_ref()).await {
            Ok(reports) => reports,
            Err(error) => {
                tracing::warn!(%error, "report list unavailable");
                Vec::new()
            }
        }
    }

    /// Stop background tasks; pending unsaved edits stay local
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.autosave.shutdown();
        tracing::debug!(user = %self.user, "session stopped");
    }
}

impl Drop for DraftSession {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
        self.autosave.shutdown();
    }
}
