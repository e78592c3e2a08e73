//! Idle-Triggered Reconciler
//!
//! Pulls the remote draft on a fixed period and overwrites the local one,
//! but only when the auditor has been idle long enough and no autosave is
//! writing. Local edits always win while the auditor is active.

use crate::autosave::AutosaveScheduler;
use crate::config::SyncConfig;
use crate::remote::DraftRemote;
use crate::store::DraftStore;
use fieldcheck_model::UserId;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Why a tick left the draft alone without asking the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Autosave write in flight
    WriteInFlight,
    /// Auditor active within the timeout
    Active {
        /// Time since the last local mutation
        elapsed: Duration,
    },
    /// Remote holds no draft
    NoRemoteCopy,
    /// Local mutation landed while fetching
    LocalChange,
}

/// Result of one reconcile tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileOutcome {
    /// Nothing fetched or applied
    Skipped(SkipReason),
    /// Remote equals local
    Unchanged,
    /// Remote snapshot applied at `generation`
    Applied { generation: u64 },
    /// Fetch failed; local state kept
    Failed,
}

/// Periodic remote-to-local sync
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<DraftStore>,
    remote: Arc<dyn DraftRemote>,
    autosave: AutosaveScheduler,
    user: UserId,
    interval: Duration,
    activity_timeout: Duration,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("user", &self.user)
            .field("interval", &self.interval)
            .field("activity_timeout", &self.activity_timeout)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create reconciler
    #[must_use]
    pub fn new(
        store: Arc<DraftStore>,
        remote: Arc<dyn DraftRemote>,
        autosave: AutosaveScheduler,
        user: UserId,
        config: &SyncConfig,
    ) -> Self {
        Self {
            store,
            remote,
            autosave,
            user,
            interval: config.reconcile_interval(),
            activity_timeout: config.activity_timeout(),
        }
    }

    /// Run one reconcile step
    pub async fn tick(&self) -> ReconcileOutcome {
        if self.autosave.is_writing() {
            return ReconcileOutcome::Skipped(SkipReason::WriteInFlight);
        }

        let elapsed = self.store.activity().elapsed();
        if elapsed < self.activity_timeout {
            return ReconcileOutcome::Skipped(SkipReason::Active { elapsed });
        }

        let generation = self.store.generation();
        let remote = match self.remote.fetch_draft(&self.user).await {
            Ok(Some(draft)) => draft,
            Ok(None) => return ReconcileOutcome::Skipped(SkipReason::NoRemoteCopy),
            Err(error) => {
                tracing::warn!(%error, retryable = error.is_retryable(), "reconcile fetch failed");
                return ReconcileOutcome::Failed;
            }
        };

        if self.autosave.is_writing() {
            return ReconcileOutcome::Skipped(SkipReason::WriteInFlight);
        }

        if remote == self.store.snapshot() {
            return ReconcileOutcome::Unchanged;
        }

        match self.store.replace_all_if(generation, remote) {
            Some(generation) => {
                tracing::info!(generation, "remote draft applied");
                ReconcileOutcome::Applied { generation }
            }
            None => ReconcileOutcome::Skipped(SkipReason::LocalChange),
        }
    }

    /// Tick every interval until aborted
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let outcome = self.tick().await;
                tracing::trace!(?outcome, "reconcile tick");
            }
        })
    }
}
