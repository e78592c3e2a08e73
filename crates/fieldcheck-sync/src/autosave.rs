//! Autosave Scheduler
//!
//! Debounced writes of the draft to the remote mirror.
//!
//! - Every local revision restarts the debounce timer. A timer remembers the
//!   generation it was armed for and does nothing if the store has moved on.
//! - One write at a time. A timer that fires during a write is dropped and
//!   marks the scheduler dirty; when the write settles, a fresh debounce is
//!   armed if the store holds local edits newer than what was written.
//! - A cleared draft cancels the pending timer.
//!
//! Status (`Idle -> Saving -> Saved -> Idle`) is published for display only.

use crate::config::SyncConfig;
use crate::error::RemoteError;
use crate::remote::DraftRemote;
use crate::store::{DraftStore, RevisionOrigin};
use fieldcheck_model::UserId;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// Autosave indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SaveStatus {
    /// Nothing happening
    Idle,
    /// Write in flight
    Saving,
    /// Last write succeeded
    Saved,
}

/// Debounced remote writer
///
/// Cheap to clone; clones share the same timer and in-flight guard.
#[derive(Clone)]
pub struct AutosaveScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<DraftStore>,
    remote: Arc<dyn DraftRemote>,
    user: UserId,
    debounce: Duration,
    saved_display: Duration,
    in_flight: AtomicBool,
    dirty: AtomicBool,
    written: AtomicU64,
    writes: AtomicU64,
    settled: Notify,
    pending: Mutex<Option<JoinHandle<()>>>,
    status: watch::Sender<SaveStatus>,
}

impl std::fmt::Debug for AutosaveScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosaveScheduler")
            .field("user", &self.inner.user)
            .field("debounce", &self.inner.debounce)
            .field("in_flight", &self.is_writing())
            .field("written", &self.written_generation())
            .finish_non_exhaustive()
    }
}

impl AutosaveScheduler {
    /// Create scheduler; the store's current generation counts as written
    #[must_use]
    pub fn new(
        store: Arc<DraftStore>,
        remote: Arc<dyn DraftRemote>,
        user: UserId,
        config: &SyncConfig,
    ) -> Self {
        let written = store.generation();
        let (status, _) = watch::channel(SaveStatus::Idle);

        Self {
            inner: Arc::new(Inner {
                store,
                remote,
                user,
                debounce: config.debounce(),
                saved_display: config.saved_display(),
                in_flight: AtomicBool::new(false),
                dirty: AtomicBool::new(false),
                written: AtomicU64::new(written),
                writes: AtomicU64::new(0),
                settled: Notify::new(),
                pending: Mutex::new(None),
                status,
            }),
        }
    }

    /// Observe the save indicator
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status.subscribe()
    }

    /// Current save indicator
    #[must_use]
    pub fn status(&self) -> SaveStatus {
        *self.inner.status.borrow()
    }

    /// True while a write is in flight
    #[inline]
    #[must_use]
    pub fn is_writing(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Generation of the last successful write
    #[inline]
    #[must_use]
    pub fn written_generation(&self) -> u64 {
        self.inner.written.load(Ordering::Acquire)
    }

    /// Restart the debounce timer for the store's current generation
    pub fn schedule(&self) {
        let generation = self.inner.store.generation();
        let inner = Arc::clone(&self.inner);
        let debounce = self.inner.debounce;

        // only the sleep is abortable; a write, once started, runs to completion
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            tokio::spawn(async move { Inner::fire(&inner, generation).await });
        });

        if let Some(previous) = self.inner.pending.lock().replace(handle) {
            previous.abort();
        }
        tracing::trace!(generation, "autosave armed");
    }

    /// Drop the pending timer, if any
    pub fn cancel(&self) {
        self.inner.dirty.store(false, Ordering::Release);
        if let Some(previous) = self.inner.pending.lock().take() {
            previous.abort();
            tracing::debug!("autosave cancelled");
        }
    }

    /// Wait until no write is in flight
    pub async fn settled(&self) {
        loop {
            let notified = self.inner.settled.notified();
            if !self.is_writing() {
                return;
            }
            notified.await;
        }
    }

    /// Write the current local revision now
    ///
    /// Cancels the pending timer and waits for an in-flight write first.
    /// Returns `Ok(false)` when there is nothing newer to write.
    ///
    /// # Errors
    /// The remote's error when the write fails.
    pub async fn flush(&self) -> Result<bool, RemoteError> {
        loop {
            self.cancel();
            self.settled().await;

            let revision = self.inner.store.revision();
            if revision.origin != RevisionOrigin::Local
                || revision.generation <= self.written_generation()
            {
                return Ok(false);
            }

            if self
                .inner
                .in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Inner::write(&self.inner).await.map(|()| true);
            }
        }
    }

    /// Follow store revisions; abort the returned handle to stop
    ///
    /// Local revisions arm the timer; cleared revisions cancel it.
    #[must_use]
    pub fn spawn_driver(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        let mut revisions = self.inner.store.subscribe();
        revisions.borrow_and_update();

        tokio::spawn(async move {
            while revisions.changed().await.is_ok() {
                let origin = revisions.borrow_and_update().origin;
                match origin {
                    RevisionOrigin::Local => scheduler.schedule(),
                    RevisionOrigin::Cleared => scheduler.cancel(),
                    RevisionOrigin::Remote => {}
                }
            }
        })
    }

    /// Abort the pending timer
    pub fn shutdown(&self) {
        if let Some(pending) = self.inner.pending.lock().take() {
            pending.abort();
        }
    }
}

impl Inner {
    async fn fire(inner: &Arc<Self>, generation: u64) {
        let current = inner.store.generation();
        if current != generation {
            tracing::trace!(generation, current, "stale autosave timer");
            return;
        }
        if generation <= inner.written.load(Ordering::Acquire) {
            tracing::trace!(generation, "already written");
            return;
        }

        if inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            inner.dirty.store(true, Ordering::Release);
            tracing::debug!(generation, "autosave dropped, write in flight");
            return;
        }

        if let Err(error) = Self::write(inner).await {
            tracing::warn!(%error, retryable = error.is_retryable(), "autosave failed");
        }
    }

    /// Caller holds the in-flight flag; released here
    async fn write(inner: &Arc<Self>) -> Result<(), RemoteError> {
        let revision = inner.store.revision();
        let write_id = inner.writes.fetch_add(1, Ordering::AcqRel) + 1;
        inner.status.send_replace(SaveStatus::Saving);
        tracing::debug!(generation = revision.generation, "autosave writing");

        let result = inner.remote.save_draft(&inner.user, &revision.draft).await;

        match &result {
            Ok(()) => {
                inner.written.fetch_max(revision.generation, Ordering::AcqRel);
                inner.status.send_replace(SaveStatus::Saved);
                Self::reset_status_later(inner, write_id);
            }
            Err(_) => {
                inner.status.send_replace(SaveStatus::Idle);
            }
        }

        inner.in_flight.store(false, Ordering::Release);
        inner.settled.notify_waiters();

        if inner.dirty.swap(false, Ordering::AcqRel) {
            let latest = inner.store.revision();
            if latest.origin == RevisionOrigin::Local && latest.generation > revision.generation {
                tracing::debug!(generation = latest.generation, "re-arming dropped autosave");
                AutosaveScheduler { inner: Arc::clone(inner) }.schedule();
            }
        }

        result
    }

    fn reset_status_later(inner: &Arc<Self>, write_id: u64) {
        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.saved_display).await;
            if inner.writes.load(Ordering::Acquire) == write_id {
                inner.status.send_if_modified(|status| {
                    if *status == SaveStatus::Saved {
                        *status = SaveStatus::Idle;
                        true
                    } else {
                        false
                    }
                });
            }
        });
    }
}
