//! Testing utilities for the fieldcheck workspace
//!
//! Shared fixtures, an in-memory remote and tracing setup.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::Utc;
use fieldcheck_model::{
    Author, Catalog, CreatedReport, Draft, PassFail, ReportSnapshot, ReportSummary, Role, UserId,
};
use fieldcheck_sync::{DraftRemote, DraftSession, RemoteError, Remotes, ReportRemote, SyncConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SAMPLE_CATALOG_YAML: &str = include_str!("../fixtures/checklists.yaml");

pub const USER: &str = "auditor-1";

pub fn sample_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_yaml_str(SAMPLE_CATALOG_YAML).unwrap())
}

pub fn author() -> Author {
    Author::new(USER, "Ana Souza")
}

pub fn user() -> UserId {
    UserId::from(USER)
}

/// Log to the test writer; `RUST_LOG` controls the filter
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn open_session(remote: &Arc<InMemoryRemote>, config: SyncConfig) -> DraftSession {
    DraftSession::open(
        sample_catalog(),
        Remotes::shared(Arc::clone(remote)),
        author(),
        "Filial Centro",
        config,
    )
    .await
    .unwrap()
}

/// Fill the shared basic-info fields (mirrored into every checklist)
pub fn fill_basic_info(session: &DraftSession) {
    session.set_answer("gerencial", "coordinator_name", "Carlos").unwrap();
    session.set_answer("gerencial", "branch", "Centro").unwrap();
    session.set_answer("gerencial", "manager", "Beatriz").unwrap();
    session.set_answer("gerencial", "application_date", "2026-03-01").unwrap();
}

pub fn sign(session: &DraftSession) {
    session.set_signature(Role::manager(), "data:image/png;base64,bWFuYWdlcg==").unwrap();
    session.set_signature(Role::coordinator(), "data:image/png;base64,Y29vcmQ=").unwrap();
}

/// Answer every pass/fail item of a checklist
pub fn answer_all(session: &DraftSession, checklist: &str, value: PassFail) {
    let catalog = sample_catalog();
    let definition = catalog.get(checklist).unwrap();
    for item in definition.items().filter(|i| i.kind.is_scored()) {
        session.set_answer(checklist, item.id.as_str(), value).unwrap();
    }
}

#[derive(Debug, Default)]
struct RemoteState {
    drafts: HashMap<UserId, Draft>,
    reports: Vec<(ReportSnapshot, CreatedReport)>,
    saved: Vec<Draft>,
}

/// Draft and report store kept in memory
///
/// Counts every call and can be told to fail, decline or slow down.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<RemoteState>,
    save_latency: Mutex<Duration>,
    pub fetch_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub exists_calls: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub fail_save: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_create: AtomicBool,
    pub decline_create: AtomicBool,
}

impl InMemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Remote already holding a draft for `user`
    pub fn with_draft(user: &UserId, draft: Draft) -> Arc<Self> {
        let remote = Self::new();
        remote.put_draft(user, draft);
        remote
    }

    /// Simulate another device writing the draft
    pub fn put_draft(&self, user: &UserId, draft: Draft) {
        self.state.lock().drafts.insert(user.clone(), draft);
    }

    pub fn draft(&self, user: &UserId) -> Option<Draft> {
        self.state.lock().drafts.get(user).cloned()
    }

    /// Every draft written through `save_draft`, oldest first
    pub fn saved_drafts(&self) -> Vec<Draft> {
        self.state.lock().saved.clone()
    }

    pub fn reports(&self) -> Vec<ReportSnapshot> {
        self.state.lock().reports.iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn set_save_latency(&self, latency: Duration) {
        *self.save_latency.lock() = latency;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), RemoteError> {
        if flag.load(Ordering::SeqCst) {
            Err(RemoteError::Unavailable(format!("{what} failure injected")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DraftRemote for InMemoryRemote {
    async fn fetch_draft(&self, user: &UserId) -> Result<Option<Draft>, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_fetch, "fetch")?;
        Ok(self.draft(user))
    }

    async fn save_draft(&self, user: &UserId, draft: &Draft) -> Result<(), RemoteError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.save_latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Self::check(&self.fail_save, "save")?;

        let mut state = self.state.lock();
        state.drafts.insert(user.clone(), draft.clone());
        state.saved.push(draft.clone());
        Ok(())
    }

    async fn delete_draft(&self, user: &UserId) -> Result<(), RemoteError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_delete, "delete")?;
        self.state.lock().drafts.remove(user);
        Ok(())
    }
}

#[async_trait]
impl ReportRemote for InMemoryRemote {
    async fn create_report(
        &self,
        snapshot: &ReportSnapshot,
    ) -> Result<Option<CreatedReport>, RemoteError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_create, "create")?;
        if self.decline_create.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let created = CreatedReport {
            id: uuid::Uuid::new_v4().to_string().into(),
            created_at: Utc::now(),
        };
        self.state.lock().reports.push((snapshot.clone(), created.clone()));
        Ok(Some(created))
    }

    async fn list_reports(&self, user: &UserId) -> Result<Vec<ReportSummary>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        Ok(state
            .reports
            .iter()
            .rev()
            .filter(|(snapshot, _)| &snapshot.author.user_id == user)
            .map(|(snapshot, created)| ReportSummary::from_created(created, snapshot))
            .collect())
    }

    async fn report_exists(
        &self,
        snapshot: &ReportSnapshot,
        window: Duration,
    ) -> Result<bool, RemoteError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        let window = chrono::Duration::from_std(window)
            .map_err(|e| RemoteError::Serialization(e.to_string()))?;
        let since = Utc::now() - window;

        Ok(self.state.lock().reports.iter().any(|(existing, created)| {
            existing.author.user_id == snapshot.author.user_id
                && existing.site_name == snapshot.site_name
                && existing.score == snapshot.score
                && created.created_at >= since
        }))
    }
}
