//! Remote store interfaces
//!
//! The core never talks to a database directly. A deployment supplies one
//! implementation of each trait (usually the same type for both).

use crate::error::RemoteError;
use async_trait::async_trait;
use fieldcheck_model::{CreatedReport, Draft, ReportSnapshot, ReportSummary, UserId};
use std::time::Duration;

/// Remote mirror of the in-progress draft
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DraftRemote: Send + Sync {
    /// Stored draft of a user; `None` when there is no copy
    async fn fetch_draft(&self, user: &UserId) -> Result<Option<Draft>, RemoteError>;

    /// Upsert the user's draft
    async fn save_draft(&self, user: &UserId, draft: &Draft) -> Result<(), RemoteError>;

    /// Remove the user's draft
    async fn delete_draft(&self, user: &UserId) -> Result<(), RemoteError>;
}

/// Permanent report storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRemote: Send + Sync {
    /// Store a report; `Ok(None)` means the store declined without an error
    async fn create_report(
        &self,
        snapshot: &ReportSnapshot,
    ) -> Result<Option<CreatedReport>, RemoteError>;

    /// Reports filed by a user, newest first
    async fn list_reports(&self, user: &UserId) -> Result<Vec<ReportSummary>, RemoteError>;

    /// Whether an identical report (same author, site and score) was filed
    /// within `window`
    async fn report_exists(
        &self,
        _snapshot: &ReportSnapshot,
        _window: Duration,
    ) -> Result<bool, RemoteError> {
        Ok(false)
    }
}
