//! Report listing cache using moka
//!
//! Holds each user's report history so a failed finalize can still show
//! what the store already has, and a successful one can show the new report
//! without another round trip.

use crate::error::RemoteError;
use crate::remote::ReportRemote;
use fieldcheck_model::{ReportSummary, UserId};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Per-user report listings with a TTL
#[derive(Debug, Clone)]
pub struct ReportCache {
    inner: Cache<UserId, Arc<Vec<ReportSummary>>>,
}

impl ReportCache {
    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_users: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(max_users).time_to_live(ttl).build(),
        }
    }

    /// Cached listing, newest first
    pub async fn get(&self, user: &UserId) -> Option<Vec<ReportSummary>> {
        self.inner.get(user).await.map(|list| list.as_ref().clone())
    }

    /// Replace a user's listing
    #[inline]
    pub async fn insert(&self, user: UserId, reports: Vec<ReportSummary>) {
        self.inner.insert(user, Arc::new(reports)).await;
    }

    /// Put a new report at the head of the user's listing
    pub async fn prepend(&self, user: &UserId, summary: ReportSummary) {
        let mut reports = self.get(user).await.unwrap_or_default();
        reports.retain(|r| r.id != summary.id);
        reports.insert(0, summary);
        self.insert(user.clone(), reports).await;
    }

    /// Reload a user's listing from the report store
    ///
    /// # Errors
    /// The remote's error; the cached listing is left as it was.
    pub async fn refresh(
        &self,
        user: &UserId,
        remote: &dyn ReportRemote,
    ) -> Result<Vec<ReportSummary>, RemoteError> {
        let reports = remote.list_reports(user).await?;
        self.insert(user.clone(), reports.clone()).await;
        Ok(reports)
    }
}

impl Default for ReportCache {
    /// 64 users, 10 minute TTL
    fn default() -> Self {
        Self::with_ttl(64, Duration::from_secs(600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockReportRemote;
    use chrono::{TimeZone, Utc};
    use fieldcheck_model::Author;
    use pretty_assertions::assert_eq;

    fn summary(id: &str) -> ReportSummary {
        ReportSummary {
            id: id.into(),
            author: Author::new("u1", "Ana"),
            site_name: "Centro".into(),
            score: "4.0".into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn prepend_puts_newest_first() {
        let cache = ReportCache::default();
        let user = UserId::from("u1");
        cache.insert(user.clone(), vec![summary("r1")]).await;

        cache.prepend(&user, summary("r2")).await;
        let ids: Vec<_> = cache.get(&user).await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r2".into(), "r1".into()]);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_previous_listing() {
        let cache = ReportCache::default();
        let user = UserId::from("u1");
        cache.insert(user.clone(), vec![summary("r1")]).await;

        let mut remote = MockReportRemote::new();
        remote
            .expect_list_reports()
            .times(1)
            .returning(|_| Err(RemoteError::Unavailable("offline".into())));

        assert!(cache.refresh(&user, &remote).await.is_err());
        assert_eq!(cache.get(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refresh_replaces_listing() {
        let cache = ReportCache::default();
        let user = UserId::from("u1");

        let mut remote = MockReportRemote::new();
        remote
            .expect_list_reports()
            .returning(|_| Ok(vec![summary("r9"), summary("r8")]));

        let reports = cache.refresh(&user, &remote).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(cache.get(&user).await, Some(reports));
    }
}
