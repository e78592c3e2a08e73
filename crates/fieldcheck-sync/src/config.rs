//! Synchronization configuration
//!
//! ```toml
//! debounce_ms = 1000
//! reconcile_interval_ms = 3000
//! activity_timeout_ms = 5000
//! global_fields = ["company", "branch"]
//! ```
//!
//! Missing keys take their defaults.

use crate::error::ConfigError;
use fieldcheck_model::{ItemId, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timers, limits and field policy of a draft session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Autosave debounce after the last mutation
    pub debounce_ms: u64,
    /// Period of the idle reconciler
    pub reconcile_interval_ms: u64,
    /// Idle time required before a remote snapshot may overwrite the draft
    pub activity_timeout_ms: u64,
    /// How long the `Saved` status stays visible
    pub saved_display_ms: u64,
    /// Image cap per section
    pub max_images_per_section: usize,
    /// Items whose value is mirrored into every checklist
    pub global_fields: Vec<ItemId>,
    /// Signatures every checklist requires, in prompt order
    pub signature_roles: Vec<Role>,
    /// Refuse a report identical to one filed within the window
    pub duplicate_guard: bool,
    /// Duplicate guard window in seconds
    pub duplicate_window_secs: u64,
    /// TTL of the cached report listing
    pub report_cache_ttl_secs: u64,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML and validate
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML, `ConfigError::Invalid` on
    /// out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or disable the session
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("debounce_ms", self.debounce_ms),
            ("reconcile_interval_ms", self.reconcile_interval_ms),
            ("activity_timeout_ms", self.activity_timeout_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".into(),
                });
            }
        }

        if self.max_images_per_section == 0 {
            return Err(ConfigError::Invalid {
                field: "max_images_per_section",
                reason: "must allow at least one image".into(),
            });
        }

        if self.duplicate_guard && self.duplicate_window_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "duplicate_window_secs",
                reason: "must be greater than zero when duplicate_guard is on".into(),
            });
        }

        if self.signature_roles.iter().any(|r| r.as_str().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "signature_roles",
                reason: "role names must not be empty".into(),
            });
        }

        Ok(())
    }

    /// With debounce
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = millis(debounce);
        self
    }

    /// With reconcile interval
    #[inline]
    #[must_use]
    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval_ms = millis(interval);
        self
    }

    /// With activity timeout
    #[inline]
    #[must_use]
    pub fn with_activity_timeout(mut self, timeout: Duration) -> Self {
        self.activity_timeout_ms = millis(timeout);
        self
    }

    /// With image cap
    #[inline]
    #[must_use]
    pub fn with_max_images(mut self, max: usize) -> Self {
        self.max_images_per_section = max;
        self
    }

    /// With global fields
    #[must_use]
    pub fn with_global_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ItemId>,
    {
        self.global_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// With duplicate guard on or off
    #[inline]
    #[must_use]
    pub fn with_duplicate_guard(mut self, enabled: bool) -> Self {
        self.duplicate_guard = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[inline]
    #[must_use]
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms)
    }

    #[inline]
    #[must_use]
    pub fn activity_timeout(&self) -> Duration {
        Duration::from_millis(self.activity_timeout_ms)
    }

    #[inline]
    #[must_use]
    pub fn saved_display(&self) -> Duration {
        Duration::from_millis(self.saved_display_ms)
    }

    #[inline]
    #[must_use]
    pub fn duplicate_window(&self) -> Duration {
        Duration::from_secs(self.duplicate_window_secs)
    }

    #[inline]
    #[must_use]
    pub fn report_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.report_cache_ttl_secs)
    }

    /// Whether an item is mirrored across checklists
    #[must_use]
    pub fn is_global_field(&self, item: &str) -> bool {
        self.global_fields.iter().any(|f| f.as_str() == item)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            reconcile_interval_ms: 3000,
            activity_timeout_ms: 5000,
            saved_display_ms: 2000,
            max_images_per_section: 2,
            global_fields: [
                "company",
                "branch",
                "area",
                "manager",
                "coordinator_name",
                "application_date",
            ]
            .into_iter()
            .map(ItemId::from)
            .collect(),
            signature_roles: vec![Role::manager(), Role::coordinator()],
            duplicate_guard: true,
            duplicate_window_secs: 300,
            report_cache_ttl_secs: 600,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_timings() {
        let config = SyncConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(1000));
        assert_eq!(config.reconcile_interval(), Duration::from_millis(3000));
        assert_eq!(config.activity_timeout(), Duration::from_millis(5000));
        assert_eq!(config.max_images_per_section, 2);
        assert!(config.is_global_field("branch"));
        assert!(!config.is_global_field("pop_1"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = SyncConfig::from_toml_str(
            r#"
            debounce_ms = 250
            global_fields = ["filial"]
            "#,
        )
        .unwrap();

        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.global_fields, vec![ItemId::from("filial")]);
        assert_eq!(config.activity_timeout_ms, 5000);
        assert_eq!(config.signature_roles, vec![Role::manager(), Role::coordinator()]);
    }

    #[test]
    fn rejects_zero_intervals() {
        let err = SyncConfig::from_toml_str("reconcile_interval_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "reconcile_interval_ms", .. }
        ));

        let err = SyncConfig::new().with_max_images(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_images_per_section", .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            SyncConfig::from_toml_str("debounce_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn builders_round_trip_durations() {
        let config = SyncConfig::new()
            .with_debounce(Duration::from_millis(10))
            .with_reconcile_interval(Duration::from_secs(1))
            .with_activity_timeout(Duration::from_secs(2))
            .with_duplicate_guard(false);

        assert_eq!(config.debounce_ms, 10);
        assert_eq!(config.reconcile_interval_ms, 1000);
        assert_eq!(config.activity_timeout_ms, 2000);
        assert!(!config.duplicate_guard);
    }
}
