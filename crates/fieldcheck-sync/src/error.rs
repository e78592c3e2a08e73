//! Error types for draft synchronization
//!
//! - [`DraftError`]: a mutator refused its input; the draft is unchanged
//! - [`RemoteError`]: the remote store failed or refused a call
//! - [`ConfigError`]: configuration could not be parsed or is out of range
//! - [`SessionError`]: anything that aborts a session-level operation

use fieldcheck_engine::GateError;
use fieldcheck_model::{ChecklistId, ItemId, Role, SectionId};

/// Rejected draft mutation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    /// Checklist not in the catalog
    #[error("unknown checklist: {0}")]
    UnknownChecklist(ChecklistId),

    /// Section not in the checklist
    #[error("unknown section {section} in checklist {checklist}")]
    UnknownSection {
        checklist: ChecklistId,
        section: SectionId,
    },

    /// Item not in the checklist
    #[error("unknown item {item} in checklist {checklist}")]
    UnknownItem { checklist: ChecklistId, item: ItemId },

    /// Role not configured to sign
    #[error("unknown signature role: {0}")]
    UnknownRole(Role),

    /// Value does not fit the item's kind
    #[error("invalid answer for {item}: {reason}")]
    InvalidAnswer { item: ItemId, reason: String },

    /// Section already holds the maximum number of images
    #[error("section {section} already holds {limit} images")]
    AttachmentLimit { section: SectionId, limit: usize },
}

impl DraftError {
    /// Error caused by what the auditor entered, not by the caller wiring
    #[inline]
    #[must_use]
    pub fn is_user_recoverable(&self) -> bool {
        matches!(self, Self::InvalidAnswer { .. } | Self::AttachmentLimit { .. })
    }
}

/// Remote store failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Network or service unavailable
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// Remote refused the request
    #[error("remote rejected request: {0}")]
    Rejected(String),

    /// Payload could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Call did not finish in time
    #[error("remote call timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl RemoteError {
    /// Check if the same call may succeed later
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Session-level failures
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Finalize state machine misuse
    #[error("finalize error: {0}")]
    Gate(#[from] GateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_remote_errors() {
        assert!(RemoteError::Unavailable("offline".into()).is_retryable());
        assert!(RemoteError::Timeout { duration_ms: 30_000 }.is_retryable());
        assert!(!RemoteError::Rejected("constraint".into()).is_retryable());
        assert!(!RemoteError::Serialization("bad json".into()).is_retryable());
    }

    #[test]
    fn user_recoverable_draft_errors() {
        let limit = DraftError::AttachmentLimit { section: "pop".into(), limit: 2 };
        assert!(limit.is_user_recoverable());
        assert_eq!(limit.to_string(), "section pop already holds 2 images");
        assert!(!DraftError::UnknownChecklist("x".into()).is_user_recoverable());
    }
}
