//! Immutable report payloads handed to the report store

use crate::draft::{AnswerSet, AttachmentSet, Draft, SignatureSet};
use crate::ids::{ChecklistId, ReportId, UserId};
use chrono::{DateTime, Utc};
use im::{OrdMap, OrdSet};
use serde::{Deserialize, Serialize};

/// Who filed a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Owning user
    pub user_id: UserId,
    /// Display name
    pub name: String,
}

impl Author {
    /// Create author
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
        }
    }
}

/// Frozen copy of a complete draft plus its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    /// Filing auditor
    pub author: Author,
    /// Audited site (pharmacy/branch display name)
    pub site_name: String,
    /// Global score, one decimal
    pub score: String,
    /// Answers per checklist
    pub answers: OrdMap<ChecklistId, AnswerSet>,
    /// Attachments per checklist
    pub attachments: OrdMap<ChecklistId, AttachmentSet>,
    /// Global signatures
    pub signatures: SignatureSet,
    /// Checklists excluded from the report
    pub ignored: OrdSet<ChecklistId>,
}

impl ReportSnapshot {
    /// Capture a draft
    ///
    /// The snapshot owns its own maps; later draft edits never reach it.
    #[must_use]
    pub fn capture(
        author: Author,
        site_name: impl Into<String>,
        score: impl Into<String>,
        draft: &Draft,
    ) -> Self {
        Self {
            author,
            site_name: site_name.into(),
            score: score.into(),
            answers: draft.answers().clone(),
            attachments: draft.attachments().clone(),
            signatures: draft.signatures().clone(),
            ignored: draft.ignored().clone(),
        }
    }

    /// Rebuild a read-only draft view (history screens, rescoring)
    #[must_use]
    pub fn to_draft(&self) -> Draft {
        let mut draft = Draft::new();
        for (checklist, answers) in &self.answers {
            for (item, value) in answers {
                draft.set_answer(checklist.clone(), item.clone(), value.clone());
            }
        }
        for (checklist, sections) in &self.attachments {
            for (section, images) in sections {
                for image in images {
                    draft.push_image(checklist.clone(), section.clone(), image.clone());
                }
            }
        }
        for (role, signature) in &self.signatures {
            draft.set_signature(role.clone(), signature.clone());
        }
        for checklist in &self.ignored {
            draft.toggle_ignored(checklist.clone());
        }
        draft
    }
}

/// Acknowledgement of a created report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedReport {
    /// Store-assigned id
    pub id: ReportId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// History listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Store-assigned id
    pub id: ReportId,
    /// Filing auditor
    pub author: Author,
    /// Audited site
    pub site_name: String,
    /// Global score string
    pub score: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ReportSummary {
    /// Summary of a freshly created report
    #[must_use]
    pub fn from_created(created: &CreatedReport, snapshot: &ReportSnapshot) -> Self {
        Self {
            id: created.id.clone(),
            author: snapshot.author.clone(),
            site_name: snapshot.site_name.clone(),
            score: snapshot.score.clone(),
            created_at: created.created_at,
        }
    }
}
