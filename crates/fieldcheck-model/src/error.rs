//! Error types for the checklist model

use crate::ids::{ChecklistId, ItemId, SectionId};
use std::path::PathBuf;

/// Catalog loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No checklist defined
    #[error("catalog defines no checklists")]
    Empty,

    /// Two checklists share an id
    #[error("duplicate checklist id: {0}")]
    DuplicateChecklist(ChecklistId),

    /// Two sections of one checklist share an id
    #[error("duplicate section {section} in checklist {checklist}")]
    DuplicateSection {
        checklist: ChecklistId,
        section: SectionId,
    },

    /// Two items of one checklist share an id
    #[error("duplicate item {item} in checklist {checklist}")]
    DuplicateItem { checklist: ChecklistId, item: ItemId },

    /// Blank id
    #[error("empty id for {context}")]
    EmptyId { context: String },

    /// File extension not recognized
    #[error("unsupported catalog format: {0:?}")]
    UnsupportedFormat(String),

    /// Catalog file could not be read
    #[error("failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse failure
    #[error("invalid yaml catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parse failure
    #[error("invalid json catalog: {0}")]
    Json(#[from] serde_json::Error),
}
