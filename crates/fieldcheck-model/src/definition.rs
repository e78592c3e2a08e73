//! Checklist definitions and the catalog that orders them
//!
//! Definitions are read-only. The catalog fixes "definition order", which
//! every tie-break and navigation rule in the engine relies on.

use crate::error::CatalogError;
use crate::ids::{ChecklistId, ItemId, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Type tag of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Visual header, never answered
    Header,
    /// Informational text, never answered
    Info,
    /// Single-line text
    Text,
    /// Multi-line text
    Textarea,
    /// Calendar date
    Date,
    /// Pass / fail / not-applicable question
    BooleanPassFail,
    /// 0-10 numeric rating
    Rating,
}

impl ItemKind {
    /// True for kinds that take an answer (everything but header/info)
    #[inline]
    #[must_use]
    pub fn is_answerable(&self) -> bool {
        !matches!(self, Self::Header | Self::Info)
    }

    /// True for kinds that contribute to the score
    #[inline]
    #[must_use]
    pub fn is_scored(&self) -> bool {
        matches!(self, Self::BooleanPassFail)
    }
}

/// A single question/field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable id
    pub id: ItemId,
    /// Prompt shown to the auditor
    #[serde(default)]
    pub text: String,
    /// Type tag
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Whether finalization requires an answer
    #[serde(default)]
    pub required: bool,
    /// Optional guidance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl Item {
    /// Create item
    #[must_use]
    pub fn new(id: impl Into<ItemId>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            text: String::new(),
            kind,
            required: false,
            help_text: None,
        }
    }

    /// Mark as required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// With prompt text
    #[inline]
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// Named grouping of items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Stable id
    pub id: SectionId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Items in display order
    pub items: Vec<Item>,
}

impl Section {
    /// Create section
    #[must_use]
    pub fn new(id: impl Into<SectionId>, items: Vec<Item>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            items,
        }
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Definition of one checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistDefinition {
    /// Stable id
    pub id: ChecklistId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Sections in display order
    pub sections: Vec<Section>,
}

impl ChecklistDefinition {
    /// Create definition
    #[must_use]
    pub fn new(id: impl Into<ChecklistId>, sections: Vec<Section>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            sections,
        }
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Find a section by id
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id.as_str() == id)
    }

    /// Find an item by id across all sections
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items().find(|item| item.id.as_str() == id)
    }

    /// All items in definition order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    /// All items paired with their section, in definition order
    pub fn items_with_section(&self) -> impl Iterator<Item = (&Section, &Item)> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter().map(move |item| (s, item)))
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.id.is_empty() {
            return Err(CatalogError::EmptyId { context: "checklist".to_string() });
        }

        let mut sections = HashSet::new();
        let mut items = HashSet::new();
        for section in &self.sections {
            if section.id.is_empty() {
                return Err(CatalogError::EmptyId {
                    context: format!("section in checklist {}", self.id),
                });
            }
            if !sections.insert(section.id.as_str()) {
                return Err(CatalogError::DuplicateSection {
                    checklist: self.id.clone(),
                    section: section.id.clone(),
                });
            }
            for item in &section.items {
                if item.id.is_empty() {
                    return Err(CatalogError::EmptyId {
                        context: format!("item in section {}", section.id),
                    });
                }
                if !items.insert(item.id.as_str()) {
                    return Err(CatalogError::DuplicateItem {
                        checklist: self.id.clone(),
                        item: item.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Ordered, validated set of checklist definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    checklists: Vec<ChecklistDefinition>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Wrapped { checklists: Vec<ChecklistDefinition> },
    Bare(Vec<ChecklistDefinition>),
}

impl CatalogDocument {
    fn into_checklists(self) -> Vec<ChecklistDefinition> {
        match self {
            Self::Wrapped { checklists } | Self::Bare(checklists) => checklists,
        }
    }
}

impl Catalog {
    /// Build a catalog, validating ids
    ///
    /// # Errors
    /// - `CatalogError::Empty` if no checklist is given
    /// - `CatalogError::DuplicateChecklist` / `DuplicateSection` / `DuplicateItem`
    /// - `CatalogError::EmptyId` for blank ids
    pub fn new(checklists: Vec<ChecklistDefinition>) -> Result<Self, CatalogError> {
        if checklists.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for checklist in &checklists {
            checklist.validate()?;
            if !seen.insert(checklist.id.as_str()) {
                return Err(CatalogError::DuplicateChecklist(checklist.id.clone()));
            }
        }

        Ok(Self { checklists })
    }

    /// Parse a YAML catalog (either a bare list or `checklists:` mapping)
    pub fn from_yaml_str(source: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_yaml::from_str(source)?;
        Self::new(doc.into_checklists())
    }

    /// Parse a JSON catalog (either a bare array or `{"checklists": [...]}`)
    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(source)?;
        Self::new(doc.into_checklists())
    }

    /// Load a catalog file, choosing the parser by extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&source),
            Some("yaml" | "yml") => Self::from_yaml_str(&source),
            other => Err(CatalogError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Checklists in definition order
    #[inline]
    #[must_use]
    pub fn checklists(&self) -> &[ChecklistDefinition] {
        &self.checklists
    }

    /// Checklist ids in definition order
    pub fn ids(&self) -> impl Iterator<Item = &ChecklistId> {
        self.checklists.iter().map(|c| &c.id)
    }

    /// Find checklist by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ChecklistDefinition> {
        self.checklists.iter().find(|c| c.id.as_str() == id)
    }

    /// Position of a checklist in definition order
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.checklists.iter().position(|c| c.id.as_str() == id)
    }

    /// Number of checklists
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.checklists.len()
    }

    /// Always false for a validated catalog
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checklists.is_empty()
    }
}
