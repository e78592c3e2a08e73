//! Completeness validation
//!
//! Two views of "done":
//! - section progress counts every answerable item (display only)
//! - checklist completeness counts required items plus signatures (gating)

use fieldcheck_model::{
    Catalog, ChecklistDefinition, ChecklistId, Draft, ItemId, Role, Section, SectionId,
};
use serde::Serialize;
use std::sync::Arc;

/// Progress of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionStatus {
    /// Answerable items (everything but header/info)
    pub total_items: usize,
    /// Answerable items with a non-empty value
    pub answered_items: usize,
    /// `total_items > 0 && total_items == answered_items`
    pub is_complete: bool,
}

impl SectionStatus {
    /// Compute status of a section inside a checklist
    #[must_use]
    pub fn of(section: &Section, checklist: &str, draft: &Draft) -> Self {
        let mut total_items = 0;
        let mut answered_items = 0;

        for item in section.items.iter().filter(|i| i.kind.is_answerable()) {
            total_items += 1;
            if !draft.answer(checklist, item.id.as_str()).is_empty() {
                answered_items += 1;
            }
        }

        Self {
            total_items,
            answered_items,
            is_complete: total_items > 0 && total_items == answered_items,
        }
    }
}

/// Something finalization still needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissingField {
    /// Required item without a value
    Item { section: SectionId, item: ItemId },
    /// Signature not captured yet
    Signature { role: Role },
}

/// Completion of one checklist, as used by the finalization gate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistProgress {
    /// Checklist
    pub checklist: ChecklistId,
    /// Required items with a value
    pub answered_required: usize,
    /// Required items
    pub total_required: usize,
    /// Required signature roles present
    pub signatures_present: usize,
    /// Required signature roles
    pub signatures_required: usize,
    /// `(answered_required + signatures_present) / (total_required + signatures_required) * 100`
    pub percent: f64,
}

impl ChecklistProgress {
    /// All required items and signatures present
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answered_required == self.total_required
            && self.signatures_present == self.signatures_required
    }
}

/// Validation engine
///
/// Stateless over drafts; holds only the catalog and the signature roles
/// every checklist requires.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    catalog: Arc<Catalog>,
    signature_roles: Vec<Role>,
}

impl ValidationEngine {
    /// Create engine requiring the manager and coordinator signatures
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            signature_roles: vec![Role::manager(), Role::coordinator()],
        }
    }

    /// Override required signature roles (checked in the given order)
    #[must_use]
    pub fn with_signature_roles(mut self, roles: Vec<Role>) -> Self {
        self.signature_roles = roles;
        self
    }

    /// Catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Required signature roles
    #[inline]
    #[must_use]
    pub fn signature_roles(&self) -> &[Role] {
        &self.signature_roles
    }

    /// Status of one section; `None` for unknown checklist/section
    #[must_use]
    pub fn section_status(
        &self,
        checklist: &str,
        section: &str,
        draft: &Draft,
    ) -> Option<SectionStatus> {
        let section = self.catalog.get(checklist)?.section(section)?;
        Some(SectionStatus::of(section, checklist, draft))
    }

    /// Required-but-empty items in definition order, then missing signatures
    ///
    /// Empty for unknown checklists.
    #[must_use]
    pub fn missing_fields(&self, checklist: &str, draft: &Draft) -> Vec<MissingField> {
        let Some(definition) = self.catalog.get(checklist) else {
            return Vec::new();
        };

        let mut missing: Vec<MissingField> = definition
            .items_with_section()
            .filter(|(_, item)| {
                item.required && draft.answer(checklist, item.id.as_str()).is_empty()
            })
            .map(|(section, item)| MissingField::Item {
                section: section.id.clone(),
                item: item.id.clone(),
            })
            .collect();

        missing.extend(
            self.signature_roles
                .iter()
                .filter(|role| draft.signature(role.as_str()).is_none())
                .map(|role| MissingField::Signature { role: role.clone() }),
        );

        missing
    }

    /// First thing to fix, for "scroll to first missing field"
    #[must_use]
    pub fn first_missing(&self, checklist: &str, draft: &Draft) -> Option<MissingField> {
        self.missing_fields(checklist, draft).into_iter().next()
    }

    /// Completion counts of a checklist; `None` if unknown
    #[must_use]
    pub fn completion(&self, checklist: &str, draft: &Draft) -> Option<ChecklistProgress> {
        let definition = self.catalog.get(checklist)?;
        Some(self.progress_of(definition, draft))
    }

    /// Required items answered and both signatures present
    ///
    /// Unknown checklists are never complete. The ignored flag is not
    /// consulted here; see [`ValidationEngine::is_satisfied`].
    #[must_use]
    pub fn is_checklist_complete(&self, checklist: &str, draft: &Draft) -> bool {
        self.completion(checklist, draft)
            .is_some_and(|progress| progress.is_complete())
    }

    /// Gating view: ignored checklists always satisfy
    #[must_use]
    pub fn is_satisfied(&self, checklist: &str, draft: &Draft) -> bool {
        draft.is_ignored(checklist) || self.is_checklist_complete(checklist, draft)
    }

    pub(crate) fn progress_of(
        &self,
        definition: &ChecklistDefinition,
        draft: &Draft,
    ) -> ChecklistProgress {
        let checklist = definition.id.as_str();
        let mut total_required = 0;
        let mut answered_required = 0;

        for item in definition.items().filter(|i| i.required) {
            total_required += 1;
            if !draft.answer(checklist, item.id.as_str()).is_empty() {
                answered_required += 1;
            }
        }

        let signatures_required = self.signature_roles.len();
        let signatures_present = self
            .signature_roles
            .iter()
            .filter(|role| draft.signature(role.as_str()).is_some())
            .count();

        let denominator = total_required + signatures_required;
        let percent = if denominator == 0 {
            100.0
        } else {
            (answered_required + signatures_present) as f64 / denominator as f64 * 100.0
        };

        ChecklistProgress {
            checklist: definition.id.clone(),
            answered_required,
            total_required,
            signatures_present,
            signatures_required,
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_catalog, sign_all};
    use fieldcheck_model::{AnswerValue, PassFail};
    use pretty_assertions::assert_eq;

    fn engine() -> ValidationEngine {
        ValidationEngine::new(Arc::new(sample_catalog()))
    }

    #[test]
    fn section_status_skips_headers() {
        let engine = engine();
        let mut draft = Draft::new();

        let status = engine.section_status("gerencial", "info_basica", &draft).unwrap();
        assert_eq!(status, SectionStatus { total_items: 2, answered_items: 0, is_complete: false });

        draft.set_answer("gerencial".into(), "filial".into(), "Loja 1".into());
        draft.set_answer("gerencial".into(), "gestor".into(), "Ana".into());
        let status = engine.section_status("gerencial", "info_basica", &draft).unwrap();
        assert!(status.is_complete);
    }

    #[test]
    fn header_only_section_is_never_complete() {
        let engine = engine();
        let status = engine.section_status("gerencial", "intro", &Draft::new()).unwrap();
        assert_eq!(status.total_items, 0);
        assert!(!status.is_complete);
    }

    #[test]
    fn empty_string_counts_as_unanswered() {
        let engine = engine();
        let mut draft = Draft::new();
        draft.set_answer("gerencial".into(), "filial".into(), AnswerValue::text(""));

        let status = engine.section_status("gerencial", "info_basica", &draft).unwrap();
        assert_eq!(status.answered_items, 0);
    }

    #[test]
    fn missing_fields_order_items_then_manager_then_coordinator() {
        let engine = engine();
        let mut draft = Draft::new();
        draft.set_answer("gerencial".into(), "gestor".into(), "Ana".into());

        let missing = engine.missing_fields("gerencial", &draft);
        assert_eq!(
            missing,
            vec![
                MissingField::Item { section: "info_basica".into(), item: "filial".into() },
                MissingField::Signature { role: Role::manager() },
                MissingField::Signature { role: Role::coordinator() },
            ]
        );

        draft.set_signature(Role::coordinator(), "sig".into());
        assert_eq!(
            engine.missing_fields("gerencial", &draft).last(),
            Some(&MissingField::Signature { role: Role::manager() })
        );
    }

    #[test]
    fn completeness_requires_signatures() {
        let engine = engine();
        let mut draft = Draft::new();
        draft.set_answer("gerencial".into(), "filial".into(), "Loja 1".into());
        draft.set_answer("gerencial".into(), "gestor".into(), "Ana".into());
        assert!(!engine.is_checklist_complete("gerencial", &draft));

        draft.set_signature(Role::manager(), "sig".into());
        assert!(!engine.is_checklist_complete("gerencial", &draft));

        sign_all(&mut draft);
        assert!(engine.is_checklist_complete("gerencial", &draft));
    }

    #[test]
    fn blank_signatures_do_not_complete() {
        let engine = engine();
        let mut draft = Draft::new();
        draft.set_answer("gerencial".into(), "filial".into(), "Loja 1".into());
        draft.set_answer("gerencial".into(), "gestor".into(), "Ana".into());
        draft.set_signature(Role::manager(), String::new());
        draft.set_signature(Role::coordinator(), String::new());

        assert!(!engine.is_checklist_complete("gerencial", &draft));
        assert_eq!(engine.completion("gerencial", &draft).unwrap().signatures_present, 0);
        assert_eq!(
            engine.first_missing("gerencial", &draft),
            Some(MissingField::Signature { role: Role::manager() })
        );
    }

    #[test]
    fn optional_items_do_not_gate() {
        let engine = engine();
        let mut draft = Draft::new();
        sign_all(&mut draft);
        draft.set_answer("limpeza".into(), "filial".into(), "Loja 1".into());

        // limpeza has only pass/fail items besides filial, none required
        assert!(engine.is_checklist_complete("limpeza", &draft));
        draft.set_answer("limpeza".into(), "limp_banheiro".into(), PassFail::Fail.into());
        assert!(engine.is_checklist_complete("limpeza", &draft));
    }

    #[test]
    fn completion_percentage() {
        let engine = engine();
        let mut draft = Draft::new();
        draft.set_answer("gerencial".into(), "filial".into(), "Loja 1".into());
        draft.set_signature(Role::manager(), "sig".into());

        let progress = engine.completion("gerencial", &draft).unwrap();
        assert_eq!(progress.total_required, 2);
        assert_eq!(progress.answered_required, 1);
        assert_eq!(progress.signatures_present, 1);
        assert!((progress.percent - 50.0).abs() < f64::EPSILON);
        assert!(!progress.is_complete());
    }

    #[test]
    fn ignored_checklists_satisfy_gating_only() {
        let engine = engine();
        let mut draft = Draft::new();
        draft.toggle_ignored("limpeza".into());

        assert!(engine.is_satisfied("limpeza", &draft));
        assert!(!engine.is_checklist_complete("limpeza", &draft));
    }

    #[test]
    fn unknown_checklist_is_never_complete() {
        let engine = engine();
        let mut draft = Draft::new();
        sign_all(&mut draft);
        assert!(!engine.is_checklist_complete("nope", &draft));
        assert!(engine.missing_fields("nope", &draft).is_empty());
        assert!(engine.completion("nope", &draft).is_none());
    }
}
