//! The draft aggregate
//!
//! A `Draft` is a plain value: answers per checklist, attachments per
//! checklist, global signatures and the ignored set. It is backed by
//! persistent maps, so cloning a draft to publish a snapshot is O(1) and
//! later edits copy only the touched path.

use crate::answer::AnswerValue;
use crate::ids::{ChecklistId, ItemId, Role, SectionId};
use im::{OrdMap, OrdSet};
use serde::{Deserialize, Serialize};

/// Answers of one checklist
pub type AnswerSet = OrdMap<ItemId, AnswerValue>;

/// Encoded images of one checklist, per section
pub type AttachmentSet = OrdMap<SectionId, Vec<String>>;

/// Encoded signatures per role
pub type SignatureSet = OrdMap<Role, String>;

static EMPTY_ANSWER: AnswerValue = AnswerValue::Empty;

/// In-progress state of every checklist for one auditor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    answers: OrdMap<ChecklistId, AnswerSet>,
    #[serde(default)]
    attachments: OrdMap<ChecklistId, AttachmentSet>,
    #[serde(default)]
    signatures: SignatureSet,
    #[serde(default)]
    ignored: OrdSet<ChecklistId>,
}

impl Draft {
    /// Empty draft
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.values().all(OrdMap::is_empty)
            && self.attachments.values().all(|sections| sections.values().all(Vec::is_empty))
            && self.signatures.values().all(String::is_empty)
            && self.ignored.is_empty()
    }

    // ---- answers ----

    /// Answer of an item, `Empty` when never set
    #[must_use]
    pub fn answer(&self, checklist: &str, item: &str) -> &AnswerValue {
        self.answers
            .get(checklist)
            .and_then(|set| set.get(item))
            .unwrap_or(&EMPTY_ANSWER)
    }

    /// Answer set of a checklist
    #[must_use]
    pub fn answers_for(&self, checklist: &str) -> Option<&AnswerSet> {
        self.answers.get(checklist)
    }

    /// All answer sets
    #[inline]
    #[must_use]
    pub fn answers(&self) -> &OrdMap<ChecklistId, AnswerSet> {
        &self.answers
    }

    /// Store an answer for one checklist
    pub fn set_answer(&mut self, checklist: ChecklistId, item: ItemId, value: AnswerValue) {
        self.answers.entry(checklist).or_insert_with(Default::default).insert(item, value);
    }

    // ---- attachments ----

    /// Images of a section
    #[must_use]
    pub fn images(&self, checklist: &str, section: &str) -> &[String] {
        self.attachments
            .get(checklist)
            .and_then(|sections| sections.get(section))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All attachment sets
    #[inline]
    #[must_use]
    pub fn attachments(&self) -> &OrdMap<ChecklistId, AttachmentSet> {
        &self.attachments
    }

    /// Append an image to a section (capacity is checked by the caller)
    pub fn push_image(&mut self, checklist: ChecklistId, section: SectionId, image: String) {
        self.attachments
            .entry(checklist)
            .or_insert_with(Default::default)
            .entry(section)
            .or_insert_with(Default::default)
            .push(image);
    }

    /// Remove the image at `index`; `None` if out of range
    pub fn remove_image(&mut self, checklist: &str, section: &str, index: usize) -> Option<String> {
        let sections = self.attachments.get_mut(checklist)?;
        let images = sections.get_mut(section)?;
        (index < images.len()).then(|| images.remove(index))
    }

    // ---- signatures ----

    /// Signature of a role; a blank image counts as unsigned
    #[must_use]
    pub fn signature(&self, role: &str) -> Option<&str> {
        self.signatures
            .get(role)
            .map(String::as_str)
            .filter(|image| !image.is_empty())
    }

    /// All signatures
    #[inline]
    #[must_use]
    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    /// Store a signature for every checklist; a blank image clears it
    pub fn set_signature(&mut self, role: Role, image: String) {
        if image.is_empty() {
            self.signatures.remove(&role);
        } else {
            self.signatures.insert(role, image);
        }
    }

    // ---- ignored ----

    /// Whether a checklist is marked not applicable
    #[must_use]
    pub fn is_ignored(&self, checklist: &str) -> bool {
        self.ignored.contains(checklist)
    }

    /// Ignored checklist ids
    #[inline]
    #[must_use]
    pub fn ignored(&self) -> &OrdSet<ChecklistId> {
        &self.ignored
    }

    /// Flip the ignored flag; returns the new state
    pub fn toggle_ignored(&mut self, checklist: ChecklistId) -> bool {
        if self.ignored.remove(&checklist).is_some() {
            false
        } else {
            self.ignored.insert(checklist);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::PassFail;
    use pretty_assertions::assert_eq;

    #[test]
    fn unset_answers_are_empty() {
        let draft = Draft::new();
        assert!(draft.answer("gerencial", "filial").is_empty());
        assert!(draft.is_empty());
    }

    #[test]
    fn set_and_read_answers() {
        let mut draft = Draft::new();
        draft.set_answer("a".into(), "pop_1".into(), PassFail::Pass.into());

        assert_eq!(draft.answer("a", "pop_1").as_pass_fail(), Some(PassFail::Pass));
        assert!(draft.answer("b", "pop_1").is_empty());
        assert!(!draft.is_empty());
    }

    #[test]
    fn images_remove_out_of_range_is_none() {
        let mut draft = Draft::new();
        draft.push_image("a".into(), "s".into(), "img-1".into());
        draft.push_image("a".into(), "s".into(), "img-2".into());

        assert_eq!(draft.remove_image("a", "s", 5), None);
        assert_eq!(draft.remove_image("a", "s", 0).as_deref(), Some("img-1"));
        assert_eq!(draft.images("a", "s"), ["img-2".to_string()]);
        assert!(draft.images("a", "other").is_empty());
    }

    #[test]
    fn signatures_are_shared() {
        let mut draft = Draft::new();
        draft.set_signature(Role::manager(), "sig".into());

        assert_eq!(draft.signatures().len(), 1);
        assert_eq!(draft.signature("manager"), Some("sig"));
    }

    #[test]
    fn blank_signature_counts_as_unsigned() {
        let mut draft = Draft::new();
        draft.set_signature(Role::manager(), "sig".into());
        draft.set_signature(Role::manager(), String::new());
        assert_eq!(draft.signature("manager"), None);
        assert!(draft.signatures().is_empty());

        // blank entries arriving from a remote copy
        let remote: Draft =
            serde_json::from_str(r#"{"signatures": {"manager": "", "coordinator": ""}}"#).unwrap();
        assert_eq!(remote.signature("manager"), None);
        assert_eq!(remote.signature("coordinator"), None);
    }

    #[test]
    fn toggle_ignored_flips() {
        let mut draft = Draft::new();
        assert!(draft.toggle_ignored("a".into()));
        assert!(draft.is_ignored("a"));
        assert!(!draft.toggle_ignored("a".into()));
        assert!(!draft.is_ignored("a"));
    }

    #[test]
    fn clones_are_independent() {
        let mut draft = Draft::new();
        draft.set_answer("a".into(), "x".into(), "1".into());
        let snapshot = draft.clone();
        draft.set_answer("a".into(), "x".into(), "2".into());

        assert_eq!(snapshot.answer("a", "x"), &AnswerValue::text("1"));
        assert_ne!(snapshot, draft);
    }

    #[test]
    fn json_round_trip_keeps_structure() {
        let mut draft = Draft::new();
        draft.set_answer("a".into(), "x".into(), AnswerValue::Number(3.0));
        draft.push_image("a".into(), "s".into(), "img".into());
        draft.set_signature(Role::coordinator(), "sig".into());
        draft.toggle_ignored("b".into());

        let json = serde_json::to_string(&draft).unwrap();
        let back: Draft = serde_json::from_str(&json).unwrap();
        assert_eq!(back, draft);

        let partial: Draft = serde_json::from_str(r#"{"answers": {}}"#).unwrap();
        assert!(partial.is_empty());
    }
}
