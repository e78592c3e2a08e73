//! Draft Store
//!
//! The only mutation surface of the draft. Every accepted mutation bumps a
//! monotonic generation and publishes a [`Revision`] on a `watch` channel;
//! the autosave scheduler and any UI observer subscribe to it.
//!
//! Mutators validate against the catalog before touching anything, and
//! build the next draft on an O(1) clone, so a rejected call leaves no trace.

use crate::activity::ActivityTracker;
use crate::config::SyncConfig;
use crate::error::DraftError;
use fieldcheck_model::{
    AnswerValue, Catalog, ChecklistDefinition, ChecklistId, Draft, ItemId, ItemKind, PassFail,
    Role,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Highest value a rating item accepts
pub const RATING_MAX: f64 = 10.0;

/// What produced a revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RevisionOrigin {
    /// Auditor edit; triggers autosave
    Local,
    /// Remote snapshot applied by the reconciler
    Remote,
    /// Draft cleared after finalize or reset; cancels autosave
    Cleared,
}

/// Published state of the store
#[derive(Debug, Clone)]
pub struct Revision {
    /// Monotonic mutation counter
    pub generation: u64,
    /// Source of the latest mutation
    pub origin: RevisionOrigin,
    /// Draft as of `generation`
    pub draft: Draft,
}

#[derive(Debug)]
struct StoreState {
    draft: Draft,
    generation: u64,
}

/// Owned, observable draft
#[derive(Debug)]
pub struct DraftStore {
    catalog: Arc<Catalog>,
    activity: Arc<ActivityTracker>,
    global_fields: Vec<ItemId>,
    signature_roles: Vec<Role>,
    max_images: usize,
    state: Mutex<StoreState>,
    revisions: watch::Sender<Revision>,
}

impl DraftStore {
    /// Store holding `draft` at generation 0
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        activity: Arc<ActivityTracker>,
        config: &SyncConfig,
        draft: Draft,
    ) -> Self {
        let (revisions, _) = watch::channel(Revision {
            generation: 0,
            origin: RevisionOrigin::Remote,
            draft: draft.clone(),
        });

        Self {
            catalog,
            activity,
            global_fields: config.global_fields.clone(),
            signature_roles: config.signature_roles.clone(),
            max_images: config.max_images_per_section,
            state: Mutex::new(StoreState { draft, generation: 0 }),
            revisions,
        }
    }

    /// Catalog the store validates against
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Activity tracker touched by local mutations
    #[inline]
    #[must_use]
    pub fn activity(&self) -> &Arc<ActivityTracker> {
        &self.activity
    }

    /// Current draft
    #[must_use]
    pub fn snapshot(&self) -> Draft {
        self.state.lock().draft.clone()
    }

    /// Current generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Latest published revision
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revisions.borrow().clone()
    }

    /// Observe revisions
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.revisions.subscribe()
    }

    /// Store an answer; global fields are mirrored into every checklist
    ///
    /// # Errors
    /// Unknown checklist or item, or a value the item's kind does not accept.
    pub fn set_answer(
        &self,
        checklist: &str,
        item: &str,
        value: AnswerValue,
    ) -> Result<u64, DraftError> {
        let definition = self.checklist(checklist)?;
        let item_def = definition.item(item).ok_or_else(|| DraftError::UnknownItem {
            checklist: definition.id.clone(),
            item: item.into(),
        })?;
        check_value(item_def.kind, &item_def.id, &value)?;

        let targets: Vec<ChecklistId> = if self.is_global_field(item) {
            self.catalog.ids().cloned().collect()
        } else {
            vec![definition.id.clone()]
        };

        let item_id = item_def.id.clone();
        let (_, generation) = self.commit(RevisionOrigin::Local, |draft| {
            for checklist in targets {
                draft.set_answer(checklist, item_id.clone(), value.clone());
            }
            Ok(())
        })?;

        tracing::debug!(checklist, item, generation, "answer set");
        Ok(generation)
    }

    /// Append an image; returns the section's new image count
    ///
    /// # Errors
    /// `AttachmentLimit` when the section is full, or unknown ids.
    pub fn add_image(
        &self,
        checklist: &str,
        section: &str,
        image: String,
    ) -> Result<usize, DraftError> {
        let definition = self.checklist(checklist)?;
        let section_id = definition
            .section(section)
            .ok_or_else(|| DraftError::UnknownSection {
                checklist: definition.id.clone(),
                section: section.into(),
            })?
            .id
            .clone();
        let checklist_id = definition.id.clone();
        let limit = self.max_images;

        let (count, generation) = self.commit(RevisionOrigin::Local, |draft| {
            if draft.images(checklist, section).len() >= limit {
                return Err(DraftError::AttachmentLimit {
                    section: section_id.clone(),
                    limit,
                });
            }
            draft.push_image(checklist_id, section_id.clone(), image);
            Ok(draft.images(checklist, section).len())
        })?;

        tracing::debug!(checklist, section, count, generation, "image added");
        Ok(count)
    }

    /// Remove the image at `index`; `Ok(None)` and no change when out of range
    ///
    /// # Errors
    /// Unknown checklist or section.
    pub fn remove_image(
        &self,
        checklist: &str,
        section: &str,
        index: usize,
    ) -> Result<Option<String>, DraftError> {
        let definition = self.checklist(checklist)?;
        if definition.section(section).is_none() {
            return Err(DraftError::UnknownSection {
                checklist: definition.id.clone(),
                section: section.into(),
            });
        }

        let mut state = self.state.lock();
        let mut next = state.draft.clone();
        let Some(removed) = next.remove_image(checklist, section, index) else {
            return Ok(None);
        };
        self.activity.touch();
        let generation = self.apply(&mut state, RevisionOrigin::Local, next);

        tracing::debug!(checklist, section, index, generation, "image removed");
        Ok(Some(removed))
    }

    /// Store a signature shared by every checklist
    ///
    /// # Errors
    /// `UnknownRole` for roles outside the configured signature roles.
    pub fn set_signature(&self, role: Role, image: String) -> Result<u64, DraftError> {
        if !self.signature_roles.contains(&role) {
            return Err(DraftError::UnknownRole(role));
        }

        let (_, generation) = self.commit(RevisionOrigin::Local, |draft| {
            draft.set_signature(role.clone(), image);
            Ok(())
        })?;

        tracing::debug!(role = %role, generation, "signature set");
        Ok(generation)
    }

    /// Flip a checklist's ignored flag; returns the new flag
    ///
    /// # Errors
    /// Unknown checklist.
    pub fn toggle_ignored(&self, checklist: &str) -> Result<bool, DraftError> {
        let checklist_id = self.checklist(checklist)?.id.clone();
        let (ignored, generation) = self.commit(RevisionOrigin::Local, |draft| {
            Ok(draft.toggle_ignored(checklist_id))
        })?;

        tracing::debug!(checklist, ignored, generation, "ignored flag toggled");
        Ok(ignored)
    }

    /// Overwrite everything with an external snapshot
    ///
    /// Does not count as local activity and does not trigger autosave.
    pub fn replace_all(&self, snapshot: Draft) -> u64 {
        let mut state = self.state.lock();
        self.apply(&mut state, RevisionOrigin::Remote, snapshot)
    }

    /// [`DraftStore::replace_all`] unless the store moved past `expected_generation`
    ///
    /// Returns the new generation, or `None` when a mutation raced the caller.
    pub fn replace_all_if(&self, expected_generation: u64, snapshot: Draft) -> Option<u64> {
        let mut state = self.state.lock();
        if state.generation != expected_generation {
            tracing::debug!(
                expected_generation,
                current = state.generation,
                "remote snapshot superseded by local change"
            );
            return None;
        }
        Some(self.apply(&mut state, RevisionOrigin::Remote, snapshot))
    }

    /// Reset to an empty draft
    pub fn clear(&self) -> u64 {
        let mut state = self.state.lock();
        self.activity.touch();
        self.apply(&mut state, RevisionOrigin::Cleared, Draft::new())
    }

    /// Reset to an empty draft unless something changed since `expected_generation`
    pub fn clear_if(&self, expected_generation: u64) -> Option<u64> {
        let mut state = self.state.lock();
        if state.generation != expected_generation {
            return None;
        }
        self.activity.touch();
        Some(self.apply(&mut state, RevisionOrigin::Cleared, Draft::new()))
    }

    fn checklist(&self, checklist: &str) -> Result<&ChecklistDefinition, DraftError> {
        self.catalog
            .get(checklist)
            .ok_or_else(|| DraftError::UnknownChecklist(checklist.into()))
    }

    fn is_global_field(&self, item: &str) -> bool {
        self.global_fields.iter().any(|f| f.as_str() == item)
    }

    fn commit<T>(
        &self,
        origin: RevisionOrigin,
        f: impl FnOnce(&mut Draft) -> Result<T, DraftError>,
    ) -> Result<(T, u64), DraftError> {
        let mut state = self.state.lock();
        let mut next = state.draft.clone();
        let out = f(&mut next)?;
        self.activity.touch();
        let generation = self.apply(&mut state, origin, next);
        Ok((out, generation))
    }

    fn apply(&self, state: &mut StoreState, origin: RevisionOrigin, draft: Draft) -> u64 {
        state.generation += 1;
        state.draft = draft;
        self.revisions.send_replace(Revision {
            generation: state.generation,
            origin,
            draft: state.draft.clone(),
        });
        state.generation
    }
}

fn check_value(kind: ItemKind, item: &ItemId, value: &AnswerValue) -> Result<(), DraftError> {
    let invalid = |reason: &str| DraftError::InvalidAnswer {
        item: item.clone(),
        reason: reason.to_string(),
    };

    if !kind.is_answerable() {
        return Err(invalid("item does not take answers"));
    }
    if value.is_empty() {
        return Ok(());
    }

    match kind {
        ItemKind::BooleanPassFail => match value {
            AnswerValue::Text(token) if PassFail::parse(token).is_some() => Ok(()),
            _ => Err(invalid("expected pass, fail or na")),
        },
        ItemKind::Rating => match value.as_number() {
            Some(n) if (0.0..=RATING_MAX).contains(&n) => Ok(()),
            _ => Err(invalid("expected a number from 0 to 10")),
        },
        _ => Ok(()),
    }
}
