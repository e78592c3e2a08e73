//! Scoring
//!
//! Two formulas on a 5-point scale:
//!
//! - **Section preview** (`SectionPreview::predicted_score`): passed over
//!   *answered* pass/fail items. Progress so far; unanswered items do not
//!   pull it down.
//! - **Checklist score** (`ChecklistStats::score`): passed over *all*
//!   pass/fail items. Overall outcome; `fail`, `na` and unanswered all count
//!   against it.
//!
//! The global score averages checklist scores over non-ignored checklists
//! that have at least one pass/fail item.

use fieldcheck_model::{Catalog, ChecklistId, Draft, ItemId, PassFail, Section, SectionId};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Maximum score
pub const SCALE: f64 = 5.0;

/// Reference to an item, for summary lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRef {
    /// Containing section
    pub section: SectionId,
    /// Item
    pub item: ItemId,
    /// Prompt text
    pub text: String,
}

/// Score breakdown of one checklist
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChecklistStats {
    /// `passed / total * 5`, `0` when `total == 0`
    pub score: f64,
    /// Items answered `pass`
    pub passed: usize,
    /// Pass/fail items, answered or not
    pub total: usize,
    /// Items answered `fail`
    pub failed_items: Vec<ItemRef>,
    /// Required items without a value
    pub missing_items: Vec<ItemRef>,
    /// Pass/fail items without a value
    pub unanswered_items: Vec<ItemRef>,
}

/// Running score of one section
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SectionPreview {
    /// Pass/fail items in the section
    pub scoreable_items: usize,
    /// Pass/fail items with any value
    pub answered: usize,
    /// Items answered `pass`
    pub passed: usize,
    /// `passed / answered * 5`, `0` when nothing is answered
    pub predicted_score: f64,
}

impl SectionPreview {
    /// Preview of a section inside a checklist
    #[must_use]
    pub fn of(section: &Section, checklist: &str, draft: &Draft) -> Self {
        let mut preview = Self::default();

        for item in section.items.iter().filter(|i| i.kind.is_scored()) {
            preview.scoreable_items += 1;
            let value = draft.answer(checklist, item.id.as_str());
            if !value.is_empty() {
                preview.answered += 1;
                if value.as_pass_fail() == Some(PassFail::Pass) {
                    preview.passed += 1;
                }
            }
        }

        if preview.answered > 0 {
            preview.predicted_score = preview.passed as f64 / preview.answered as f64 * SCALE;
        }
        preview
    }
}

/// Average of qualifying checklist scores, rounded to one decimal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlobalScore {
    value: f64,
    qualifying: usize,
}

impl GlobalScore {
    /// Build from the raw average
    ///
    /// Rounds the exact binary value to one decimal, so `1.45` (stored as
    /// `1.4499…`) gives `1.4`. Exact midpoints round up.
    #[must_use]
    pub fn from_average(average: f64, qualifying: usize) -> Self {
        if qualifying == 0 {
            return Self::zero();
        }
        Self {
            value: round_tenths(average),
            qualifying,
        }
    }

    /// No qualifying checklist
    #[inline]
    #[must_use]
    pub fn zero() -> Self {
        Self { value: 0.0, qualifying: 0 }
    }

    /// Rounded value
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Number of checklists averaged
    #[inline]
    #[must_use]
    pub fn qualifying(&self) -> usize {
        self.qualifying
    }

    /// Feedback band
    #[inline]
    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::classify(self.value)
    }
}

// Midpoints between tenths are representable only at quarter values; `{:.1}`
// breaks those ties to even, every other value it rounds exactly.
fn round_tenths(value: f64) -> f64 {
    let scaled = value * 10.0;
    if (value * 4.0).fract() == 0.0 && (value * 2.0).fract() != 0.0 {
        return scaled.round() / 10.0;
    }
    format!("{value:.1}").parse().unwrap_or(scaled.round() / 10.0)
}

impl fmt::Display for GlobalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value)
    }
}

/// Feedback band of a global score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScoreBand {
    /// >= 4.5
    Excellent,
    /// >= 4.0
    Great,
    /// >= 3.0
    Good,
    /// >= 2.0
    NeedsImprovement,
    /// < 2.0
    Poor,
}

impl ScoreBand {
    /// Classify a score
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score >= 4.5 {
            Self::Excellent
        } else if score >= 4.0 {
            Self::Great
        } else if score >= 3.0 {
            Self::Good
        } else if score >= 2.0 {
            Self::NeedsImprovement
        } else {
            Self::Poor
        }
    }
}

/// Scoring engine
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    catalog: Arc<Catalog>,
}

impl ScoringEngine {
    /// Create engine
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Score breakdown of a checklist; all zeros if unknown
    #[must_use]
    pub fn checklist_stats(&self, checklist: &str, draft: &Draft) -> ChecklistStats {
        let Some(definition) = self.catalog.get(checklist) else {
            return ChecklistStats::default();
        };

        let mut stats = ChecklistStats::default();
        for (section, item) in definition.items_with_section() {
            let value = draft.answer(checklist, item.id.as_str());
            let item_ref = || ItemRef {
                section: section.id.clone(),
                item: item.id.clone(),
                text: item.text.clone(),
            };

            if item.required && value.is_empty() {
                stats.missing_items.push(item_ref());
            }

            if item.kind.is_scored() {
                stats.total += 1;
                match value.as_pass_fail() {
                    Some(PassFail::Pass) => stats.passed += 1,
                    Some(PassFail::Fail) => stats.failed_items.push(item_ref()),
                    Some(PassFail::Na) => {}
                    None if value.is_empty() => stats.unanswered_items.push(item_ref()),
                    None => {}
                }
            }
        }

        if stats.total > 0 {
            stats.score = stats.passed as f64 / stats.total as f64 * SCALE;
        }
        stats
    }

    /// Checklist score only
    #[inline]
    #[must_use]
    pub fn checklist_score(&self, checklist: &str, draft: &Draft) -> f64 {
        self.checklist_stats(checklist, draft).score
    }

    /// Running score of a section; `None` for unknown checklist/section
    #[must_use]
    pub fn section_preview(
        &self,
        checklist: &str,
        section: &str,
        draft: &Draft,
    ) -> Option<SectionPreview> {
        let section = self.catalog.get(checklist)?.section(section)?;
        Some(SectionPreview::of(section, checklist, draft))
    }

    /// Global score over non-ignored checklists with scored items
    #[must_use]
    pub fn global_score(&self, draft: &Draft) -> GlobalScore {
        let scored = self.scored_checklists(draft);
        if scored.is_empty() {
            return GlobalScore::zero();
        }
        let sum: f64 = scored.iter().map(|id| self.checklist_score(id.as_str(), draft)).sum();
        GlobalScore::from_average(sum / scored.len() as f64, scored.len())
    }

    /// Checklists contributing to the global score, in definition order
    #[must_use]
    pub fn scored_checklists(&self, draft: &Draft) -> Vec<ChecklistId> {
        self.catalog
            .checklists()
            .iter()
            .filter(|def| !draft.is_ignored(def.id.as_str()))
            .filter(|def| def.items().any(|i| i.kind.is_scored()))
            .map(|def| def.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_catalog;
    use fieldcheck_model::{AnswerValue, Author, ReportSnapshot};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(Arc::new(sample_catalog()))
    }

    fn answer(draft: &mut Draft, checklist: &str, item: &str, value: impl Into<AnswerValue>) {
        draft.set_answer(checklist.into(), item.into(), value.into());
    }

    #[test]
    fn three_pass_one_fail_scores_3_75() {
        let mut draft = Draft::new();
        answer(&mut draft, "gerencial", "pop_1", PassFail::Pass);
        answer(&mut draft, "gerencial", "pop_2", PassFail::Pass);
        answer(&mut draft, "gerencial", "pop_3", PassFail::Pass);
        answer(&mut draft, "gerencial", "pop_4", PassFail::Fail);

        let stats = engine().checklist_stats("gerencial", &draft);
        assert_eq!(stats.score, 3.75);
        assert_eq!(stats.passed, 3);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.failed_items.len(), 1);
        assert_eq!(stats.failed_items[0].item.as_str(), "pop_4");
    }

    #[test]
    fn na_and_unanswered_count_like_fail() {
        let mut draft = Draft::new();
        answer(&mut draft, "gerencial", "pop_1", PassFail::Pass);
        answer(&mut draft, "gerencial", "pop_2", PassFail::Pass);
        answer(&mut draft, "gerencial", "pop_3", PassFail::Na);

        let stats = engine().checklist_stats("gerencial", &draft);
        assert_eq!(stats.score, 2.5);
        assert_eq!(stats.unanswered_items.len(), 1);
        assert!(stats.failed_items.is_empty());
    }

    #[test]
    fn section_preview_uses_answered_denominator() {
        let mut draft = Draft::new();
        answer(&mut draft, "gerencial", "pop_1", PassFail::Pass);
        answer(&mut draft, "gerencial", "pop_2", PassFail::Na);

        let preview = engine().section_preview("gerencial", "pop", &draft).unwrap();
        assert_eq!(preview.scoreable_items, 4);
        assert_eq!(preview.answered, 2);
        assert_eq!(preview.predicted_score, 2.5);

        // same draft, checklist score divides by all four items
        assert_eq!(engine().checklist_score("gerencial", &draft), 1.25);
    }

    #[test]
    fn stored_report_scores_like_its_draft() {
        let mut draft = Draft::new();
        for item in ["pop_1", "pop_2"] {
            answer(&mut draft, "gerencial", item, PassFail::Pass);
        }
        draft.toggle_ignored("limpeza".into());

        let snapshot = ReportSnapshot::capture(Author::new("u", "U"), "Loja 1", "2.5", &draft);
        assert_eq!(engine().global_score(&snapshot.to_draft()).to_string(), "2.5");
    }

    #[test]
    fn section_preview_without_answers_is_zero() {
        let preview = engine().section_preview("gerencial", "pop", &Draft::new()).unwrap();
        assert_eq!(preview.predicted_score, 0.0);
    }

    #[test]
    fn checklist_without_scored_items_scores_zero() {
        assert_eq!(engine().checklist_score("notas", &Draft::new()), 0.0);
        assert_eq!(engine().checklist_score("unknown", &Draft::new()), 0.0);
    }

    #[test]
    fn missing_items_listed_in_stats() {
        let stats = engine().checklist_stats("gerencial", &Draft::new());
        let missing: Vec<_> = stats.missing_items.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(missing, vec!["filial", "gestor"]);
    }

    #[test]
    fn global_score_averages_active_scored_checklists() {
        let mut draft = Draft::new();
        for item in ["pop_1", "pop_2", "pop_3"] {
            answer(&mut draft, "gerencial", item, PassFail::Pass);
        }
        answer(&mut draft, "gerencial", "pop_4", PassFail::Fail);
        for item in ["limp_banheiro", "limp_cozinha", "limp_deposito", "limp_pallets"] {
            answer(&mut draft, "limpeza", item, PassFail::Pass);
        }

        // notas has no scored items and never counts
        let score = engine().global_score(&draft);
        assert_eq!(score.to_string(), "4.4");
        assert_eq!(score.qualifying(), 2);
        assert_eq!(score.band(), ScoreBand::Great);
    }

    #[test]
    fn ignored_checklist_is_excluded_from_global_score() {
        let mut draft = Draft::new();
        for item in ["pop_1", "pop_2", "pop_3", "pop_4"] {
            answer(&mut draft, "gerencial", item, PassFail::Pass);
        }
        draft.toggle_ignored("limpeza".into());

        let score = engine().global_score(&draft);
        assert_eq!(score.to_string(), "5.0");
        assert_eq!(score.qualifying(), 1);
        assert_eq!(
            engine().scored_checklists(&draft),
            vec![ChecklistId::from("gerencial")]
        );
    }

    #[test]
    fn global_score_without_qualifying_checklist_is_zero_string() {
        let mut draft = Draft::new();
        draft.toggle_ignored("gerencial".into());
        draft.toggle_ignored("limpeza".into());

        assert_eq!(engine().global_score(&draft).to_string(), "0.0");
    }

    #[test]
    fn rounding_follows_stored_binary_value() {
        // 2.5 and 0.4 average to 1.4499999999999999556
        assert_eq!(GlobalScore::from_average((2.5 + 0.4) / 2.0, 2).to_string(), "1.4");
        assert_eq!(GlobalScore::from_average(1.45, 1).to_string(), "1.4");
        assert_eq!(GlobalScore::from_average(0.35, 1).to_string(), "0.3");
        assert_eq!(GlobalScore::from_average(4.375, 2).to_string(), "4.4");
        assert_eq!(GlobalScore::from_average(2.5, 1).to_string(), "2.5");
    }

    #[test]
    fn exact_midpoints_round_up() {
        assert_eq!(GlobalScore::from_average(0.25, 1).to_string(), "0.3");
        assert_eq!(GlobalScore::from_average(1.25, 1).to_string(), "1.3");
        assert_eq!(GlobalScore::from_average(3.75, 1).to_string(), "3.8");
        // 4.45 is stored just above the midpoint
        assert_eq!(GlobalScore::from_average(4.45, 1).band(), ScoreBand::Excellent);
    }

    #[test]
    fn score_bands() {
        assert_eq!(ScoreBand::classify(4.5), ScoreBand::Excellent);
        assert_eq!(ScoreBand::classify(4.0), ScoreBand::Great);
        assert_eq!(ScoreBand::classify(3.2), ScoreBand::Good);
        assert_eq!(ScoreBand::classify(2.0), ScoreBand::NeedsImprovement);
        assert_eq!(ScoreBand::classify(1.9), ScoreBand::Poor);
    }

    proptest! {
        #[test]
        fn checklist_score_stays_on_scale(answers in proptest::collection::vec(0u8..4, 4)) {
            let mut draft = Draft::new();
            for (idx, code) in answers.iter().enumerate() {
                let value = match code {
                    0 => AnswerValue::pass_fail(PassFail::Pass),
                    1 => AnswerValue::pass_fail(PassFail::Fail),
                    2 => AnswerValue::pass_fail(PassFail::Na),
                    _ => AnswerValue::Empty,
                };
                answer(&mut draft, "gerencial", &format!("pop_{}", idx + 1), value);
            }

            let stats = engine().checklist_stats("gerencial", &draft);
            let passes = answers.iter().filter(|c| **c == 0).count();
            prop_assert!(stats.score >= 0.0 && stats.score <= SCALE);
            prop_assert_eq!(stats.passed, passes);
            prop_assert_eq!(stats.total, 4);
        }
    }
}
