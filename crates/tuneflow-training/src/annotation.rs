//! Preference annotation and the review cursor.
//!
//! Annotations live on the dataset entries themselves; [`AnnotationSession`]
//! only tracks where the reviewer is in the dataset's order.

use crate::dataset::{Annotation, DatasetEntry, DatasetStore, ItemId, Preference};
use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};

impl DatasetStore {
    /// Overwrite the annotation of the first item with `id`.
    ///
    /// `Preference::Unset` with no reasoning removes the annotation entirely.
    pub fn set_preference(
        &mut self,
        id: &ItemId,
        preference: Preference,
        reasoning: Option<String>,
    ) -> TrainingResult<()> {
        let index = self.position(id).ok_or_else(|| TrainingError::ItemNotFound(id.to_string()))?;
        self.set_preference_at(index, preference, reasoning)
    }

    pub(crate) fn set_preference_at(
        &mut self,
        index: usize,
        preference: Preference,
        reasoning: Option<String>,
    ) -> TrainingResult<()> {
        let entry = self
            .entry_at_mut(index)
            .ok_or_else(|| TrainingError::ItemNotFound(format!("index {index}")))?;

        let reasoning = reasoning.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        entry.annotation = if !preference.is_set() && reasoning.is_none() {
            None
        } else {
            Some(Annotation { preference, reasoning })
        };
        tracing::debug!(item_id = %entry.item.id, %preference, "Preference saved");
        Ok(())
    }

    #[must_use]
    pub fn annotation_summary(&self) -> AnnotationSummary {
        self.entries().iter().fold(AnnotationSummary::default(), |mut summary, entry| {
            match entry.preference() {
                Preference::A => summary.preferred_a += 1,
                Preference::B => summary.preferred_b += 1,
                Preference::Tie => summary.ties += 1,
                Preference::Unset => summary.unannotated += 1,
            }
            summary
        })
    }
}

/// Tally of preferences across a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSummary {
    pub preferred_a: usize,
    pub preferred_b: usize,
    pub ties: usize,
    pub unannotated: usize,
}

impl AnnotationSummary {
    #[must_use]
    pub fn annotated(&self) -> usize {
        self.preferred_a + self.preferred_b + self.ties
    }
}

/// Review cursor over a [`DatasetStore`].
///
/// The stored index is clamped against the store on every read, so the
/// cursor stays in `[0, len - 1]` even after items are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSession {
    index: usize,
}

impl AnnotationSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position, or `None` for an empty dataset.
    #[must_use]
    pub fn current_index(&self, store: &DatasetStore) -> Option<usize> {
        let len = store.total_count();
        (len > 0).then(|| self.index.min(len - 1))
    }

    #[must_use]
    pub fn current<'a>(&self, store: &'a DatasetStore) -> Option<&'a DatasetEntry> {
        self.current_index(store).and_then(|i| store.entries().get(i))
    }

    /// Move to the next item; no-op on the last one.
    pub fn advance(&mut self, store: &DatasetStore) {
        if let Some(index) = self.current_index(store) {
            self.index = (index + 1).min(store.total_count() - 1);
            tracing::debug!(cursor = self.index, "Review cursor advanced");
        }
    }

    /// Move to the previous item; no-op on the first one.
    pub fn retreat(&mut self, store: &DatasetStore) {
        if let Some(index) = self.current_index(store) {
            self.index = index.saturating_sub(1);
            tracing::debug!(cursor = self.index, "Review cursor retreated");
        }
    }

    /// Same as [`advance`](Self::advance), whether or not the current item is annotated.
    pub fn skip(&mut self, store: &DatasetStore) {
        self.advance(store);
    }

    /// Annotate the item under the cursor.
    pub fn annotate_current(
        &self,
        store: &mut DatasetStore,
        preference: Preference,
        reasoning: Option<String>,
    ) -> TrainingResult<()> {
        let index = self
            .current_index(store)
            .ok_or_else(|| TrainingError::ItemNotFound("dataset is empty".to_string()))?;
        store.set_preference_at(index, preference, reasoning)
    }

    /// True once the cursor is on the last item and that item has a preference.
    #[must_use]
    pub fn is_complete(&self, store: &DatasetStore) -> bool {
        match self.current_index(store) {
            Some(index) => {
                index + 1 == store.total_count() && store.entries()[index].is_annotated()
            }
            None => false,
        }
    }

    /// `(cursor + 1) / len * 100`, or 0 for an empty dataset.
    #[must_use]
    pub fn progress_percent(&self, store: &DatasetStore) -> f64 {
        self.current_index(store)
            .map_or(0.0, |i| (i + 1) as f64 / store.total_count() as f64 * 100.0)
    }

    /// "2 of 3" style label.
    #[must_use]
    pub fn position_label(&self, store: &DatasetStore) -> String {
        match self.current_index(store) {
            Some(i) => format!("{} of {}", i + 1, store.total_count()),
            None => "0 of 0".to_string(),
        }
    }
}
