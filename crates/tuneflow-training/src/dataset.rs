use crate::error::{TrainingError, TrainingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for a comparison item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Which of the two responses an annotator preferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preference {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "tie")]
    Tie,
    #[default]
    #[serde(rename = "unset")]
    Unset,
}

impl Preference {
    #[must_use]
    pub fn is_set(self) -> bool {
        !matches!(self, Self::Unset)
    }
}

impl std::fmt::Display for Preference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::A => "A",
            Self::B => "B",
            Self::Tie => "tie",
            Self::Unset => "unset",
        };
        f.write_str(label)
    }
}

impl FromStr for Preference {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            "tie" => Ok(Self::Tie),
            "unset" | "none" => Ok(Self::Unset),
            other => Err(TrainingError::Parse(format!(
                "unknown preference '{other}' (expected A, B, tie or unset)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub preference: Preference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// A prompt with two candidate responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonItem {
    pub id: ItemId,
    pub prompt: String,
    pub response_a: String,
    pub response_b: String,
    pub created: DateTime<Utc>,
}

/// A comparison item together with its annotation, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub item: ComparisonItem,
    pub annotation: Option<Annotation>,
}

impl DatasetEntry {
    #[must_use]
    pub fn preference(&self) -> Preference {
        self.annotation.as_ref().map(|a| a.preference).unwrap_or_default()
    }

    #[must_use]
    pub fn reasoning(&self) -> Option<&str> {
        self.annotation.as_ref().and_then(|a| a.reasoning.as_deref())
    }

    #[must_use]
    pub fn is_annotated(&self) -> bool {
        self.preference().is_set()
    }
}

/// One element of the export/import payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DatasetRecord {
    pub id: ItemId,
    pub prompt: String,
    pub response_a: String,
    pub response_b: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference: Option<Preference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub created: DateTime<Utc>,
}

impl DatasetRecord {
    fn from_entry(entry: &DatasetEntry) -> Self {
        let item = &entry.item;
        Self {
            id: item.id.clone(),
            prompt: item.prompt.clone(),
            response_a: item.response_a.clone(),
            response_b: item.response_b.clone(),
            preference: Some(entry.preference()).filter(|p| p.is_set()),
            reasoning: entry.reasoning().map(str::to_string),
            created: item.created,
        }
    }

    fn validate(&self, idx: usize) -> TrainingResult<()> {
        if self.id.0.trim().is_empty() {
            return Err(TrainingError::Parse(format!("record[{idx}] id is empty")));
        }
        for (field, value) in [
            ("prompt", &self.prompt),
            ("responseA", &self.response_a),
            ("responseB", &self.response_b),
        ] {
            if value.trim().is_empty() {
                return Err(TrainingError::Parse(format!("record[{idx}] {field} is empty")));
            }
        }
        if self.preference == Some(Preference::Unset) {
            return Err(TrainingError::Parse(format!(
                "record[{idx}] preference must be A, B or tie; omit it when unannotated"
            )));
        }
        Ok(())
    }

    fn into_entry(self) -> DatasetEntry {
        let preference = self.preference.unwrap_or_default();
        let annotation = (preference.is_set() || self.reasoning.is_some())
            .then(|| Annotation { preference, reasoning: self.reasoning });

        DatasetEntry {
            item: ComparisonItem {
                id: self.id,
                prompt: self.prompt,
                response_a: self.response_a,
                response_b: self.response_b,
                created: self.created,
            },
            annotation,
        }
    }
}

/// Immutable copy of a dataset, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetSnapshot {
    records: Vec<DatasetRecord>,
}

impl DatasetSnapshot {
    #[must_use]
    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<DatasetRecord> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json_pretty(&self) -> TrainingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an export payload. Any shape mismatch is a `Parse` error.
    pub fn from_json(payload: &str) -> TrainingResult<Self> {
        serde_json::from_str(payload)
            .map_err(|e| TrainingError::Parse(format!("invalid dataset payload: {e}")))
    }
}

/// Ordered, in-memory collection of comparison items.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    entries: Vec<DatasetEntry>,
}

impl DatasetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new comparison pair. Text is stored trimmed.
    pub fn add(&mut self, prompt: &str, response_a: &str, response_b: &str) -> TrainingResult<ItemId> {
        let prompt = prompt.trim();
        let response_a = response_a.trim();
        let response_b = response_b.trim();

        if prompt.is_empty() {
            return Err(TrainingError::Validation("prompt is required".to_string()));
        }
        if response_a.is_empty() {
            return Err(TrainingError::Validation("response A is required".to_string()));
        }
        if response_b.is_empty() {
            return Err(TrainingError::Validation("response B is required".to_string()));
        }

        let id = ItemId::new();
        self.entries.push(DatasetEntry {
            item: ComparisonItem {
                id: id.clone(),
                prompt: prompt.to_string(),
                response_a: response_a.to_string(),
                response_b: response_b.to_string(),
                created: Utc::now(),
            },
            annotation: None,
        });
        tracing::debug!(item_id = %id, total = self.entries.len(), "Added comparison item");
        Ok(id)
    }

    /// Remove every item with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.item.id != id);
        let removed = self.entries.len() != before;
        if removed {
            tracing::debug!(item_id = %id, "Removed comparison item");
        }
        removed
    }

    /// Append imported records after validating all of them.
    ///
    /// Ids are taken as-is and may duplicate ids already in the store.
    pub fn import_merge(&mut self, records: Vec<DatasetRecord>) -> TrainingResult<usize> {
        for (idx, record) in records.iter().enumerate() {
            record.validate(idx)?;
        }

        let count = records.len();
        self.entries.extend(records.into_iter().map(DatasetRecord::into_entry));
        tracing::info!(imported = count, total = self.entries.len(), "Imported dataset records");
        Ok(count)
    }

    pub fn import_json(&mut self, payload: &str) -> TrainingResult<usize> {
        let snapshot = DatasetSnapshot::from_json(payload)?;
        self.import_merge(snapshot.into_records())
    }

    #[must_use]
    pub fn export_snapshot(&self) -> DatasetSnapshot {
        DatasetSnapshot { records: self.entries.iter().map(DatasetRecord::from_entry).collect() }
    }

    #[must_use]
    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    /// First entry with `id`.
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&DatasetEntry> {
        self.entries.iter().find(|e| &e.item.id == id)
    }

    #[must_use]
    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.entries.iter().position(|e| &e.item.id == id)
    }

    pub(crate) fn entry_at_mut(&mut self, index: usize) -> Option<&mut DatasetEntry> {
        self.entries.get_mut(index)
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn annotated_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_annotated()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(n: usize) -> DatasetStore {
        let mut store = DatasetStore::new();
        for i in 0..n {
            store.add(&format!("prompt {i}"), "first", "second").unwrap();
        }
        store
    }

    #[test]
    fn test_add_appends_trimmed_item_last() {
        let mut store = store_with(2);
        let id = store.add("  Explain DPO  ", " short ", " long ").unwrap();

        assert_eq!(store.total_count(), 3);
        let last = store.entries().last().unwrap();
        assert_eq!(last.item.id, id);
        assert_eq!(last.item.prompt, "Explain DPO");
        assert_eq!(last.item.response_a, "short");
        assert!(last.annotation.is_none());
    }

    #[test]
    fn test_add_rejects_blank_fields_without_mutation() {
        let mut store = store_with(1);

        for (p, a, b) in [("", "a", "b"), ("p", "   ", "b"), ("p", "a", "\n\t")] {
            let err = store.add(p, a, b).unwrap_err();
            assert!(matches!(err, TrainingError::Validation(_)));
        }
        assert_eq!(store.total_count(), 1);
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let store = store_with(20);
        let mut ids: Vec<_> = store.entries().iter().map(|e| e.item.id.0.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = store_with(3);
        let id = store.entries()[1].item.id.clone();

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(!store.remove(&ItemId::from("missing")));
        assert_eq!(store.total_count(), 2);
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut store = store_with(3);
        let first = store.entries()[0].item.id.clone();
        store.set_preference(&first, Preference::B, Some("more concise".to_string())).unwrap();

        let snapshot = store.export_snapshot();
        let json = snapshot.to_json_pretty().unwrap();

        let mut restored = DatasetStore::new();
        assert_eq!(restored.import_json(&json).unwrap(), 3);
        assert_eq!(restored.entries(), store.entries());
        assert_eq!(restored.export_snapshot(), snapshot);
    }

    #[test]
    fn test_export_payload_shape() {
        let mut store = store_with(1);
        let id = store.entries()[0].item.id.clone();
        store.set_preference(&id, Preference::Tie, None).unwrap();

        let value = serde_json::to_value(store.export_snapshot()).unwrap();
        let record = &value[0];
        assert_eq!(record["responseA"], "first");
        assert_eq!(record["responseB"], "second");
        assert_eq!(record["preference"], "tie");
        assert!(record.get("reasoning").is_none());
        assert!(record["created"].is_string());
    }

    #[test]
    fn test_import_rejects_malformed_payload_without_mutation() {
        let mut store = store_with(2);

        let not_a_list = r#"{"id": "1"}"#;
        let missing_field = r#"[{"id": "1", "prompt": "p", "responseA": "a", "created": "2024-01-01T00:00:00Z"}]"#;
        let bad_preference = r#"[{"id": "1", "prompt": "p", "responseA": "a", "responseB": "b", "preference": "C", "created": "2024-01-01T00:00:00Z"}]"#;
        let unset_preference = r#"[{"id": "1", "prompt": "p", "responseA": "a", "responseB": "b", "preference": "unset", "created": "2024-01-01T00:00:00Z"}]"#;
        let partly_valid = r#"[
            {"id": "1", "prompt": "p", "responseA": "a", "responseB": "b", "created": "2024-01-01T00:00:00Z"},
            {"id": "", "prompt": "p", "responseA": "a", "responseB": "b", "created": "2024-01-01T00:00:00Z"}
        ]"#;

        for payload in [not_a_list, missing_field, bad_preference, unset_preference, partly_valid, "not json"] {
            let err = store.import_json(payload).unwrap_err();
            assert!(matches!(err, TrainingError::Parse(_)), "payload {payload} gave {err:?}");
        }
        assert_eq!(store.total_count(), 2);
    }

    #[test]
    fn test_import_appends_in_order_and_keeps_duplicate_ids() {
        let mut store = store_with(1);
        let json = store.export_snapshot().to_json_pretty().unwrap();

        store.import_json(&json).unwrap();
        store.import_json(&json).unwrap();

        assert_eq!(store.total_count(), 3);
        let ids: Vec<_> = store.entries().iter().map(|e| e.item.id.clone()).collect();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[1], ids[2]);
    }

    #[test]
    fn test_annotated_count() {
        let mut store = store_with(4);
        let ids: Vec<_> = store.entries().iter().map(|e| e.item.id.clone()).collect();
        store.set_preference(&ids[0], Preference::A, None).unwrap();
        store.set_preference(&ids[2], Preference::Tie, None).unwrap();

        assert_eq!(store.annotated_count(), 2);
        assert_eq!(store.total_count(), 4);
    }

    #[test]
    fn test_preference_from_str() {
        assert_eq!("a".parse::<Preference>().unwrap(), Preference::A);
        assert_eq!("B".parse::<Preference>().unwrap(), Preference::B);
        assert_eq!(" Tie ".parse::<Preference>().unwrap(), Preference::Tie);
        assert!("maybe".parse::<Preference>().is_err());
    }
}
