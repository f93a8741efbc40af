//! Reading and writing dataset files in the export payload format.

use crate::dataset::{DatasetSnapshot, DatasetStore};
use crate::error::TrainingResult;
use chrono::NaiveDate;
use std::path::Path;

/// `dpo_dataset_<YYYY-MM-DD>.json`
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("dpo_dataset_{}.json", date.format("%Y-%m-%d"))
}

pub fn write_dataset_file(path: &Path, store: &DatasetStore) -> TrainingResult<()> {
    let json = store.export_snapshot().to_json_pretty()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}

pub fn read_snapshot_file(path: &Path) -> TrainingResult<DatasetSnapshot> {
    let contents = std::fs::read_to_string(path)?;
    DatasetSnapshot::from_json(&contents)
}

/// Load a dataset file into a fresh store. A missing file is an empty dataset.
pub fn load_dataset_file(path: &Path) -> TrainingResult<DatasetStore> {
    let mut store = DatasetStore::new();
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            store.import_json(&contents)?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Preference;
    use crate::error::TrainingError;
    use tempfile::TempDir;

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "dpo_dataset_2024-03-07.json");
    }

    #[test]
    fn test_write_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("data.json");

        let mut store = DatasetStore::new();
        let id = store.add("p", "a", "b").unwrap();
        store.set_preference(&id, Preference::A, Some("direct".to_string())).unwrap();
        write_dataset_file(&path, &store).unwrap();

        let loaded = load_dataset_file(&path).unwrap();
        assert_eq!(loaded.entries(), store.entries());
        assert_eq!(read_snapshot_file(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty_dataset() {
        let temp = TempDir::new().unwrap();
        let store = load_dataset_file(&temp.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_dataset_file(&path), Err(TrainingError::Parse(_))));
    }
}
