//! # Artifact Storage
//!
//! JSON artifacts on disk: one array of events per category, the unified
//! merged collection, and the discovered-links map. Writes go through a
//! temporary file in the target directory followed by a rename, so an artifact
//! is either fully replaced or left as it was.

use serde::{Serialize, de::DeserializeOwned};
use std::{io, path::Path};
use tokio::fs;
use tracing::debug;

use crate::error::Error as CrateError;
use crate::event::Event;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        StorageError::Json {
            path: path.display().to_string(),
            source,
        }
    }

    /// Whether the artifact simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl From<StorageError> for CrateError {
    fn from(err: StorageError) -> Self {
        CrateError::Storage(err.to_string())
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// Serialize `value` as pretty JSON and replace whatever is at `path`
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StorageError::json(path, e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, json)
        .await
        .map_err(|e| StorageError::io(&tmp_path, e))?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(StorageError::io(path, e));
    }

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Read and deserialize a JSON artifact
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StorageError::json(path, e))
}

/// Persist a category's events, replacing any previous run's artifact
pub async fn write_events(path: &Path, events: &[Event]) -> Result<()> {
    write_json(path, events).await
}

/// Load a category's events
pub async fn read_events(path: &Path) -> Result<Vec<Event>> {
    read_json(path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn events() -> Vec<Event> {
        vec![
            Event {
                name: "Clik Clak".to_string(),
                starting_date: NaiveDate::from_ymd_opt(2024, 9, 14)
                    .and_then(|d| d.and_hms_opt(11, 0, 0)),
                ending_date: NaiveDate::from_ymd_opt(2024, 9, 14)
                    .and_then(|d| d.and_hms_opt(12, 15, 0)),
                description: "Espectáculo familiar".to_string(),
                price: 4.0,
                kind: "Espectáculos".to_string(),
            },
            Event {
                name: "Muestra de minerales".to_string(),
                starting_date: None,
                ending_date: None,
                description: String::new(),
                price: 0.0,
                kind: "Muestra".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_write_then_read_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("json_events").join("actividades.json");

        write_events(&path, &events()).await.unwrap();
        let back = read_events(&path).await.unwrap();

        assert_eq!(back, events());
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"starting_date\": \"2024-09-14T11:00:00\""));
        assert!(raw.contains("\"ending_date\": null"));
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planetario.json");

        write_events(&path, &events()).await.unwrap();
        write_events(&path, &events()[1..]).await.unwrap();

        assert_eq!(read_events(&path).await.unwrap().len(), 1);
        assert!(!dir.path().join("planetario.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_events(&dir.path().join("missing.json"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_read_malformed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_events(&path).await.unwrap_err();
        assert!(matches!(err, StorageError::Json { .. }));
        assert!(!err.is_not_found());
    }
}
