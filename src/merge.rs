//! # Merging
//!
//! Builds the unified artifact from the per-category artifacts. Every record is
//! stamped with its category's tag and appended in the configured category
//! order, then in each artifact's own record order. The unified artifact has no
//! state of its own: it is rebuilt wholesale on every merge.

use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::category::CategoryTable;
use crate::event::MergedEvent;
use crate::storage::{self, StorageError};

/// Artifacts contributing records under one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSource {
    pub tag: String,
    paths: Vec<PathBuf>,
}

impl MergeSource {
    /// Paths are sorted and de-duplicated so merge order never depends on
    /// how they were listed.
    pub fn new(tag: impl Into<String>, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut paths: Vec<PathBuf> = paths.into_iter().collect();
        paths.sort();
        paths.dedup();

        Self {
            tag: tag.into(),
            paths,
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

/// Concatenates tagged category artifacts
#[derive(Debug, Clone)]
pub struct Merger {
    sources: Vec<MergeSource>,
}

impl Merger {
    pub fn new(sources: Vec<MergeSource>) -> Self {
        Self { sources }
    }

    /// One source per category in `order`, reading `<output_dir>/<id>.json`.
    ///
    /// Ids missing from the table are skipped.
    pub fn from_table(table: &CategoryTable, output_dir: &Path, order: &[String]) -> Self {
        let sources = order
            .iter()
            .filter_map(|id| table.get(id))
            .map(|category| {
                MergeSource::new(
                    category.source_tag.clone(),
                    [category.artifact_path(output_dir)],
                )
            })
            .collect();

        Self::new(sources)
    }

    pub fn sources(&self) -> &[MergeSource] {
        &self.sources
    }

    /// Collect every record. Missing or unreadable artifacts count as empty.
    #[instrument(skip(self))]
    pub async fn merge(&self) -> Vec<MergedEvent> {
        let mut merged = Vec::new();

        for source in &self.sources {
            for path in source.paths() {
                let events = match storage::read_events(path).await {
                    Ok(events) => events,
                    Err(e) if e.is_not_found() => {
                        debug!("No artifact at {}", path.display());
                        continue;
                    }
                    Err(e) => {
                        warn!("Skipping unreadable artifact: {}", e);
                        continue;
                    }
                };

                debug!("{} records from {} as '{}'", events.len(), path.display(), source.tag);
                merged.extend(
                    events
                        .into_iter()
                        .map(|event| MergedEvent::new(event, source.tag.as_str())),
                );
            }
        }

        merged
    }

    /// Merge and write the unified artifact, returning its record count
    #[instrument(skip(self), fields(output = %output.display()))]
    pub async fn merge_to(&self, output: &Path) -> Result<usize, StorageError> {
        let merged = self.merge().await;
        storage::write_json(output, &merged).await?;

        info!("Merged {} records into {}", merged.len(), output.display());
        Ok(merged.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    fn event(name: &str, price: f64) -> Event {
        Event {
            name: name.to_string(),
            starting_date: None,
            ending_date: None,
            description: format!("Descripción de {}", name),
            price,
            kind: "Talleres".to_string(),
        }
    }

    fn reference_order() -> Vec<String> {
        ["actividades", "conferencias", "exposiciones", "planetario"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_merge_tags_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        storage::write_events(
            &dir.path().join("actividades.json"),
            &[event("Taller de química", 6.0), event("Visita al Bosque Inundado", 0.0)],
        )
        .await
        .unwrap();

        let merger = Merger::from_table(&CategoryTable::reference(), dir.path(), &reference_order());
        let merged = merger.merge().await;

        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|m| m.source == "actividad"));
        assert_eq!(merged[0].event.name, "Taller de química");
        assert_eq!(merged[1].event.name, "Visita al Bosque Inundado");
    }

    #[tokio::test]
    async fn test_merge_concatenates_in_configured_order() {
        let dir = tempfile::tempdir().unwrap();
        storage::write_events(&dir.path().join("planetario.json"), &[event("Bubble Planet", 4.0)])
            .await
            .unwrap();
        storage::write_events(&dir.path().join("actividades.json"), &[event("Clik Clak", 4.0)])
            .await
            .unwrap();
        storage::write_events(&dir.path().join("exposiciones.json"), &[])
            .await
            .unwrap();

        let merger = Merger::from_table(&CategoryTable::reference(), dir.path(), &reference_order());
        let merged = merger.merge().await;
        let sources = merged_sources(&merged);

        assert_eq!(sources, vec!["actividad", "planetario"]);
    }

    fn merged_sources(merged: &[MergedEvent]) -> Vec<&str> {
        merged.iter().map(|m| m.source.as_str()).collect()
    }

    #[tokio::test]
    async fn test_merge_to_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        storage::write_events(
            &dir.path().join("conferencias.json"),
            &[event("El origen de la vida", 0.0), event("Agujeros negros", 3.0)],
        )
        .await
        .unwrap();

        let merger = Merger::from_table(&CategoryTable::reference(), dir.path(), &reference_order());
        let output = dir.path().join("merged_events.json");

        assert_eq!(merger.merge_to(&output).await.unwrap(), 2);
        let first = std::fs::read(&output).unwrap();
        assert_eq!(merger.merge_to(&output).await.unwrap(), 2);
        let second = std::fs::read(&output).unwrap();

        assert_eq!(first, second);
        let raw = String::from_utf8(first).unwrap();
        assert!(raw.contains("\"source\": \"conferencia\""));
        assert!(raw.contains("\"type\": \"Talleres\""));
    }

    #[tokio::test]
    async fn test_merge_skips_malformed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("exposiciones.json"), "[{\"name\": ").unwrap();
        storage::write_events(&dir.path().join("planetario.json"), &[event("Bubble Planet", 4.0)])
            .await
            .unwrap();

        let merger = Merger::from_table(&CategoryTable::reference(), dir.path(), &reference_order());
        let output = dir.path().join("out").join("merged.json");

        assert_eq!(merger.merge_to(&output).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_merge_with_nothing_written() {
        let dir = tempfile::tempdir().unwrap();
        let merger = Merger::from_table(&CategoryTable::reference(), dir.path(), &reference_order());
        let output = dir.path().join("merged.json");

        assert_eq!(merger.merge_to(&output).await.unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "[]");
    }

    #[test]
    fn test_source_paths_are_sorted() {
        let source = MergeSource::new(
            "exhibicion",
            [
                PathBuf::from("b/exposiciones.json"),
                PathBuf::from("a/exposiciones.json"),
                PathBuf::from("b/exposiciones.json"),
            ],
        );

        assert_eq!(
            source.paths(),
            &[PathBuf::from("a/exposiciones.json"), PathBuf::from("b/exposiciones.json")]
        );
    }
}
