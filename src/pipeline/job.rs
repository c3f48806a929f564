//! # Source Job
//!
//! One category's run: fetch the page, isolate its fragment, extract events
//! and persist them. Each step either advances the job or ends it with the
//! matching [`JobError`]; nothing is retried within a run.

use rig::completion::CompletionModel;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

use super::error::JobError;
use crate::category::CategoryDescriptor;
use crate::extractor::SchemaExtractor;
use crate::fetch::Fetcher;
use crate::fragment;
use crate::storage;

/// Step a job is currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Fetching,
    Locating,
    Extracting,
    Persisting,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            JobStage::Fetching => "fetching",
            JobStage::Locating => "locating",
            JobStage::Extracting => "extracting",
            JobStage::Persisting => "persisting",
        };
        f.write_str(stage)
    }
}

/// Result of a persisted job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// Number of events written
    pub records: usize,

    /// Artifact the events were written to
    pub path: PathBuf,
}

/// Everything needed to run one category
#[derive(Debug, Clone)]
pub struct SourceJob {
    category: CategoryDescriptor,
    artifact_path: PathBuf,
}

impl SourceJob {
    pub fn new(category: CategoryDescriptor, output_dir: &Path) -> Self {
        let artifact_path = category.artifact_path(output_dir);
        Self {
            category,
            artifact_path,
        }
    }

    pub fn category(&self) -> &CategoryDescriptor {
        &self.category
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Run the job to its terminal state.
    ///
    /// The artifact is replaced only once extraction succeeded, so a failed
    /// run leaves the previous artifact in place.
    #[instrument(skip_all, fields(category = %self.category.category_id))]
    pub async fn run<F, C>(
        &self,
        fetcher: &F,
        extractor: &SchemaExtractor<C>,
    ) -> Result<JobReport, JobError>
    where
        F: Fetcher,
        C: CompletionModel,
    {
        debug!(stage = %JobStage::Fetching, url = %self.category.source_url, "Job stage");
        let html = fetcher.fetch(&self.category.source_url).await?;

        debug!(stage = %JobStage::Locating, anchor = %self.category.anchor_id, "Job stage");
        let fragment = fragment::locate(&html, &self.category.anchor_id).ok_or_else(|| {
            JobError::FragmentNotFound {
                anchor_id: self.category.anchor_id.clone(),
            }
        })?;

        debug!(stage = %JobStage::Extracting, bytes = fragment.html.len(), "Job stage");
        let events = extractor.extract(&fragment).await?;

        debug!(stage = %JobStage::Persisting, path = %self.artifact_path.display(), "Job stage");
        storage::write_events(&self.artifact_path, &events).await?;

        Ok(JobReport {
            records: events.len(),
            path: self.artifact_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractorConfig;
    use crate::fetch::testing::StaticFetcher;
    use crate::model::mock_model::MockCompletionModel;
    use crate::pipeline::FailureKind;

    const URL: &str = "https://cosmocaixa.org/es/planetario";
    const ANCHOR: &str = "portlet_listactivities_INSTANCE_n4imOHR5Ia1i";

    fn job(dir: &Path) -> SourceJob {
        SourceJob::new(CategoryDescriptor::new("planetario", URL, ANCHOR, "planetario"), dir)
    }

    fn page() -> String {
        format!(
            "<html><body><div id=\"{}\"><h3>Bubble Planet</h3><p>4 €</p></div></body></html>",
            ANCHOR
        )
    }

    async fn extractor(response: &str) -> (MockCompletionModel, SchemaExtractor<MockCompletionModel>) {
        let model = MockCompletionModel::new();
        model.set_text_response(response).await;
        (model.clone(), SchemaExtractor::new(model, ExtractorConfig::default()))
    }

    const ONE_EVENT: &str = r#"{"Events": [{"name": "Bubble Planet", "starting_date": null,
        "ending_date": null, "description": "Sesión de planetario", "price": "4 €",
        "type": "Planetario"}]}"#;

    #[tokio::test]
    async fn test_job_persists_events() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::new().with_page(URL, page());
        let (_, extractor) = extractor(ONE_EVENT).await;

        let report = job(dir.path()).run(&fetcher, &extractor).await.unwrap();

        assert_eq!(report.records, 1);
        assert_eq!(report.path, dir.path().join("planetario.json"));
        let events = storage::read_events(&report.path).await.unwrap();
        assert_eq!(events[0].price, 4.0);
    }

    #[tokio::test]
    async fn test_job_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::new().with_page(URL, page());
        let (_, extractor) = extractor(ONE_EVENT).await;
        let job = job(dir.path());

        job.run(&fetcher, &extractor).await.unwrap();
        job.run(&fetcher, &extractor).await.unwrap();

        assert_eq!(storage::read_events(job.artifact_path()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fragment_skips_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::new().with_page(URL, "<html><body><p>Rediseño</p></body></html>");
        let (model, extractor) = extractor(ONE_EVENT).await;

        let err = job(dir.path()).run(&fetcher, &extractor).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::FragmentNotFound);
        assert_eq!(model.calls(), 0);
        assert!(!dir.path().join("planetario.json").exists());
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::new();
        let (model, extractor) = extractor(ONE_EVENT).await;

        let err = job(dir.path()).run(&fetcher, &extractor).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Fetch);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_output_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::new().with_page(URL, page());
        let job = job(dir.path());

        let (_, good) = extractor(ONE_EVENT).await;
        job.run(&fetcher, &good).await.unwrap();

        let (_, bad) = extractor("Lo siento, no puedo ayudar con eso.").await;
        let err = job.run(&fetcher, &bad).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Parse);
        assert_eq!(storage::read_events(job.artifact_path()).await.unwrap().len(), 1);
    }
}
