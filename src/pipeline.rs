//! # Extraction Pipeline
//!
//! Runs one [`SourceJob`] per category concurrently and gathers their
//! outcomes. Jobs share nothing but the fetcher and the extractor, both of
//! which are safe for concurrent use, so no job can block or abort another;
//! a panicking job is reported as a `task_error` for its category only.
//!
//! The merge step must only start once [`Orchestrator::run`] has returned.

mod error;
mod job;

pub use error::{FailureKind, JobError};
pub use job::{JobReport, JobStage, SourceJob};

use futures::future;
use rig::completion::CompletionModel;
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::category::CategoryTable;
use crate::extractor::SchemaExtractor;
use crate::fetch::Fetcher;
use crate::fragment;

/// Terminal state of one category's job
pub type JobOutcome = Result<JobReport, JobError>;

/// Outcomes of a run, keyed by category id
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: BTreeMap<String, JobOutcome>,
}

impl RunReport {
    pub fn get(&self, category_id: &str) -> Option<&JobOutcome> {
        self.outcomes.get(category_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobOutcome)> {
        self.outcomes.iter().map(|(id, outcome)| (id.as_str(), outcome))
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &JobReport)> {
        self.iter()
            .filter_map(|(id, outcome)| outcome.as_ref().ok().map(|report| (id, report)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &JobError)> {
        self.iter()
            .filter_map(|(id, outcome)| outcome.as_ref().err().map(|err| (id, err)))
    }

    /// Events persisted across all successful categories
    pub fn total_records(&self) -> usize {
        self.successes().map(|(_, report)| report.records).sum()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, outcome) in self.iter() {
            match outcome {
                Ok(report) => writeln!(f, "{}: ok ({} events)", id, report.records)?,
                Err(e) => writeln!(f, "{}: failed ({}): {}", id, e.kind(), e)?,
            }
        }
        Ok(())
    }
}

/// Fans jobs out over a bounded set of tasks
pub struct Orchestrator<F, C>
where
    C: CompletionModel,
{
    fetcher: Arc<F>,
    extractor: Arc<SchemaExtractor<C>>,
    output_dir: PathBuf,
    concurrency: Option<usize>,
}

impl<F, C> Orchestrator<F, C>
where
    F: Fetcher + 'static,
    C: CompletionModel + 'static,
{
    pub fn new(fetcher: F, extractor: SchemaExtractor<C>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            output_dir: output_dir.into(),
            concurrency: None,
        }
    }

    /// Bound the number of jobs in flight; defaults to one slot per category
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency.max(1));
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run every category's job and wait for all of them
    #[instrument(skip_all, fields(categories = categories.len()))]
    pub async fn run(&self, categories: &CategoryTable) -> RunReport {
        let permits = self.concurrency.unwrap_or(categories.len()).max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        info!("Running {} jobs, {} at a time", categories.len(), permits);

        let tasks = categories
            .iter()
            .map(|category| {
                let job = SourceJob::new(category.clone(), &self.output_dir);
                let permit = semaphore.clone().acquire_owned();
                let fetcher = self.fetcher.clone();
                let extractor = self.extractor.clone();

                let handle = tokio::spawn(async move {
                    let _permit = permit
                        .await
                        .map_err(|e| JobError::Task(format!("semaphore closed: {}", e)))?;
                    job.run(fetcher.as_ref(), extractor.as_ref()).await
                });
                (category.category_id.clone(), handle)
            })
            .collect::<Vec<_>>();

        let (ids, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
        let results = future::join_all(handles).await;

        let mut report = RunReport::default();
        for (id, result) in ids.into_iter().zip(results) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => Err(JobError::Task(e.to_string())),
            };

            match &outcome {
                Ok(job) => info!("{}: persisted {} events to {}", id, job.records, job.path.display()),
                Err(e) => warn!("{}: {} ({})", id, e, e.kind()),
            }
            report.outcomes.insert(id, outcome);
        }

        report
    }
}

/// Companion utility: links under `prefix` inside each category's fragment.
///
/// A category maps to `None` when its page could not be fetched and to an
/// empty list when the fragment is missing.
#[instrument(skip_all, fields(prefix = prefix))]
pub async fn discover_links<F: Fetcher>(
    fetcher: &F,
    categories: &CategoryTable,
    prefix: &str,
) -> BTreeMap<String, Option<Vec<String>>> {
    let lookups = categories.iter().map(|category| async move {
        let links = match fetcher.fetch(&category.source_url).await {
            Ok(html) => Some(fragment::discover_links(&html, &category.anchor_id, prefix)),
            Err(e) => {
                warn!("{}: {}", category.category_id, e);
                None
            }
        };
        (category.category_id.clone(), links)
    });

    let links: BTreeMap<_, _> = future::join_all(lookups).await.into_iter().collect();
    info!(
        "Discovered {} links",
        links.values().flatten().map(Vec::len).sum::<usize>()
    );
    links
}
