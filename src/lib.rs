//! # eventscout - Structured Event Extraction
//!
//! Turns the event listings of a fixed set of web pages into one tagged JSON
//! dataset. Each category's page is fetched, the element listing its events is
//! isolated, a language model fills a fixed event schema from that fragment,
//! and the validated records are persisted per category before being merged.
//!
//! ## Features
//!
//! - Concurrent per-category jobs with isolated failures
//! - Tolerant HTML fragment location by element id
//! - Schema-constrained extraction through rig completion models, rate limited
//! - Strict validation of model output (dates, prices, exact field set)
//! - Deterministic, idempotent merge of the category artifacts
//!
//! ## Example
//!
//! ```rust,no_run
//! use eventscout::prelude::*;
//! use std::num::NonZeroU32;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = CategoryTable::reference();
//!     let model = eventscout::model::openai("sk-...", "gpt-3.5-turbo", NonZeroU32::MIN);
//!     let extractor = SchemaExtractor::new(model, ExtractorConfig::default());
//!     let fetcher = HttpFetcher::new(FetchConfig::default())?;
//!
//!     let report = Orchestrator::new(fetcher, extractor, "json_events").run(&table).await;
//!     print!("{}", report);
//!
//!     let order: Vec<String> = table.iter().map(|c| c.category_id.clone()).collect();
//!     let count = Merger::from_table(&table, "json_events".as_ref(), &order)
//!         .merge_to("merged_events.json".as_ref())
//!         .await?;
//!     println!("{} events", count);
//!     Ok(())
//! }
//! ```

mod error;

pub mod category;
pub mod config;
pub mod event;
pub mod extractor;
pub mod fetch;
pub mod fragment;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod storage;

pub use error::{Error, Result};

/// Common imports for driving a run
pub mod prelude {
    pub use crate::category::{CategoryDescriptor, CategoryTable};
    pub use crate::config::ScraperConfig;
    pub use crate::event::{Event, MergedEvent};
    pub use crate::extractor::{ExtractorConfig, SchemaExtractor};
    pub use crate::fetch::{FetchConfig, Fetcher, HttpFetcher};
    pub use crate::merge::Merger;
    pub use crate::pipeline::{Orchestrator, RunReport};
}
