//! # Scraper Configuration
//!
//! Everything a run needs that is not code: which model to ask, how to reach
//! the source pages, where artifacts go and which categories exist. Settings
//! come from a YAML file, credentials from the environment (a `.env` file is
//! honoured through `dotenvy`).
//!
//! A configuration problem is the only error that aborts a run, so the file is
//! fully validated before any job is started.

use serde::{Deserialize, Serialize};
use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

use crate::category::{CategoryDescriptor, CategoryTable};
use crate::error::Error as CrateError;
use crate::extractor::{ExtractorConfig, PromptTemplate};
use crate::fetch::FetchConfig;
use crate::model::LlmProvider;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/scraper_config.yaml";

/// Order in which the reference categories are concatenated when merging
const REFERENCE_MERGE_ORDER: [&str; 4] = ["actividades", "conferencias", "exposiciones", "planetario"];

/// Error type for configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A configuration or template file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML file is malformed
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required credential is not set
    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),
}

impl From<ConfigError> for CrateError {
    fn from(err: ConfigError) -> Self {
        CrateError::Config(err.to_string())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Hosted model family
    pub llm_provider: LlmProvider,

    /// Model id, e.g. `gpt-3.5-turbo`
    pub llm_name: String,

    /// Sampling temperature for extraction requests
    pub llm_temperature: f64,

    /// Completion quota shared by all jobs
    pub llm_requests_per_minute: u32,

    /// Custom prompt template; the built-in one is used when unset
    pub template_path: Option<PathBuf>,

    /// Page retrieval settings
    pub fetch: FetchConfig,

    /// Directory holding one artifact per category
    pub output_dir: PathBuf,

    /// Unified artifact written by the merge step
    pub merged_path: PathBuf,

    /// Upper bound on concurrently running jobs
    pub concurrency: Option<usize>,

    /// Replacement for the reference category table
    pub categories: Option<Vec<CategoryDescriptor>>,

    /// Category ids in the order their records are merged
    pub merge_order: Option<Vec<String>>,

    /// Provider API key, read from the environment
    #[serde(skip)]
    pub llm_api_key: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            llm_provider: LlmProvider::OpenAi,
            llm_name: "gpt-3.5-turbo".to_string(),
            llm_temperature: 0.0,
            llm_requests_per_minute: 500,
            template_path: None,
            fetch: FetchConfig::default(),
            output_dir: PathBuf::from("json_events"),
            merged_path: PathBuf::from("merged_events.json"),
            concurrency: None,
            categories: None,
            merge_order: None,
            llm_api_key: None,
        }
    }
}

impl ScraperConfig {
    /// Load, resolve credentials from the environment and validate.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_file.display());
        }

        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
            Self::from_yaml(&content)?
        } else {
            info!("No configuration at {}, using defaults", path.display());
            Self::default()
        };

        config.resolve_credentials(|var| std::env::var(var).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse settings without touching the environment
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Fill in credentials for the selected provider and proxy
    pub fn resolve_credentials(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if self.llm_api_key.is_none() {
            self.llm_api_key = non_empty(self.llm_provider.api_key_var());
        }
        if self.fetch.api_key.is_none() {
            self.fetch.api_key = self.fetch.proxy.api_key_var().and_then(non_empty);
        }
    }

    /// Check every setting that can be checked without network access
    pub fn validate(&self) -> Result<(), ConfigError> {
        let table = self.category_table()?;
        self.merge_order_for(&table)?;
        self.extractor_config()?;
        self.requests_per_minute()?;

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm_temperature must be within 0.0..=2.0, got {}",
                self.llm_temperature
            )));
        }
        if self.concurrency == Some(0) {
            return Err(ConfigError::Invalid(
                "concurrency must be greater than zero".to_string(),
            ));
        }
        if self.llm_name.trim().is_empty() {
            return Err(ConfigError::Invalid("llm_name must not be empty".to_string()));
        }

        Ok(())
    }

    /// The configured categories, or the reference table
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        match &self.categories {
            Some(categories) => CategoryTable::new(categories.clone()),
            None => Ok(CategoryTable::reference()),
        }
    }

    /// Category ids in merge order.
    ///
    /// An explicit `merge_order` wins; the reference table has its own fixed
    /// order; a custom table merges in table order.
    pub fn merge_order(&self) -> Result<Vec<String>, ConfigError> {
        let table = self.category_table()?;
        self.merge_order_for(&table)
    }

    fn merge_order_for(&self, table: &CategoryTable) -> Result<Vec<String>, ConfigError> {
        let order = match (&self.merge_order, &self.categories) {
            (Some(order), _) => order.clone(),
            (None, None) => REFERENCE_MERGE_ORDER.iter().map(|id| id.to_string()).collect(),
            (None, Some(_)) => table.iter().map(|c| c.category_id.clone()).collect(),
        };

        for (i, id) in order.iter().enumerate() {
            if table.get(id).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "merge_order names unknown category '{}'",
                    id
                )));
            }
            if order[..i].contains(id) {
                return Err(ConfigError::Invalid(format!(
                    "merge_order repeats category '{}'",
                    id
                )));
            }
        }

        Ok(order)
    }

    /// Extractor settings, reading the template file if one is configured
    pub fn extractor_config(&self) -> Result<ExtractorConfig, ConfigError> {
        let template = match &self.template_path {
            Some(path) => PromptTemplate::from_file(path)?,
            None => PromptTemplate::default(),
        };

        Ok(ExtractorConfig::builder()
            .temperature(self.llm_temperature)
            .template(template)
            .build())
    }

    pub fn requests_per_minute(&self) -> Result<NonZeroU32, ConfigError> {
        NonZeroU32::new(self.llm_requests_per_minute).ok_or_else(|| {
            ConfigError::Invalid("llm_requests_per_minute must be greater than zero".to_string())
        })
    }

    /// Job bound for `categories` jobs
    pub fn concurrency(&self, categories: usize) -> usize {
        self.concurrency.unwrap_or(categories).max(1)
    }

    /// API key for the selected provider
    pub fn llm_api_key(&self) -> Result<&str, ConfigError> {
        self.llm_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingCredential(self.llm_provider.api_key_var().to_string()))
    }

    /// Fetch settings, failing if the selected proxy has no credential
    pub fn fetch_config(&self) -> Result<FetchConfig, ConfigError> {
        match self.fetch.proxy.api_key_var() {
            Some(var) if self.fetch.api_key.is_none() => {
                Err(ConfigError::MissingCredential(var.to_string()))
            }
            _ => Ok(self.fetch.clone()),
        }
    }
}
