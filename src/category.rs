//! # Category Table
//!
//! A category binds one event grouping to the page it is fetched from, the DOM
//! anchor that isolates its listing on that page, and the tag its records carry
//! once merged. The table is loaded once at startup and never mutated.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::config::ConfigError;

/// Static description of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDescriptor {
    /// Identifier, also the stem of the category's artifact file
    pub category_id: String,

    /// Page listing the category's events
    pub source_url: String,

    /// `id` attribute of the element wrapping the listing
    pub anchor_id: String,

    /// Tag stamped on merged records
    pub source_tag: String,
}

impl CategoryDescriptor {
    pub fn new(
        category_id: impl Into<String>,
        source_url: impl Into<String>,
        anchor_id: impl Into<String>,
        source_tag: impl Into<String>,
    ) -> Self {
        Self {
            category_id: category_id.into(),
            source_url: source_url.into(),
            anchor_id: anchor_id.into(),
            source_tag: source_tag.into(),
        }
    }

    /// Path of this category's artifact under `output_dir`
    pub fn artifact_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.json", self.category_id))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.category_id.trim().is_empty() {
            return Err(ConfigError::Invalid("category_id must not be empty".to_string()));
        }
        if self.category_id.contains(['/', '\\']) || self.category_id.contains("..") {
            return Err(ConfigError::Invalid(format!(
                "category_id '{}' must not contain path separators or '..'",
                self.category_id
            )));
        }
        if self.anchor_id.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "category '{}' has an empty anchor_id",
                self.category_id
            )));
        }
        if self.source_tag.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "category '{}' has an empty source_tag",
                self.category_id
            )));
        }

        let url = Url::parse(&self.source_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "category '{}' has an invalid source_url '{}': {}",
                self.category_id, self.source_url, e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid(format!(
                "category '{}' source_url must be http(s), got '{}'",
                self.category_id,
                url.scheme()
            )));
        }

        Ok(())
    }
}

/// The full, validated set of categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<CategoryDescriptor>,
}

impl CategoryTable {
    /// Build a table, rejecting empty tables, duplicate ids and malformed entries
    pub fn new(categories: Vec<CategoryDescriptor>) -> Result<Self, ConfigError> {
        if categories.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one category must be configured".to_string(),
            ));
        }

        for (i, category) in categories.iter().enumerate() {
            category.validate()?;
            if categories[..i]
                .iter()
                .any(|other| other.category_id == category.category_id)
            {
                return Err(ConfigError::Invalid(format!(
                    "duplicate category_id '{}'",
                    category.category_id
                )));
            }
        }

        Ok(Self { categories })
    }

    /// The four CosmoCaixa listings
    pub fn reference() -> Self {
        Self {
            categories: vec![
                CategoryDescriptor::new(
                    "exposiciones",
                    "https://cosmocaixa.org/es/exposiciones-ciencia-barcelona",
                    "portlet_listactivities_INSTANCE_u3YZVHkpD017",
                    "exhibicion",
                ),
                CategoryDescriptor::new(
                    "actividades",
                    "https://cosmocaixa.org/es/actividades-cosmocaixa-ciencia",
                    "portlet_listactivities_INSTANCE_Q4EA43110XIZ",
                    "actividad",
                ),
                CategoryDescriptor::new(
                    "planetario",
                    "https://cosmocaixa.org/es/planetario",
                    "portlet_listactivities_INSTANCE_n4imOHR5Ia1i",
                    "planetario",
                ),
                CategoryDescriptor::new(
                    "conferencias",
                    "https://cosmocaixa.org/es/conferencias",
                    "portlet_listactivities_INSTANCE_WvGPDs7XuZX8",
                    "conferencia",
                ),
            ],
        }
    }

    /// Keep only the named categories, in table order
    pub fn select(&self, ids: &[String]) -> Result<Self, ConfigError> {
        if let Some(unknown) = ids.iter().find(|id| self.get(id).is_none()) {
            return Err(ConfigError::Invalid(format!("unknown category '{}'", unknown)));
        }

        Self::new(
            self.categories
                .iter()
                .filter(|c| ids.contains(&c.category_id))
                .cloned()
                .collect(),
        )
    }

    pub fn get(&self, category_id: &str) -> Option<&CategoryDescriptor> {
        self.categories.iter().find(|c| c.category_id == category_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryDescriptor> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::reference()
    }
}
