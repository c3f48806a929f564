//! # Extractor Configuration
//!
//! Sampling temperature and prompt template for the extraction request.

use super::prompt::PromptTemplate;

/// Configuration for the schema extractor
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Sampling temperature sent with every request
    pub temperature: f64,

    /// Instruction template the fragment is embedded in
    pub template: PromptTemplate,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            template: PromptTemplate::default(),
        }
    }
}

/// Builder for ExtractorConfig
#[derive(Debug, Default)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::default(),
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.config.template = template;
        self
    }

    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}

impl ExtractorConfig {
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::new()
    }
}
