//! # Fetch Configuration
//!
//! Controls how source pages are retrieved: directly, or through one of the
//! scraping proxy services that render pages from a residential IP.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scraping proxy used to reach the source pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyService {
    /// GET the source URL directly
    #[default]
    None,
    /// scraperapi.com
    ScraperApi,
    /// scrapingbee.com
    ScrapingBee,
}

impl ProxyService {
    /// Base URL of the proxy API, `None` for direct fetches
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            ProxyService::None => None,
            ProxyService::ScraperApi => Some("http://api.scraperapi.com/"),
            ProxyService::ScrapingBee => Some("https://app.scrapingbee.com/api/v1/"),
        }
    }

    /// Environment variable holding the proxy credential
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            ProxyService::None => None,
            ProxyService::ScraperApi => Some("SCRAPER_API_KEY"),
            ProxyService::ScrapingBee => Some("SCRAPINGBEE_API_KEY"),
        }
    }

    /// Service-specific query parameters sent with every request
    pub fn extra_params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ProxyService::ScrapingBee => &[
                ("premium_proxy", "true"),
                ("country_code", "es"),
                ("block_resources", "true"),
                ("device", "desktop"),
            ],
            _ => &[],
        }
    }
}

/// Configuration for the HTTP fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Proxy service to route requests through
    pub proxy: ProxyService,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent for direct requests
    pub user_agent: String,

    /// Override of the proxy endpoint
    pub endpoint: Option<String>,

    /// Proxy credential, read from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            proxy: ProxyService::None,
            timeout_secs: 60,
            user_agent: format!("eventscout/{}", env!("CARGO_PKG_VERSION")),
            endpoint: None,
            api_key: None,
        }
    }
}

/// Builder for FetchConfig
#[derive(Debug, Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FetchConfig::default(),
        }
    }

    /// Route requests through a proxy service
    pub fn proxy(mut self, proxy: ProxyService, api_key: impl Into<String>) -> Self {
        self.config.proxy = proxy;
        self.config.api_key = Some(api_key.into());
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    pub fn build(self) -> FetchConfig {
        self.config
    }
}

impl FetchConfig {
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::new()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Endpoint requests are sent to, when going through a proxy
    pub fn proxy_endpoint(&self) -> Option<String> {
        self.endpoint
            .clone()
            .or_else(|| self.proxy.default_endpoint().map(String::from))
    }
}
