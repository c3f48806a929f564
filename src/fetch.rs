//! # Page Fetching
//!
//! The fetch capability retrieves the raw HTML of a source page. Jobs depend on
//! the [`Fetcher`] trait rather than on a concrete client so the pipeline can
//! run against any transport; [`HttpFetcher`] is the reqwest-backed
//! implementation, optionally routed through a scraping proxy.
//!
//! A single fetcher is constructed at startup and shared by every job, so
//! implementations must be safe for concurrent use.

mod config;
mod error;

pub use config::{FetchConfig, FetchConfigBuilder, ProxyService};
pub use error::FetchError;

use reqwest::Client;
use std::future::Future;
use tracing::{debug, instrument};

/// Something that can turn a URL into page HTML
pub trait Fetcher: Send + Sync {
    /// Fetch the page at `url`, failing on transport errors or non-success status
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        if config.proxy != ProxyService::None && config.api_key.is_none() {
            return Err(FetchError::Other(format!(
                "proxy {:?} requires an API key",
                config.proxy
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        match (self.config.proxy_endpoint(), self.config.api_key.as_deref()) {
            (Some(endpoint), Some(api_key)) => {
                let mut params = vec![("api_key", api_key), ("url", url)];
                params.extend_from_slice(self.config.proxy.extra_params());
                self.client.get(endpoint).query(&params)
            }
            _ => self.client.get(url),
        }
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(skip(self), fields(proxy = ?self.config.proxy))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching {}", url);

        let response = self.request(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// Serves pages from memory; unknown URLs fail like an unreachable host
    #[derive(Debug, Clone, Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), html.into());
            self
        }
    }

    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Other(format!("connection refused: {}", url)))
        }
    }
}
