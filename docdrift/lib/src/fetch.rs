//! Retrieval of documentation pages.
//!
//! The pipeline only needs the HTML of a page; locating and decoding the
//! embedded payload is [`Page::from_html`](crate::page::Page::from_html)'s
//! job, so a malformed payload is reported as a grammar fault, not a
//! retrieval fault.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};

use crate::errors::FetchError;
use crate::page::Page;

/// Source of documentation page HTML.
///
/// Uses native async functions in traits; implementations must be
/// `Send + Sync` so one fetcher can serve every document task.
pub trait Fetcher: Send + Sync {
    /// Retrieves the HTML of the page at `url`.
    ///
    /// ## Errors
    ///
    /// Returns `FetchError` if the page cannot be retrieved.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Client settings for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Prefix for relative document URLs.
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("docdrift/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Retrieves pages over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Option<String>,
}

impl HttpFetcher {
    /// ## Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(options: &FetchOptions) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&options.user_agent)
            .timeout(options.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: options.base_url.clone(),
        })
    }

    /// Resolves a document URL against the base URL.
    ///
    /// Absolute URLs are kept as they are.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = self.resolve(url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        debug!(%url, bytes = html.len(), "page retrieved");
        Ok(html)
    }
}

/// Serves pages from memory. For tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` under `url`.
    pub fn insert(&mut self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(url.into(), html.into());
    }

    /// Serves `page`, embedded under `attribute`, at `url`.
    pub fn with_page(mut self, url: impl Into<String>, page: &Page, attribute: &str) -> Self {
        self.insert(url, page.to_html(attribute));
        self
    }
}

impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
