//! HTTP-based `PlaceSearch` using the Places Nearby Search endpoint.
//!
//! This module provides [`HttpPlaceSearch`], an implementation of the
//! [`PlaceSearch`] trait that issues one GET request per page.
//!
//! # Architecture
//!
//! The [`PlaceSearch`] trait is synchronous so the sweep engine stays free of
//! any async runtime. This provider bridges reqwest's async client to the sync
//! interface by blocking on a Tokio runtime internally.
//!
//! # Example
//!
//! ```no_run
//! use placesweep_data::places::HttpPlaceSearch;
//! use placesweep_core::{PlaceSearch, SearchRequest};
//!
//! let search = HttpPlaceSearch::new("my-api-key")?;
//! let page = search.search(&SearchRequest::Nearby {
//!     location: "37.512296,-77.6941".to_owned(),
//!     radius_meters: 1_137.975,
//!     keyword: "restaurant".to_owned(),
//! })?;
//! println!("{} places", page.places.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use log::debug;
use placesweep_core::{Place, PlaceSearch, SearchError, SearchPage, SearchRequest};
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::nearby::NearbySearchResponse;

/// Error type for [`HttpPlaceSearch`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Nearby Search endpoint used unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Default user agent for search requests.
pub const DEFAULT_USER_AGENT: &str = "placesweep/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpPlaceSearch`].
#[derive(Clone)]
pub struct HttpPlaceSearchConfig {
    /// Full URL of the Nearby Search endpoint.
    pub base_url: String,
    /// API key sent as the `key` query parameter.
    pub api_key: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl std::fmt::Debug for HttpPlaceSearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPlaceSearchConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl HttpPlaceSearchConfig {
    /// Create a configuration for the default endpoint using `api_key`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set the endpoint URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP-based place search using the Nearby Search endpoint.
///
/// It owns a Tokio runtime that is reused across calls.
///
/// # Runtime behaviour
///
/// When called from outside any Tokio runtime, the provider uses its own
/// stored runtime. When called from within an existing multi-threaded Tokio
/// runtime (detected via [`Handle::try_current()`] and
/// [`RuntimeFlavor::MultiThread`]), it uses that runtime's handle with
/// [`tokio::task::block_in_place`] to avoid nested runtime panics. Inside a
/// `current_thread` runtime it falls back to its own runtime.
///
/// # Error reporting
///
/// URLs carried by [`SearchError`] never include the query string, so the API
/// key does not leak into logs.
pub struct HttpPlaceSearch {
    client: Client,
    config: HttpPlaceSearchConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpPlaceSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPlaceSearch")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpPlaceSearch {
    /// Create a provider for the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpPlaceSearchConfig::new(api_key))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpPlaceSearchConfig) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &HttpPlaceSearchConfig {
        &self.config
    }

    /// Query parameters for `request`, API key first.
    ///
    /// Follow-up pages carry only the key and the cursor.
    fn query_params(&self, request: &SearchRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![("key", self.config.api_key.clone())];
        match request {
            SearchRequest::Nearby {
                location,
                radius_meters,
                keyword,
            } => {
                params.push(("location", location.clone()));
                params.push(("radius", radius_meters.to_string()));
                params.push(("keyword", keyword.clone()));
            }
            SearchRequest::NextPage { token } => params.push(("pagetoken", token.clone())),
        }
        params
    }

    async fn search_async(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        let params = self.query_params(request);
        debug!("querying {} ({:?})", self.config.base_url, request);

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(err))?;

        let body: NearbySearchResponse =
            response
                .json()
                .await
                .map_err(|err| SearchError::Malformed {
                    message: err.without_url().to_string(),
                })?;

        convert_response(body)
    }

    /// Convert a reqwest error to a `SearchError`, dropping the request URL.
    fn convert_reqwest_error(&self, error: reqwest::Error) -> SearchError {
        let url = self.config.base_url.clone();
        if error.is_timeout() {
            return SearchError::Timeout {
                url,
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        let status = error.status();
        let message = error.without_url().to_string();
        if let Some(status) = status {
            return SearchError::Http {
                url,
                status: status.as_u16(),
                message,
            };
        }

        SearchError::Network { url, message }
    }
}

/// Convert a Nearby Search response body to a page of places.
fn convert_response(response: NearbySearchResponse) -> Result<SearchPage, SearchError> {
    if !response.is_ok() {
        return Err(SearchError::Service {
            status: response.status,
            message: response.error_message.unwrap_or_default(),
        });
    }

    let results = response.results.ok_or_else(|| SearchError::Malformed {
        message: "response missing results array".to_owned(),
    })?;

    let places = results
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<Place>(value).map_err(|err| SearchError::Malformed {
                message: format!("result {index} is not a place: {err}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchPage::new(places, response.next_page_token))
}

impl PlaceSearch for HttpPlaceSearch {
    /// Fetch one page for `request`.
    ///
    /// # Runtime requirements
    ///
    /// When called from within an existing Tokio runtime, the runtime should
    /// be multi-threaded. Inside a `current_thread` runtime the provider
    /// blocks on its own runtime instead, which may deadlock if the caller's
    /// runtime is driving IO this request depends on.
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        let future = self.search_async(request);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}
