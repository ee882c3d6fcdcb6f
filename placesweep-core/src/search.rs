//! The external place search API as seen by the fetch engine.
//!
//! [`PlaceSearch`] is one synchronous call per page. Transport,
//! authentication and wire format belong to implementers such as the HTTP
//! adapter in `placesweep-data`.

use thiserror::Error;

use crate::Place;

/// One page request against the search API.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    /// First page of a radius query around a location.
    Nearby {
        /// Center as a `"lat,lon"` string.
        location: String,
        /// Search radius in metres.
        radius_meters: f64,
        /// Category keyword filter.
        keyword: String,
    },
    /// A follow-up page addressed only by its cursor.
    ///
    /// The API keys subsequent pages entirely by token and ignores any other
    /// parameter.
    NextPage {
        /// Cursor returned with the previous page.
        token: String,
    },
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Places on this page.
    pub places: Vec<Place>,
    /// Cursor for the next page, if any.
    pub next_page_token: Option<String>,
}

impl SearchPage {
    /// Construct a page, treating an empty cursor as the end of results.
    pub fn new(places: Vec<Place>, next_page_token: Option<String>) -> Self {
        Self {
            places,
            next_page_token: next_page_token.filter(|token| !token.is_empty()),
        }
    }

    /// Construct the final page of a query.
    pub fn last(places: Vec<Place>) -> Self {
        Self::new(places, None)
    }
}

/// Errors from [`PlaceSearch::search`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The request could not be sent or the connection failed.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Endpoint without query parameters.
        url: String,
        /// Description of the failure.
        message: String,
    },
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint without query parameters.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The server answered with a non-success HTTP status.
    #[error("request to {url} failed with HTTP {status}: {message}")]
    Http {
        /// Endpoint without query parameters.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Description of the failure.
        message: String,
    },
    /// The API reported a non-success status in its response body.
    #[error("search service returned {status}: {message}")]
    Service {
        /// API status string such as `REQUEST_DENIED`.
        status: String,
        /// Error message supplied by the API, if any.
        message: String,
    },
    /// The response did not have the expected shape.
    #[error("malformed search response: {message}")]
    Malformed {
        /// What was wrong with the payload.
        message: String,
    },
}

impl SearchError {
    /// Whether reissuing the whole region query may succeed.
    ///
    /// Network failures, timeouts, HTTP 429/5xx and the API's quota and
    /// unknown-error statuses are transient. Malformed payloads and other
    /// rejections are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Service { status, .. } => {
                matches!(status.as_str(), "OVER_QUERY_LIMIT" | "UNKNOWN_ERROR")
            }
            Self::Malformed { .. } => false,
        }
    }

    /// Whether the service rejected the request as invalid.
    ///
    /// For a follow-up page this is how the API reports a cursor that has
    /// not become usable yet.
    #[must_use]
    pub fn is_pending_page_token(&self) -> bool {
        matches!(self, Self::Service { status, .. } if status == "INVALID_REQUEST")
    }
}

/// Issue single page requests against a place search API.
///
/// Implementations must not sleep between pages themselves; pacing is the
/// caller's job through a [`RateLimiter`](crate::RateLimiter).
///
/// # Examples
///
/// ```
/// use placesweep_core::{Place, PlaceSearch, SearchError, SearchPage, SearchRequest};
///
/// struct OnePlace;
///
/// impl PlaceSearch for OnePlace {
///     fn search(&self, _request: &SearchRequest) -> Result<SearchPage, SearchError> {
///         Ok(SearchPage::last(vec![Place::with_id("only")]))
///     }
/// }
///
/// let page = OnePlace.search(&SearchRequest::NextPage { token: "t".into() })?;
/// assert_eq!(page.places.len(), 1);
/// # Ok::<(), SearchError>(())
/// ```
pub trait PlaceSearch {
    /// Fetch one page for `request`.
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError>;
}

impl<T: PlaceSearch + ?Sized> PlaceSearch for &T {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        (**self).search(request)
    }
}

impl<T: PlaceSearch + ?Sized> PlaceSearch for Box<T> {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        (**self).search(request)
    }
}
