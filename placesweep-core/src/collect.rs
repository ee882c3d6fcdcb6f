//! Adaptive collection: fetch a square, split it while it stays saturated.
//!
//! A square whose result count reaches the API cap may have been truncated,
//! so its own results are discarded and its four quadrants are collected
//! instead, depth first. Recursion stops at a configured depth or side-length
//! floor; a square still saturated there is reported rather than silently
//! accepted.

use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use crate::fetch::PagedFetcher;
use crate::{DegreesPerMile, GeoSquare, PlaceSearch, RateLimiter, ResultSet, SearchError, quadrants};

/// Results per query at which the API stops reporting more.
pub const DEFAULT_SATURATION_CAP: usize = 60;
/// Deepest split below a starting square.
pub const DEFAULT_MAX_DEPTH: u32 = 8;
/// Smallest side length a split may produce.
pub const DEFAULT_MIN_SIDE_MILES: f64 = 0.01;

/// Region-level retry for transient fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per region, including the first. Zero behaves as one.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled for each later attempt.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Wait after the `failed_attempt`-th failure (1-based).
    #[must_use]
    pub fn backoff_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1_u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

/// Parameters for [`RecursiveCollector`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    /// Category keyword sent with every initial query.
    pub keyword: String,
    /// Result count at or above which a square counts as saturated.
    pub saturation_cap: usize,
    /// Maximum split depth below the starting square.
    pub max_depth: u32,
    /// Children smaller than this side length are never produced.
    pub min_side_miles: f64,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl CollectorConfig {
    /// Configuration for `keyword` with reference defaults.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            saturation_cap: DEFAULT_SATURATION_CAP,
            max_depth: DEFAULT_MAX_DEPTH,
            min_side_miles: DEFAULT_MIN_SIDE_MILES,
            retry: RetryPolicy::default(),
        }
    }
}

/// Why a region could not be fully enumerated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectError {
    /// Fetching the region failed and retries, if any, were exhausted.
    #[error("fetch failed after {attempts} attempt(s): {source}")]
    Fetch {
        /// Attempts made before giving up.
        attempts: u32,
        /// Error from the last attempt.
        #[source]
        source: SearchError,
    },
    /// The region was still saturated where splitting had to stop.
    #[error("still saturated with {found} places at depth {depth}; results may be truncated")]
    RecursionLimitExceeded {
        /// Split depth of the region.
        depth: u32,
        /// Places returned for the region.
        found: usize,
    },
}

/// A region that failed, with where it sits in the split tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFailure {
    /// Starting tile whose split tree contains the failing square.
    pub origin: GeoSquare,
    /// The failing square.
    pub square: GeoSquare,
    /// Split depth below its starting square.
    pub depth: u32,
    /// What went wrong.
    pub error: CollectError,
}

impl std::fmt::Display for RegionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.square == self.origin {
            write!(f, "square {}: {}", self.square, self.error)
        } else {
            write!(
                f,
                "square {} within {}: {}",
                self.square, self.origin, self.error
            )
        }
    }
}

/// Outcome of collecting one square's subtree.
///
/// `failures` is empty exactly when every leaf was fully enumerated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
    /// Places gathered from every successful leaf.
    pub places: ResultSet,
    /// Regions that could not be fully enumerated.
    pub failures: Vec<RegionFailure>,
}

impl Collected {
    /// Whether the subtree was enumerated without failures.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Merge another subtree's outcome into this one.
    pub fn merge(&mut self, other: Self) {
        self.places.merge(other.places);
        self.failures.extend(other.failures);
    }

    fn failed(failure: RegionFailure) -> Self {
        Self {
            places: ResultSet::new(),
            failures: vec![failure],
        }
    }
}

/// Collect every place in a square by splitting saturated regions.
///
/// # Examples
///
/// ```
/// use placesweep_core::{
///     CollectorConfig, DegreesPerMile, GeoSquare, RecursiveCollector, Unthrottled,
///     test_support::{ScriptedSearch, places},
/// };
/// use placesweep_core::SearchPage;
///
/// # fn main() -> Result<(), placesweep_core::GeoSquareError> {
/// let search = ScriptedSearch::new([Ok(SearchPage::last(places("e", 1..=45)))]);
/// let config = CollectorConfig::new("restaurant");
/// let collector =
///     RecursiveCollector::new(&search, &Unthrottled, &config, DegreesPerMile::default());
///
/// let collected = collector.collect(&GeoSquare::new(37.5, -77.5, 1.0)?);
/// assert!(collected.is_complete());
/// assert_eq!(collected.places.len(), 45);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RecursiveCollector<'a, S: ?Sized, L: ?Sized> {
    fetcher: PagedFetcher<'a, S, L>,
    config: &'a CollectorConfig,
    degrees: DegreesPerMile,
}

impl<'a, S, L> RecursiveCollector<'a, S, L>
where
    S: PlaceSearch + ?Sized,
    L: RateLimiter + ?Sized,
{
    /// Construct a collector over `search`, paced by `limiter`.
    pub fn new(
        search: &'a S,
        limiter: &'a L,
        config: &'a CollectorConfig,
        degrees: DegreesPerMile,
    ) -> Self {
        Self {
            fetcher: PagedFetcher::new(search, limiter, &config.keyword),
            config,
            degrees,
        }
    }

    /// Collect `square` and, while saturated, its quadrants.
    ///
    /// Saturated squares contribute only their children's results. Failures
    /// in one branch are recorded and do not stop its siblings.
    pub fn collect(&self, square: &GeoSquare) -> Collected {
        self.collect_at(square, square, 0)
    }

    fn collect_at(&self, origin: &GeoSquare, square: &GeoSquare, depth: u32) -> Collected {
        let results = match self.fetch_with_retry(square) {
            Ok(results) => results,
            Err(error) => {
                warn!("giving up on square {square}: {error}");
                return Collected::failed(RegionFailure {
                    origin: *origin,
                    square: *square,
                    depth,
                    error,
                });
            }
        };
        if results.len() < self.config.saturation_cap {
            return Collected {
                places: results,
                failures: Vec::new(),
            };
        }

        let child_side = square.side_miles() / 2.0;
        if depth >= self.config.max_depth || child_side < self.config.min_side_miles {
            let found = results.len();
            warn!("square {square} saturated with {found} places but cannot be split further");
            // Truncated results stay alongside the failure.
            return Collected {
                places: results,
                failures: vec![RegionFailure {
                    origin: *origin,
                    square: *square,
                    depth,
                    error: CollectError::RecursionLimitExceeded { depth, found },
                }],
            };
        }

        debug!(
            "square {square} saturated with {} places; splitting at depth {}",
            results.len(),
            depth + 1
        );
        let mut collected = Collected::default();
        for child in quadrants(square, &self.degrees) {
            collected.merge(self.collect_at(origin, &child, depth + 1));
        }
        collected
    }

    fn fetch_with_retry(&self, square: &GeoSquare) -> Result<ResultSet, CollectError> {
        let attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetcher.fetch(square) {
                Ok(results) => return Ok(results),
                Err(source) if source.is_transient() && attempt < attempts => {
                    let backoff = self.config.retry.backoff_after(attempt);
                    warn!(
                        "attempt {attempt}/{attempts} for square {square} failed: {source}; \
                         retrying in {backoff:?}"
                    );
                    if !backoff.is_zero() {
                        std::thread::sleep(backoff);
                    }
                    attempt += 1;
                }
                Err(source) => {
                    return Err(CollectError::Fetch {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}
