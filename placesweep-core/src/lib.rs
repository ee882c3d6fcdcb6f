//! Core engine for exhaustively enumerating places over a region.
//!
//! The search API caps every query at a fixed number of results, so a single
//! query cannot prove it saw everything in a busy area. The engine tiles the
//! region into squares, fetches each square page by page, and splits any
//! square that hits the cap into quadrants until every leaf comes back under
//! it. Results merge into one [`ResultSet`] keyed by place identifier.
//!
//! Transport, export and process concerns live behind the [`PlaceSearch`],
//! [`RateLimiter`] and [`ResultSink`] traits.

#![forbid(unsafe_code)]

pub mod collect;
pub mod fetch;
pub mod geometry;
pub mod partition;
pub mod place;
pub mod rate_limit;
pub mod search;
pub mod sweep;
pub mod tiling;

#[doc(hidden)]
pub mod test_support;

pub use collect::{
    CollectError, Collected, CollectorConfig, DEFAULT_MAX_DEPTH, DEFAULT_MIN_SIDE_MILES,
    DEFAULT_SATURATION_CAP, RecursiveCollector, RegionFailure, RetryPolicy,
};
pub use fetch::{MAX_PAGES_PER_QUERY, PAGE_TOKEN_RETRIES, PagedFetcher};
pub use geometry::{
    BoundingRegion, BoundingRegionError, DegreesPerMile, GeoSquare, GeoSquareError,
    METERS_PER_MILE,
};
pub use partition::quadrants;
pub use place::{Place, ResultSet};
pub use rate_limit::{DEFAULT_PAGE_DELAY, FixedDelay, RateLimiter, Unthrottled};
pub use search::{PlaceSearch, SearchError, SearchPage, SearchRequest};
pub use sweep::{ResultSink, Sweep, SweepConfig, SweepError, SweepReport};
pub use tiling::{DEFAULT_TILE_SIDE_MILES, TileBoundary, TilingConfig, TilingError, tile};
