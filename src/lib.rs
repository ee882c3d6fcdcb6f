//! Facade crate for the placesweep region enumerator.
//!
//! This crate re-exports the sweep engine and, behind the `http` feature, the
//! HTTP place search and JSON export adapters.

#![forbid(unsafe_code)]

pub use placesweep_core::{
    BoundingRegion, CollectError, CollectorConfig, DegreesPerMile, FixedDelay, GeoSquare, Place,
    PlaceSearch, RateLimiter, RegionFailure, ResultSet, ResultSink, RetryPolicy, SearchError,
    SearchPage, SearchRequest, Sweep, SweepConfig, SweepError, SweepReport, TileBoundary,
    TilingConfig, Unthrottled,
};

#[cfg(feature = "http")]
pub use placesweep_data::{
    ExportError, HttpPlaceSearch, HttpPlaceSearchConfig, JsonFileSink, ProviderBuildError,
};
