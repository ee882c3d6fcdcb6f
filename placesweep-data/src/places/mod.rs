//! HTTP place search against the Nearby Search endpoint.
//!
//! This module provides [`HttpPlaceSearch`], an implementation of
//! [`placesweep_core::PlaceSearch`] that fetches one page of places per call.
//!
//! # Example
//!
//! ```no_run
//! use placesweep_data::places::{HttpPlaceSearch, HttpPlaceSearchConfig};
//! use placesweep_core::{
//!     BoundingRegion, FixedDelay, GeoSquare, Sweep, SweepConfig,
//! };
//! use std::time::Duration;
//!
//! let config = HttpPlaceSearchConfig::new("my-api-key")
//!     .with_timeout(Duration::from_secs(60))
//!     .with_user_agent("my-app/1.0");
//! let search = HttpPlaceSearch::with_config(config)?;
//!
//! let corner = GeoSquare::new(37.512296, -77.6941, 1.0)?;
//! let region = BoundingRegion::new(corner, corner)?;
//! let report = Sweep::new(&search, &FixedDelay::default(), SweepConfig::new("restaurant"))
//!     .run(&region)?;
//! println!("found {} places", report.places.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod nearby;
mod provider;

pub use nearby::NearbySearchResponse;
pub use provider::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HttpPlaceSearch, HttpPlaceSearchConfig,
    ProviderBuildError,
};
