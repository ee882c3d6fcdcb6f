//! Adapters connecting the placesweep engine to the outside world.
//!
//! Responsibilities:
//! - Implement [`placesweep_core::PlaceSearch`] over HTTP.
//! - Persist results through [`placesweep_core::ResultSink`] implementations.
//!
//! Boundaries:
//! - Do not encode sweep rules (live in `placesweep-core`).
//! - Keep secrets such as the API key out of errors and logs.

#![forbid(unsafe_code)]

pub mod export;
pub mod places;

pub use export::{ExportError, JsonFileSink};
pub use places::{HttpPlaceSearch, HttpPlaceSearchConfig, ProviderBuildError};
