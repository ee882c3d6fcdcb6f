//! Sweep a bounding region: tile it, collect every tile, merge the results.

use log::{info, warn};
use thiserror::Error;

use crate::collect::{CollectorConfig, RecursiveCollector, RegionFailure};
use crate::tiling::{TilingConfig, TilingError, tile};
use crate::{BoundingRegion, PlaceSearch, RateLimiter, ResultSet};

/// Parameters for a [`Sweep`].
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Starting grid layout; its degree conversion is also used for splits.
    pub tiling: TilingConfig,
    /// Per-square collection settings.
    pub collector: CollectorConfig,
}

impl SweepConfig {
    /// Reference configuration searching for `keyword`.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            tiling: TilingConfig::default(),
            collector: CollectorConfig::new(keyword),
        }
    }
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Deduplicated places from every successful region.
    pub places: ResultSet,
    /// Number of starting squares searched.
    pub squares_searched: usize,
    /// Regions that could not be fully enumerated.
    pub failures: Vec<RegionFailure>,
}

impl SweepReport {
    /// Whether every starting square was enumerated without failures.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Destination for the final deduplicated places.
pub trait ResultSink {
    /// Error raised when the export fails.
    type Error: std::error::Error + 'static;

    /// Persist `places`.
    fn export(&self, places: &ResultSet) -> Result<(), Self::Error>;
}

impl<T: ResultSink + ?Sized> ResultSink for &T {
    type Error = T::Error;

    fn export(&self, places: &ResultSet) -> Result<(), Self::Error> {
        (**self).export(places)
    }
}

/// Errors from [`Sweep::run`] and [`Sweep::run_into`].
#[derive(Debug, Error)]
pub enum SweepError<E: std::error::Error + 'static> {
    /// The starting grid could not be built.
    #[error(transparent)]
    Tiling(#[from] TilingError),
    /// The sink rejected the results.
    #[error("failed to export results: {0}")]
    Export(#[source] E),
}

/// Drives one sweep over a bounding region.
///
/// # Examples
///
/// ```
/// use placesweep_core::{
///     BoundingRegion, GeoSquare, SearchPage, Sweep, SweepConfig, Unthrottled,
///     test_support::{ScriptedSearch, places},
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let corner = GeoSquare::new(37.5, -77.5, 1.0)?;
/// let region = BoundingRegion::new(corner, corner)?;
/// let search = ScriptedSearch::new([Ok(SearchPage::last(places("e", 1..=45)))]);
///
/// let report = Sweep::new(&search, &Unthrottled, SweepConfig::new("restaurant")).run(&region)?;
/// assert_eq!(report.places.len(), 45);
/// assert!(report.is_complete());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Sweep<'a, S: ?Sized, L: ?Sized> {
    search: &'a S,
    limiter: &'a L,
    config: SweepConfig,
}

impl<'a, S, L> Sweep<'a, S, L>
where
    S: PlaceSearch + ?Sized,
    L: RateLimiter + ?Sized,
{
    /// Construct a sweep issuing queries through `search`.
    pub fn new(search: &'a S, limiter: &'a L, config: SweepConfig) -> Self {
        Self {
            search,
            limiter,
            config,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Tile `region` and collect every starting square in order.
    ///
    /// Failed regions are logged and listed in the report; places from every
    /// other region are still returned.
    ///
    /// # Errors
    ///
    /// Returns [`TilingError`] when the tiling configuration is invalid.
    pub fn run(&self, region: &BoundingRegion) -> Result<SweepReport, TilingError> {
        let squares = tile(region, &self.config.tiling)?;
        let collector = RecursiveCollector::new(
            self.search,
            self.limiter,
            &self.config.collector,
            self.config.tiling.degrees,
        );

        let mut report = SweepReport {
            squares_searched: squares.len(),
            ..SweepReport::default()
        };
        for square in &squares {
            let collected = collector.collect(square);
            report.places.merge(collected.places);
            report.failures.extend(collected.failures);
        }

        for failure in &report.failures {
            warn!("incomplete coverage for {failure}");
        }
        info!(
            "found {} unique places in {} squares ({} failed regions)",
            report.places.len(),
            report.squares_searched,
            report.failures.len()
        );
        Ok(report)
    }

    /// Run the sweep and hand the merged places to `sink`.
    ///
    /// The export happens even when some regions failed.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Tiling`] for an invalid grid and
    /// [`SweepError::Export`] when the sink fails.
    pub fn run_into<K: ResultSink>(
        &self,
        region: &BoundingRegion,
        sink: &K,
    ) -> Result<SweepReport, SweepError<K::Error>> {
        let report = self.run(region)?;
        sink.export(&report.places).map_err(SweepError::Export)?;
        Ok(report)
    }
}
