//! Sweep command implementation for the placesweep CLI.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use placesweep_core::{
    BoundingRegion, DEFAULT_MAX_DEPTH, DEFAULT_MIN_SIDE_MILES, DEFAULT_PAGE_DELAY,
    DEFAULT_SATURATION_CAP, DEFAULT_TILE_SIDE_MILES, DegreesPerMile, FixedDelay, GeoSquare,
    PlaceSearch, RetryPolicy, Sweep, SweepConfig, SweepError, SweepReport, TileBoundary,
    TilingConfig,
};
use placesweep_data::JsonFileSink;
use placesweep_data::places::{HttpPlaceSearch, HttpPlaceSearchConfig};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_API_KEY, ARG_BASE_URL, ARG_EAST, ARG_KEYWORD, ARG_LAT_DEGREES_PER_MILE,
    ARG_LON_DEGREES_PER_MILE, ARG_MAX_DEPTH, ARG_MIN_SIDE_MILES, ARG_NORTH, ARG_OUTPUT_DIR,
    ARG_PAGE_DELAY_SECS, ARG_RETRY_ATTEMPTS, ARG_RETRY_BACKOFF_SECS, ARG_SATURATION_CAP,
    ARG_SOUTH, ARG_TILE_BOUNDARY, ARG_TILE_SIDE_MILES, ARG_TIMEOUT_SECS, ARG_WEST, CliError,
    ENV_API_KEY,
};

/// Southwest corner of the reference sweep (Richmond, Virginia).
pub(crate) const REFERENCE_SOUTHWEST: (f64, f64) = (37.512_296, -77.694_100);
/// Northeast corner of the reference sweep.
pub(crate) const REFERENCE_NORTHEAST: (f64, f64) = (37.667_687, -77.390_260);
/// Category searched when no keyword is configured.
pub(crate) const DEFAULT_KEYWORD: &str = "restaurant";

/// Treatment of tile centers landing exactly on the northeast bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TileBoundaryArg {
    /// Keep the tile.
    #[default]
    Inclusive,
    /// Drop the tile.
    Exclusive,
}

impl From<TileBoundaryArg> for TileBoundary {
    fn from(value: TileBoundaryArg) -> Self {
        match value {
            TileBoundaryArg::Inclusive => Self::Inclusive,
            TileBoundaryArg::Exclusive => Self::Exclusive,
        }
    }
}

/// CLI arguments for the `sweep` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Tile a bounding region into squares, query the place search \
                 API for each square, split any square whose results hit the \
                 cap, and export the deduplicated places as JSON. Every \
                 setting can come from CLI flags, configuration files, or \
                 environment variables.",
    about = "Sweep a region and export every place found"
)]
#[ortho_config(prefix = "PLACESWEEP")]
pub(crate) struct SweepArgs {
    /// API key for the place search service.
    #[arg(long = ARG_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) api_key: Option<String>,
    /// Latitude of the southwest corner center.
    #[arg(long = ARG_SOUTH, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) south: Option<f64>,
    /// Longitude of the southwest corner center.
    #[arg(long = ARG_WEST, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) west: Option<f64>,
    /// Latitude of the northeast corner center.
    #[arg(long = ARG_NORTH, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) north: Option<f64>,
    /// Longitude of the northeast corner center.
    #[arg(long = ARG_EAST, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) east: Option<f64>,
    /// Side length of each starting tile in miles.
    #[arg(long = ARG_TILE_SIDE_MILES, value_name = "miles")]
    #[serde(default)]
    pub(crate) tile_side_miles: Option<f64>,
    /// Degrees of latitude per mile near the region.
    #[arg(long = ARG_LAT_DEGREES_PER_MILE, value_name = "deg")]
    #[serde(default)]
    pub(crate) lat_degrees_per_mile: Option<f64>,
    /// Degrees of longitude per mile near the region.
    #[arg(long = ARG_LON_DEGREES_PER_MILE, value_name = "deg")]
    #[serde(default)]
    pub(crate) lon_degrees_per_mile: Option<f64>,
    /// Whether a tile centered exactly on the northeast bound is kept.
    #[arg(long = ARG_TILE_BOUNDARY, value_enum)]
    #[serde(default)]
    pub(crate) tile_boundary: Option<TileBoundaryArg>,
    /// Category keyword sent with every query.
    #[arg(long = ARG_KEYWORD, value_name = "word")]
    #[serde(default)]
    pub(crate) keyword: Option<String>,
    /// Result count at which a square is split.
    #[arg(long = ARG_SATURATION_CAP, value_name = "count")]
    #[serde(default)]
    pub(crate) saturation_cap: Option<usize>,
    /// Deepest split allowed below a starting tile.
    #[arg(long = ARG_MAX_DEPTH, value_name = "depth")]
    #[serde(default)]
    pub(crate) max_depth: Option<u32>,
    /// Smallest side length a split may produce.
    #[arg(long = ARG_MIN_SIDE_MILES, value_name = "miles")]
    #[serde(default)]
    pub(crate) min_side_miles: Option<f64>,
    /// Wait before requesting each follow-up page.
    #[arg(long = ARG_PAGE_DELAY_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) page_delay_secs: Option<f64>,
    /// Attempts per region for transient failures, including the first.
    #[arg(long = ARG_RETRY_ATTEMPTS, value_name = "count")]
    #[serde(default)]
    pub(crate) retry_attempts: Option<u32>,
    /// Wait before the first retry; doubled for each later one.
    #[arg(long = ARG_RETRY_BACKOFF_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) retry_backoff_secs: Option<f64>,
    /// Nearby Search endpoint URL.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Directory receiving the `output-{uuid}.json` results file.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
}

impl SweepArgs {
    pub(crate) fn into_settings(self) -> Result<SweepSettings, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SweepSettings::try_from(merged)
    }
}

/// Resolved `sweep` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct SweepSettings {
    /// HTTP search settings, including the API key.
    pub(crate) search: HttpPlaceSearchConfig,
    /// Region to sweep.
    pub(crate) region: BoundingRegion,
    /// Tiling and collection parameters.
    pub(crate) sweep: SweepConfig,
    /// Wait before each follow-up page.
    pub(crate) page_delay: Duration,
    /// Directory receiving the results file.
    pub(crate) output_dir: Utf8PathBuf,
}

fn positive(value: f64, field: &'static str) -> Result<f64, CliError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CliError::InvalidSetting {
            field,
            reason: format!("must be positive and finite, got {value}"),
        })
    }
}

fn seconds(value: f64, field: &'static str) -> Result<Duration, CliError> {
    Duration::try_from_secs_f64(value).map_err(|err| CliError::InvalidSetting {
        field,
        reason: err.to_string(),
    })
}

fn corner(
    (latitude, longitude): (f64, f64),
    side_miles: f64,
    name: &'static str,
) -> Result<GeoSquare, CliError> {
    GeoSquare::new(latitude, longitude, side_miles)
        .map_err(|source| CliError::InvalidCorner { corner: name, source })
}

impl TryFrom<SweepArgs> for SweepSettings {
    type Error = CliError;

    fn try_from(args: SweepArgs) -> Result<Self, Self::Error> {
        let api_key = args
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_API_KEY,
                env: ENV_API_KEY,
            })?;

        let tile_side_miles = positive(
            args.tile_side_miles.unwrap_or(DEFAULT_TILE_SIDE_MILES),
            ARG_TILE_SIDE_MILES,
        )?;
        let degrees = DegreesPerMile::new(
            positive(
                args.lat_degrees_per_mile
                    .unwrap_or(DegreesPerMile::DEFAULT_LATITUDE),
                ARG_LAT_DEGREES_PER_MILE,
            )?,
            positive(
                args.lon_degrees_per_mile
                    .unwrap_or(DegreesPerMile::DEFAULT_LONGITUDE),
                ARG_LON_DEGREES_PER_MILE,
            )?,
        );

        let southwest = corner(
            (
                args.south.unwrap_or(REFERENCE_SOUTHWEST.0),
                args.west.unwrap_or(REFERENCE_SOUTHWEST.1),
            ),
            tile_side_miles,
            "southwest",
        )?;
        let northeast = corner(
            (
                args.north.unwrap_or(REFERENCE_NORTHEAST.0),
                args.east.unwrap_or(REFERENCE_NORTHEAST.1),
            ),
            tile_side_miles,
            "northeast",
        )?;
        let region = BoundingRegion::new(southwest, northeast)?;

        let mut sweep =
            SweepConfig::new(args.keyword.unwrap_or_else(|| DEFAULT_KEYWORD.to_owned()));
        sweep.tiling = TilingConfig {
            tile_side_miles,
            degrees,
            boundary: args.tile_boundary.unwrap_or_default().into(),
        };

        let saturation_cap = args.saturation_cap.unwrap_or(DEFAULT_SATURATION_CAP);
        if saturation_cap == 0 {
            return Err(CliError::InvalidSetting {
                field: ARG_SATURATION_CAP,
                reason: "must be at least 1".to_owned(),
            });
        }
        sweep.collector.saturation_cap = saturation_cap;
        sweep.collector.max_depth = args.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        sweep.collector.min_side_miles = positive(
            args.min_side_miles.unwrap_or(DEFAULT_MIN_SIDE_MILES),
            ARG_MIN_SIDE_MILES,
        )?;
        let default_retry = RetryPolicy::default();
        sweep.collector.retry = RetryPolicy {
            max_attempts: args.retry_attempts.unwrap_or(default_retry.max_attempts),
            initial_backoff: match args.retry_backoff_secs {
                Some(secs) => seconds(secs, ARG_RETRY_BACKOFF_SECS)?,
                None => default_retry.initial_backoff,
            },
        };

        let page_delay = match args.page_delay_secs {
            Some(secs) => seconds(secs, ARG_PAGE_DELAY_SECS)?,
            None => DEFAULT_PAGE_DELAY,
        };

        let mut search = HttpPlaceSearchConfig::new(api_key);
        if let Some(base_url) = args.base_url {
            search = search.with_base_url(base_url);
        }
        if let Some(timeout_secs) = args.timeout_secs {
            if timeout_secs == 0 {
                return Err(CliError::InvalidSetting {
                    field: ARG_TIMEOUT_SECS,
                    reason: "must be at least 1".to_owned(),
                });
            }
            search = search.with_timeout(Duration::from_secs(timeout_secs));
        }

        Ok(Self {
            search,
            region,
            sweep,
            page_delay,
            output_dir: args.output_dir.unwrap_or_else(|| Utf8PathBuf::from(".")),
        })
    }
}

/// Builds the place search used by the current sweep invocation.
pub(super) trait SearchBuilder {
    fn build(&self, settings: &SweepSettings) -> Result<Box<dyn PlaceSearch>, CliError>;
}

pub(super) struct HttpSearchBuilder;

impl SearchBuilder for HttpSearchBuilder {
    fn build(&self, settings: &SweepSettings) -> Result<Box<dyn PlaceSearch>, CliError> {
        let search = HttpPlaceSearch::with_config(settings.search.clone()).map_err(|source| {
            CliError::BuildPlaceSearch {
                base_url: settings.search.base_url.clone(),
                source,
            }
        })?;
        Ok(Box::new(search))
    }
}

/// Region that could not be fully enumerated, as printed in the summary.
#[derive(Debug, Serialize)]
struct FailedRegion {
    origin: String,
    location: String,
    side_miles: f64,
    depth: u32,
    reason: String,
}

/// Run summary printed after the export.
#[derive(Debug, Serialize)]
struct SweepSummary {
    output: Utf8PathBuf,
    places: usize,
    squares_searched: usize,
    failed_regions: Vec<FailedRegion>,
}

impl SweepSummary {
    fn new(output: Utf8PathBuf, report: &SweepReport) -> Self {
        Self {
            output,
            places: report.places.len(),
            squares_searched: report.squares_searched,
            failed_regions: report
                .failures
                .iter()
                .map(|failure| FailedRegion {
                    origin: failure.origin.coordinate_key(),
                    location: failure.square.coordinate_key(),
                    side_miles: failure.square.side_miles(),
                    depth: failure.depth,
                    reason: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

pub(super) fn run_sweep(args: SweepArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_sweep_with(args, &HttpSearchBuilder, &mut stdout)
}

/// Resolve settings, run the sweep, export results and print a summary.
///
/// Results are exported even when some regions failed; the failure is then
/// reported as [`CliError::IncompleteCoverage`] so the process exits non-zero.
pub(super) fn run_sweep_with(
    args: SweepArgs,
    builder: &dyn SearchBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let settings = args.into_settings()?;
    let search = builder.build(&settings)?;
    let limiter = FixedDelay::new(settings.page_delay);
    let sink = JsonFileSink::in_dir(settings.output_dir.clone());
    let path = sink.path();

    info!(
        "sweeping {} .. {} for {:?}",
        settings.region.southwest().coordinate_key(),
        settings.region.northeast().coordinate_key(),
        settings.sweep.collector.keyword
    );
    let report = Sweep::new(search.as_ref(), &limiter, settings.sweep.clone())
        .run_into(&settings.region, &sink)
        .map_err(|err| match err {
            SweepError::Tiling(source) => CliError::Tiling(source),
            SweepError::Export(source) => CliError::Export {
                path: path.clone(),
                source,
            },
        })?;

    write_summary(writer, &SweepSummary::new(path.clone(), &report))?;
    if report.is_complete() {
        Ok(())
    } else {
        Err(CliError::IncompleteCoverage {
            failed: report.failures.len(),
            path,
        })
    }
}

fn write_summary(writer: &mut dyn Write, summary: &SweepSummary) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(summary).map_err(CliError::SerializeSummary)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteSummary)?;
    writer.write_all(b"\n").map_err(CliError::WriteSummary)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn settings_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SweepSettings, CliError> {
    let merged = SweepArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SweepSettings::try_from(merged)
}
