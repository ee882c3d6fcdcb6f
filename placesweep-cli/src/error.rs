//! Error types emitted by the placesweep CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use placesweep_core::{BoundingRegionError, GeoSquareError, TilingError};
use placesweep_data::{ExportError, ProviderBuildError};
use thiserror::Error;

/// Errors emitted by the placesweep CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A numeric option is out of range.
    #[error("invalid {field}: {reason}")]
    InvalidSetting {
        field: &'static str,
        reason: String,
    },
    /// A region corner could not be built from the configured coordinates.
    #[error("invalid {corner} corner: {source}")]
    InvalidCorner {
        corner: &'static str,
        #[source]
        source: GeoSquareError,
    },
    /// The corners do not describe a region.
    #[error(transparent)]
    InvalidRegion(#[from] BoundingRegionError),
    /// The starting grid could not be built.
    #[error(transparent)]
    Tiling(#[from] TilingError),
    /// Constructing the HTTP place search failed.
    #[error("failed to build place search for {base_url:?}: {source}")]
    BuildPlaceSearch {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// Writing the results file failed.
    #[error("failed to export results to {path:?}: {source}")]
    Export {
        path: Utf8PathBuf,
        #[source]
        source: ExportError,
    },
    /// Serializing the run summary failed.
    #[error("failed to serialize sweep summary: {0}")]
    SerializeSummary(#[source] serde_json::Error),
    /// Writing the run summary failed.
    #[error("failed to write sweep summary: {0}")]
    WriteSummary(#[source] std::io::Error),
    /// Results were exported but some regions were not fully enumerated.
    #[error("{failed} region(s) could not be fully enumerated; partial results written to {path:?}")]
    IncompleteCoverage { failed: usize, path: Utf8PathBuf },
}
