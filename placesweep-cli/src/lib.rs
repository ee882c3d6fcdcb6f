//! Command-line interface for sweeping a region for places.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod sweep;

pub use error::CliError;
use sweep::SweepArgs;

const ARG_API_KEY: &str = "api-key";
const ARG_SOUTH: &str = "south";
const ARG_WEST: &str = "west";
const ARG_NORTH: &str = "north";
const ARG_EAST: &str = "east";
const ARG_TILE_SIDE_MILES: &str = "tile-side-miles";
const ARG_LAT_DEGREES_PER_MILE: &str = "lat-degrees-per-mile";
const ARG_LON_DEGREES_PER_MILE: &str = "lon-degrees-per-mile";
const ARG_TILE_BOUNDARY: &str = "tile-boundary";
const ARG_KEYWORD: &str = "keyword";
const ARG_SATURATION_CAP: &str = "saturation-cap";
const ARG_MAX_DEPTH: &str = "max-depth";
const ARG_MIN_SIDE_MILES: &str = "min-side-miles";
const ARG_PAGE_DELAY_SECS: &str = "page-delay-secs";
const ARG_RETRY_ATTEMPTS: &str = "retry-attempts";
const ARG_RETRY_BACKOFF_SECS: &str = "retry-backoff-secs";
const ARG_BASE_URL: &str = "base-url";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ENV_API_KEY: &str = "PLACESWEEP_CMDS_SWEEP_API_KEY";

/// Run the placesweep CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, the
/// search cannot be built, the export fails, or some region could not be
/// fully enumerated.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Sweep(args) => sweep::run_sweep(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "placesweep",
    about = "Exhaustively enumerate places across a rectangular region",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sweep a bounding region and export every place found.
    Sweep(SweepArgs),
}

#[cfg(test)]
mod tests;
