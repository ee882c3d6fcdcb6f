//! Initial grid of search squares covering a bounding region.
//!
//! Tiles are laid out row by row from the southwest corner. Each row walks
//! east one tile width at a time until it passes the northeast longitude plus
//! half a tile; rows step north until they pass the northeast latitude plus
//! half a tile. The half-tile tolerance guarantees the grid covers the region
//! when its extent is not a whole number of tiles.

use geo::Coord;
use thiserror::Error;

use crate::geometry::{BoundingRegion, DegreesPerMile, GeoSquare};

/// Side length used for starting tiles unless configured otherwise.
pub const DEFAULT_TILE_SIDE_MILES: f64 = 1.0;

/// How a tile center lying exactly on the tolerance bound is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileBoundary {
    /// Keep tiles whose center equals the bound.
    #[default]
    Inclusive,
    /// Drop tiles whose center equals the bound.
    Exclusive,
}

impl TileBoundary {
    fn admits(self, position: f64, limit: f64) -> bool {
        match self {
            Self::Inclusive => position <= limit,
            Self::Exclusive => position < limit,
        }
    }
}

/// Parameters for [`tile`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilingConfig {
    /// Side length of each starting tile in miles.
    pub tile_side_miles: f64,
    /// Conversion from miles to degrees near the region.
    pub degrees: DegreesPerMile,
    /// Treatment of centers on the northeast tolerance bound.
    pub boundary: TileBoundary,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            tile_side_miles: DEFAULT_TILE_SIDE_MILES,
            degrees: DegreesPerMile::default(),
            boundary: TileBoundary::default(),
        }
    }
}

/// Errors returned by [`tile`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TilingError {
    /// The tile side was zero, negative or not finite.
    #[error("tile side must be positive and finite, got {0}")]
    InvalidTileSide(f64),
    /// A degrees-per-mile factor was zero, negative or not finite.
    #[error("degrees per mile must be positive and finite, got ({latitude}, {longitude})")]
    InvalidDegrees {
        /// Latitude factor.
        latitude: f64,
        /// Longitude factor.
        longitude: f64,
    },
}

/// Produce the starting squares for `region`, row-major from the southwest.
///
/// A region smaller than one tile in either dimension still yields the tile
/// centered on the southwest corner.
///
/// # Errors
///
/// Returns [`TilingError`] when the tile size or degree conversion would not
/// make progress.
///
/// # Examples
///
/// ```
/// use placesweep_core::{BoundingRegion, GeoSquare, TilingConfig, tile};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let corner = GeoSquare::new(37.5, -77.5, 1.0)?;
/// let region = BoundingRegion::new(corner, corner)?;
/// let tiles = tile(&region, &TilingConfig::default())?;
/// assert_eq!(tiles, vec![corner]);
/// # Ok(())
/// # }
/// ```
pub fn tile(region: &BoundingRegion, config: &TilingConfig) -> Result<Vec<GeoSquare>, TilingError> {
    let side = config.tile_side_miles;
    if !(side.is_finite() && side > 0.0) {
        return Err(TilingError::InvalidTileSide(side));
    }
    let DegreesPerMile {
        latitude,
        longitude,
    } = config.degrees;
    if !(latitude.is_finite() && latitude > 0.0 && longitude.is_finite() && longitude > 0.0) {
        return Err(TilingError::InvalidDegrees {
            latitude,
            longitude,
        });
    }

    let southwest = region.southwest();
    let northeast = region.northeast();
    let step_lat = side * latitude;
    let step_lon = side * longitude;
    let lat_limit = northeast.latitude() + step_lat / 2.0;
    let lon_limit = northeast.longitude() + step_lon / 2.0;

    // Positions come from integer indices so long rows do not drift.
    let mut squares = Vec::new();
    for row in 0_u32.. {
        let lat = southwest.latitude() + f64::from(row) * step_lat;
        if !config.boundary.admits(lat, lat_limit) {
            break;
        }
        for column in 0_u32.. {
            let lon = southwest.longitude() + f64::from(column) * step_lon;
            if !config.boundary.admits(lon, lon_limit) {
                break;
            }
            squares.push(GeoSquare::from_parts(Coord { x: lon, y: lat }, side));
        }
    }
    log::debug!(
        "tiled region {} .. {} into {} squares",
        southwest.coordinate_key(),
        northeast.coordinate_key(),
        squares.len()
    );
    Ok(squares)
}
