//! Square search regions and the rectangle they are tiled from.
//!
//! Coordinates follow the `geo` convention used throughout the workspace:
//! `x = longitude` and `y = latitude`, both in WGS84 degrees. Side lengths are
//! expressed in miles and converted to degrees with a fixed [`DegreesPerMile`]
//! approximation rather than spherical geometry.

use std::f64::consts::SQRT_2;

use geo::{Coord, Rect};
use thiserror::Error;

/// Metres in one statute mile, as used for the search radius.
pub const METERS_PER_MILE: f64 = 1_609.34;

/// Degrees of latitude and longitude spanned by one mile.
///
/// The defaults are valid near 37.5°N. Callers working at other latitudes
/// must supply their own values; nothing here recomputes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreesPerMile {
    /// Degrees of latitude per mile travelled north.
    pub latitude: f64,
    /// Degrees of longitude per mile travelled east.
    pub longitude: f64,
}

impl DegreesPerMile {
    /// Reference latitude conversion.
    pub const DEFAULT_LATITUDE: f64 = 0.014_472;
    /// Reference longitude conversion.
    pub const DEFAULT_LONGITUDE: f64 = 0.018_519;

    /// Construct a conversion from explicit per-mile degree values.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Default for DegreesPerMile {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATITUDE, Self::DEFAULT_LONGITUDE)
    }
}

/// Errors returned by [`GeoSquare::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoSquareError {
    /// The side length was zero, negative or not finite.
    #[error("square side length must be positive and finite, got {0}")]
    InvalidSide(f64),
    /// A center coordinate was NaN or infinite.
    #[error("square center must be finite, got ({latitude}, {longitude})")]
    NonFiniteCenter {
        /// Supplied latitude.
        latitude: f64,
        /// Supplied longitude.
        longitude: f64,
    },
}

/// A square search region described by its center and side length.
///
/// Squares are immutable values; splitting or stepping always produces a new
/// square.
///
/// # Examples
///
/// ```
/// use placesweep_core::GeoSquare;
///
/// # fn main() -> Result<(), placesweep_core::GeoSquareError> {
/// let square = GeoSquare::new(37.512296, -77.6941, 1.0)?;
/// assert_eq!(square.coordinate_key(), "37.512296,-77.6941");
/// assert!((square.coverage_radius_meters() - 1_137.975).abs() < 0.01);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoSquare {
    center: Coord<f64>,
    side_miles: f64,
}

impl GeoSquare {
    /// Validate and construct a square.
    ///
    /// # Errors
    ///
    /// Returns [`GeoSquareError`] when the side is not a positive finite
    /// number or the center is not finite.
    pub fn new(latitude: f64, longitude: f64, side_miles: f64) -> Result<Self, GeoSquareError> {
        if !(side_miles.is_finite() && side_miles > 0.0) {
            return Err(GeoSquareError::InvalidSide(side_miles));
        }
        if !(latitude.is_finite() && longitude.is_finite()) {
            return Err(GeoSquareError::NonFiniteCenter {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            center: Coord {
                x: longitude,
                y: latitude,
            },
            side_miles,
        })
    }

    /// Build a square from values already known to be valid.
    pub(crate) const fn from_parts(center: Coord<f64>, side_miles: f64) -> Self {
        Self { center, side_miles }
    }

    /// Center of the square (`x = longitude`, `y = latitude`).
    #[must_use]
    pub const fn center(&self) -> Coord<f64> {
        self.center
    }

    /// Latitude of the center in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.center.y
    }

    /// Longitude of the center in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.center.x
    }

    /// Side length in miles.
    #[must_use]
    pub const fn side_miles(&self) -> f64 {
        self.side_miles
    }

    /// Stable `"lat,lon"` string used to address the search API.
    #[must_use]
    pub fn coordinate_key(&self) -> String {
        format!("{},{}", self.center.y, self.center.x)
    }

    /// Radius in metres of the circle circumscribing the square.
    ///
    /// A circular query with this radius always covers the whole square.
    #[must_use]
    pub fn coverage_radius_meters(&self) -> f64 {
        self.side_miles / 2.0 * SQRT_2 * METERS_PER_MILE
    }

    /// Axis-aligned extent of the square in degrees.
    #[must_use]
    pub fn bounds(&self, degrees: &DegreesPerMile) -> Rect<f64> {
        let half_lat = self.side_miles / 2.0 * degrees.latitude;
        let half_lon = self.side_miles / 2.0 * degrees.longitude;
        Rect::new(
            Coord {
                x: self.center.x - half_lon,
                y: self.center.y - half_lat,
            },
            Coord {
                x: self.center.x + half_lon,
                y: self.center.y + half_lat,
            },
        )
    }
}

impl std::fmt::Display for GeoSquare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) side {} mi", self.coordinate_key(), self.side_miles)
    }
}

/// Errors returned by [`BoundingRegion::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoundingRegionError {
    /// The northeast corner lies south or west of the southwest corner.
    #[error("northeast corner must not lie south or west of the southwest corner")]
    InvertedCorners,
}

/// The area of interest for one sweep, given by two opposite corner squares.
///
/// Only the corner centers matter; the tile size comes from the tiling
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    southwest: GeoSquare,
    northeast: GeoSquare,
}

impl BoundingRegion {
    /// Validate and construct a region from its corner squares.
    ///
    /// # Errors
    ///
    /// Returns [`BoundingRegionError::InvertedCorners`] when the corners are
    /// given in the wrong order.
    pub fn new(southwest: GeoSquare, northeast: GeoSquare) -> Result<Self, BoundingRegionError> {
        if northeast.latitude() < southwest.latitude()
            || northeast.longitude() < southwest.longitude()
        {
            return Err(BoundingRegionError::InvertedCorners);
        }
        Ok(Self {
            southwest,
            northeast,
        })
    }

    /// Southwest corner square; tiling starts here.
    #[must_use]
    pub const fn southwest(&self) -> GeoSquare {
        self.southwest
    }

    /// Northeast corner square; tiling stops once past it.
    #[must_use]
    pub const fn northeast(&self) -> GeoSquare {
        self.northeast
    }
}
