//! Quadrisection of saturated squares.

use geo::Coord;

use crate::geometry::{DegreesPerMile, GeoSquare};

/// Split `square` into four half-side quadrants.
///
/// Each child is centered a quarter side away from the parent center in both
/// axes, so the four children tile the parent with no gap and no overlap.
/// Children are returned southwest, northwest, southeast, northeast.
///
/// # Examples
///
/// ```
/// use placesweep_core::{DegreesPerMile, GeoSquare, quadrants};
///
/// # fn main() -> Result<(), placesweep_core::GeoSquareError> {
/// let parent = GeoSquare::new(0.0, 0.0, 1.0)?;
/// let children = quadrants(&parent, &DegreesPerMile::default());
/// assert!(children.iter().all(|child| child.side_miles() == 0.5));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn quadrants(square: &GeoSquare, degrees: &DegreesPerMile) -> [GeoSquare; 4] {
    let side = square.side_miles();
    let lat_offset = side / 4.0 * degrees.latitude;
    let lon_offset = side / 4.0 * degrees.longitude;
    let child_side = side / 2.0;
    let center = square.center();
    let child = |dlat: f64, dlon: f64| {
        GeoSquare::from_parts(
            Coord {
                x: center.x + dlon,
                y: center.y + dlat,
            },
            child_side,
        )
    };
    [
        child(-lat_offset, -lon_offset),
        child(lat_offset, -lon_offset),
        child(-lat_offset, lon_offset),
        child(lat_offset, lon_offset),
    ]
}
