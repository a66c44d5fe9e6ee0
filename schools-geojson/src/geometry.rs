//! Extraction du point (longitude, latitude) d'une feature

use geo::Point;
use thiserror::Error;

use crate::types::RawGeometry;

/// Type GeoJSON accepté
pub const POINT_TYPE: &str = "Point";

/// Raison pour laquelle une feature est écartée du lot
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometrySkip {
    /// Géométrie d'un autre type que `Point` (ou absente)
    #[error("geometry type {found:?} is not a Point")]
    NotAPoint { found: String },

    /// Moins de deux coordonnées
    #[error("point has {count} coordinate(s), expected at least 2")]
    TooFewCoordinates { count: usize },

    /// Tableau de coordonnées contenant autre chose que des nombres
    #[error("point has {count} coordinate(s) that are not all numbers")]
    NonNumericCoordinates { count: usize },
}

/// Extrait le point d'une géométrie brute.
///
/// Ordre des axes GeoJSON: longitude d'abord, puis latitude. Les
/// coordonnées supplémentaires (altitude) sont ignorées.
pub fn extract_point(geometry: &RawGeometry) -> Result<Point<f64>, GeometrySkip> {
    if geometry.geometry_type != POINT_TYPE {
        return Err(GeometrySkip::NotAPoint {
            found: geometry.geometry_type.clone(),
        });
    }

    if geometry.coordinates.len() != geometry.declared_len {
        return Err(GeometrySkip::NonNumericCoordinates {
            count: geometry.declared_len,
        });
    }

    match geometry.coordinates.as_slice() {
        [lon, lat, ..] => Ok(Point::new(*lon, *lat)),
        other => Err(GeometrySkip::TooFewCoordinates { count: other.len() }),
    }
}
