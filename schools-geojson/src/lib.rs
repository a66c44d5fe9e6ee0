//! # schools-geojson
//!
//! Décodage des jeux de données GeoJSON d'écoles (points) et coercition de
//! leurs propriétés non typées vers un schéma strict.
//!
//! ## Étapes
//!
//! - [`decoder`]: document -> `FeatureCollection` de features brutes
//! - [`coerce`]: propriétés -> `SchoolRecord` (champs `Option`)
//! - [`geometry`]: coordonnées -> point (longitude, latitude)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schools_geojson::{parse, to_record};
//! use std::path::Path;
//!
//! let collection = parse(Path::new("us-public-schools.geojson"))?;
//! for feature in &collection.features {
//!     match to_record(feature) {
//!         Ok(school) => println!("{} ({})", school.name, school.object_id),
//!         Err(skip) => println!("skipped: {skip}"),
//!     }
//! }
//! ```

pub mod coerce;
pub mod decoder;
pub mod error;
pub mod geometry;
pub mod types;

pub use error::DecodeError;
pub use geometry::GeometrySkip;
pub use types::{FeatureCollection, PropertyValue, RawFeature, RawGeometry, SchoolRecord};

use std::path::Path;

/// Décode un fichier GeoJSON.
///
/// # Errors
///
/// Retourne `DecodeError` si le fichier est illisible, si le JSON est mal
/// formé ou si le document n'est pas une FeatureCollection.
pub fn parse(path: &Path) -> Result<FeatureCollection, DecodeError> {
    decoder::decode_file(path)
}

/// Transforme une feature en `SchoolRecord` positionné.
///
/// La géométrie est vérifiée d'abord: une feature écartée n'est pas
/// coercée.
pub fn to_record(feature: &RawFeature) -> Result<SchoolRecord, GeometrySkip> {
    let point = geometry::extract_point(&feature.geometry)?;
    let mut record = coerce::coerce(feature);
    record.longitude = point.x();
    record.latitude = point.y();
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_record_sets_position() {
        let doc = br#"{"type": "FeatureCollection", "features": [
            {"type": "Feature",
             "properties": {"objectid": "501", "name": "Hillcrest"},
             "geometry": {"type": "Point", "coordinates": [-97.74, 30.27]}},
            {"type": "Feature",
             "properties": {"objectid": "502", "name": "Nowhere"},
             "geometry": {"type": "Point", "coordinates": [-97.74]}}
        ]}"#;

        let collection = decoder::decode_slice(doc).unwrap();
        let school = to_record(&collection.features[0]).unwrap();
        assert_eq!(school.object_id, 501);
        assert_eq!(school.longitude, -97.74);
        assert_eq!(school.latitude, 30.27);

        assert_eq!(
            to_record(&collection.features[1]),
            Err(GeometrySkip::TooFewCoordinates { count: 1 })
        );
    }
}
