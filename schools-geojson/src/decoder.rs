//! Décodage d'une FeatureCollection GeoJSON en features brutes
//!
//! Seule la forme de la collection est vérifiée. Le contenu des features
//! (géométrie, propriétés) est conservé tel quel et jugé plus tard par
//! l'extracteur de géométrie et le moteur de coercition.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::DecodeError;
use crate::types::{FeatureCollection, PropertyValue, RawFeature, RawGeometry};

/// Type attendu au premier niveau du document
pub const COLLECTION_TYPE: &str = "FeatureCollection";

/// Décode un document depuis un fichier
pub fn decode_file(path: &Path) -> Result<FeatureCollection, DecodeError> {
    let file = File::open(path)?;
    decode_reader(BufReader::new(file))
}

/// Décode un document depuis un flux d'octets
pub fn decode_reader<R: Read>(reader: R) -> Result<FeatureCollection, DecodeError> {
    let root: Value = serde_json::from_reader(reader)?;
    decode_value(root)
}

/// Décode un document déjà chargé en mémoire
pub fn decode_slice(bytes: &[u8]) -> Result<FeatureCollection, DecodeError> {
    let root: Value = serde_json::from_slice(bytes)?;
    decode_value(root)
}

fn decode_value(root: Value) -> Result<FeatureCollection, DecodeError> {
    let mut root = match root {
        Value::Object(map) => map,
        other => {
            return Err(DecodeError::NotACollection {
                found: json_kind(&other).to_string(),
            })
        }
    };

    let collection_type = match root.remove("type") {
        Some(Value::String(s)) => s,
        Some(other) => json_kind(&other).to_string(),
        None => String::new(),
    };
    if collection_type != COLLECTION_TYPE {
        return Err(DecodeError::NotACollection {
            found: collection_type,
        });
    }

    let Some(Value::Array(items)) = root.remove("features") else {
        return Err(DecodeError::MissingFeatures);
    };

    let features = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| decode_feature(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(features = features.len(), "Decoded feature collection");

    Ok(FeatureCollection {
        collection_type,
        features,
    })
}

fn decode_feature(index: usize, value: Value) -> Result<RawFeature, DecodeError> {
    let mut object = match value {
        Value::Object(map) => map,
        other => {
            return Err(DecodeError::invalid_feature(
                index,
                format!("expected an object, found {}", json_kind(&other)),
            ))
        }
    };

    let feature_type = match object.remove("type") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };

    let properties: HashMap<String, PropertyValue> = match object.remove("properties") {
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(key, value)| (key, PropertyValue::from(value)))
            .collect(),
        _ => HashMap::new(),
    };

    let geometry = match object.remove("geometry") {
        Some(Value::Object(map)) => decode_geometry(map),
        _ => RawGeometry::default(),
    };

    Ok(RawFeature {
        feature_type,
        properties,
        geometry,
    })
}

/// Garde les coordonnées uniquement si elles forment une liste plate de nombres
/// (cas du Point). Les anneaux de polygones et autres formes imbriquées donnent
/// une liste vide.
fn decode_geometry(mut map: Map<String, Value>) -> RawGeometry {
    let geometry_type = match map.remove("type") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };

    let (coordinates, declared_len) = match map.remove("coordinates") {
        Some(Value::Array(items)) => {
            let flat = items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<f64>>>()
                .unwrap_or_default();
            (flat, items.len())
        }
        _ => (Vec::new(), 0),
    };

    RawGeometry {
        geometry_type,
        coordinates,
        declared_len,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
