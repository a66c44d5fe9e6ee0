//! Coercition des propriétés non typées vers un `SchoolRecord`
//!
//! Chaque champ suit une règle nommée. Aucune règle n'échoue: une valeur
//! illisible devient un champ non renseigné et l'enregistrement est
//! toujours produit.
//!
//! Deux règles confondent volontairement « absent » et « vide »:
//! - [`non_empty_text`]: une chaîne vide devient `None`
//! - [`non_zero_integer`]: un nombre nul devient `None`
//!
//! Les lignes déjà chargées dépendent de cette convention: ne pas la
//! corriger ici.

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::types::{PropertyValue, RawFeature, SchoolRecord};

/// Clés des propriétés dans le document source
pub mod keys {
    pub const OBJECT_ID: &str = "objectid";
    pub const NAME: &str = "name";
    pub const ADDRESS: &str = "address";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const ZIP: &str = "zip";
    pub const COUNTRY: &str = "country";
    pub const COUNTY: &str = "county";
    pub const COUNTY_FIPS: &str = "countyfips";
    pub const LEVEL: &str = "level";
    pub const START_GRADE: &str = "st_grade";
    pub const END_GRADE: &str = "end_grade";
    pub const ENROLLMENT: &str = "enrollment";
    pub const FT_TEACHER: &str = "ft_teacher";
    pub const TYPE: &str = "type";
    pub const STATUS: &str = "status";
    pub const POPULATION: &str = "population";
    pub const NCES_ID: &str = "ncesid";
    pub const DISTRICT_ID: &str = "districtid";
    pub const NAICS_CODE: &str = "naics_code";
    pub const NAICS_DESC: &str = "naics_desc";
    pub const WEBSITE: &str = "website";
    pub const TELEPHONE: &str = "telephone";
    pub const SOURCE_DATE: &str = "sourcedate";
    pub const VAL_DATE: &str = "val_date";
    pub const VAL_METHOD: &str = "val_method";
    pub const SOURCE: &str = "source";
    pub const SHELTER_ID: &str = "shelter_id";
}

/// Construit un `SchoolRecord` depuis les propriétés d'une feature.
///
/// La latitude et la longitude restent à zéro: elles sont renseignées par
/// l'extracteur de géométrie.
pub fn coerce(feature: &RawFeature) -> SchoolRecord {
    let text = |key: &str| non_empty_text(feature.property(key));
    let integer = |key: &str| non_zero_integer(feature.property(key));
    let time = |key: &str| timestamp(feature.property(key));

    let record = SchoolRecord {
        object_id: natural_key(feature.property(keys::OBJECT_ID)),
        name: required_text(feature.property(keys::NAME)),
        address: text(keys::ADDRESS),
        city: text(keys::CITY),
        state: text(keys::STATE),
        zip: text(keys::ZIP),
        country: text(keys::COUNTRY),
        county: text(keys::COUNTY),
        county_fips: text(keys::COUNTY_FIPS),
        latitude: 0.0,
        longitude: 0.0,
        level: text(keys::LEVEL),
        start_grade: text(keys::START_GRADE),
        end_grade: text(keys::END_GRADE),
        enrollment: integer(keys::ENROLLMENT),
        ft_teachers: integer(keys::FT_TEACHER),
        school_type: integer(keys::TYPE),
        status: integer(keys::STATUS),
        population: integer(keys::POPULATION),
        nces_id: text(keys::NCES_ID),
        district_id: text(keys::DISTRICT_ID),
        naics_code: text(keys::NAICS_CODE),
        naics_desc: text(keys::NAICS_DESC),
        website: text(keys::WEBSITE),
        telephone: text(keys::TELEPHONE),
        source_date: time(keys::SOURCE_DATE),
        validation_date: time(keys::VAL_DATE),
        validation_method: text(keys::VAL_METHOD),
        source: text(keys::SOURCE),
        shelter_id: text(keys::SHELTER_ID),
    };

    trace!(object_id = record.object_id, name = %record.name, "Coerced feature");
    record
}

/// Clé naturelle: nombre (tronqué) ou entier encodé en texte, sinon 0.
///
/// Les décodeurs JSON génériques livrent les entiers en flottant, d'où
/// l'acceptation des deux formes.
pub fn natural_key(value: &PropertyValue) -> i64 {
    match value {
        PropertyValue::Number(n) => *n as i64,
        PropertyValue::Text(s) => s.parse::<i64>().unwrap_or(0),
        PropertyValue::Absent => 0,
    }
}

/// Nom de l'école, copié tel quel; chaîne vide si absent.
pub fn required_text(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Text(s) => s.clone(),
        _ => String::new(),
    }
}

/// Règle « vide = absent »: seule une chaîne non vide est conservée.
pub fn non_empty_text(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Text(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Règle « zéro = absent »: seul un nombre non nul est conservé (tronqué).
pub fn non_zero_integer(value: &PropertyValue) -> Option<i64> {
    match value {
        PropertyValue::Number(n) if *n != 0.0 => Some(*n as i64),
        _ => None,
    }
}

/// Horodatage RFC 3339 (`2006-01-02T15:04:05Z07:00`), normalisé en UTC.
///
/// Un texte illisible est ignoré sans erreur.
pub fn timestamp(value: &PropertyValue) -> Option<DateTime<Utc>> {
    let PropertyValue::Text(s) = value else {
        return None;
    };
    match DateTime::parse_from_rfc3339(s) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            trace!(value = %s, error = %e, "Unparseable timestamp left unset");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn text(s: &str) -> PropertyValue {
        PropertyValue::Text(s.to_string())
    }

    fn feature(props: &[(&str, PropertyValue)]) -> RawFeature {
        RawFeature {
            feature_type: "Feature".to_string(),
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_natural_key_forms() {
        assert_eq!(natural_key(&PropertyValue::Number(1042.0)), 1042);
        assert_eq!(natural_key(&PropertyValue::Number(7.9)), 7);
        assert_eq!(natural_key(&text("1042")), 1042);
        assert_eq!(natural_key(&text("-3")), -3);
        assert_eq!(natural_key(&text("12a")), 0);
        assert_eq!(natural_key(&text("")), 0);
        assert_eq!(natural_key(&PropertyValue::Absent), 0);
    }

    #[test]
    fn test_empty_string_is_absent() {
        assert_eq!(non_empty_text(&text("Main St")), Some("Main St".to_string()));
        assert_eq!(non_empty_text(&text("")), None);
        assert_eq!(non_empty_text(&PropertyValue::Absent), None);
        // Un nombre ne remplit pas un champ texte
        assert_eq!(non_empty_text(&PropertyValue::Number(94110.0)), None);
    }

    #[test]
    fn test_zero_is_absent() {
        assert_eq!(non_zero_integer(&PropertyValue::Number(512.0)), Some(512));
        assert_eq!(non_zero_integer(&PropertyValue::Number(-1.0)), Some(-1));
        assert_eq!(non_zero_integer(&PropertyValue::Number(0.0)), None);
        assert_eq!(non_zero_integer(&PropertyValue::Absent), None);
        // Un entier encodé en texte n'est pas un nombre
        assert_eq!(non_zero_integer(&text("512")), None);
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2019, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(timestamp(&text("2019-03-05T00:00:00Z")), Some(expected));
        assert_eq!(timestamp(&text("2019-03-04T19:00:00-05:00")), Some(expected));
        assert!(timestamp(&text("2019-03-05T00:00:00.250Z")).is_some());
    }

    #[test]
    fn test_malformed_timestamp_is_unset() {
        assert_eq!(timestamp(&text("2019/03/05")), None);
        assert_eq!(timestamp(&text("2019-03-05")), None);
        assert_eq!(timestamp(&text("")), None);
        assert_eq!(timestamp(&PropertyValue::Number(1551744000.0)), None);
    }

    #[test]
    fn test_coerce_full_feature() {
        let raw = feature(&[
            (keys::OBJECT_ID, PropertyValue::Number(77.0)),
            (keys::NAME, text("Roosevelt Elementary")),
            (keys::CITY, text("Denver")),
            (keys::ZIP, text("")),
            (keys::ENROLLMENT, PropertyValue::Number(430.0)),
            (keys::FT_TEACHER, PropertyValue::Number(0.0)),
            (keys::TYPE, PropertyValue::Number(1.0)),
            (keys::SOURCE_DATE, text("2020-01-15T00:00:00Z")),
            (keys::VAL_DATE, text("not a date")),
            (keys::SHELTER_ID, text("NOT AVAILABLE")),
        ]);

        let record = coerce(&raw);
        assert_eq!(record.object_id, 77);
        assert_eq!(record.name, "Roosevelt Elementary");
        assert_eq!(record.city.as_deref(), Some("Denver"));
        assert_eq!(record.zip, None);
        assert_eq!(record.address, None);
        assert_eq!(record.enrollment, Some(430));
        assert_eq!(record.ft_teachers, None);
        assert_eq!(record.school_type, Some(1));
        assert!(record.source_date.is_some());
        assert_eq!(record.validation_date, None);
        assert_eq!(record.shelter_id.as_deref(), Some("NOT AVAILABLE"));
        assert_eq!(record.latitude, 0.0);
        assert_eq!(record.longitude, 0.0);
    }

    #[test]
    fn test_coerce_empty_properties() {
        let record = coerce(&feature(&[]));
        assert_eq!(record, SchoolRecord::default());
    }
}
