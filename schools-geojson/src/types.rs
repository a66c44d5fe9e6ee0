//! Types de données pour le crate schools-geojson

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Valeur brute d'une propriété GeoJSON
///
/// Le format source ne type pas ses attributs: un même champ peut arriver
/// en texte, en nombre ou pas du tout. Tout ce qui n'est ni une chaîne ni
/// un nombre (null, booléen, tableau, objet) est ramené à `Absent`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    #[default]
    Absent,
    Text(String),
    Number(f64),
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => PropertyValue::Text(s),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(PropertyValue::Number)
                .unwrap_or(PropertyValue::Absent),
            _ => PropertyValue::Absent,
        }
    }
}

/// Géométrie brute d'une feature, sans validation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawGeometry {
    /// Type déclaré (`Point`, `Polygon`, ...), vide si la géométrie manque
    pub geometry_type: String,

    /// Coordonnées à plat; vide si le tableau n'est pas une liste de nombres
    pub coordinates: Vec<f64>,

    /// Longueur du tableau `coordinates` tel que déclaré dans le document
    pub declared_len: usize,
}

/// Une feature telle que lue dans le document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFeature {
    /// Type déclaré de la feature (normalement `Feature`)
    pub feature_type: String,

    /// Propriétés non typées (clé -> valeur)
    pub properties: HashMap<String, PropertyValue>,

    /// Géométrie brute
    pub geometry: RawGeometry,
}

impl RawFeature {
    /// Retourne la valeur d'une propriété, `Absent` si la clé manque
    pub fn property(&self, key: &str) -> &PropertyValue {
        const ABSENT: &PropertyValue = &PropertyValue::Absent;
        self.properties.get(key).unwrap_or(ABSENT)
    }
}

/// Résultat du décodage d'un document
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    /// Type déclaré de la collection
    pub collection_type: String,

    /// Features dans l'ordre du document
    pub features: Vec<RawFeature>,
}

/// Une école prête à être insérée
///
/// Les champs optionnels valent `None` quand la source est absente, vide,
/// nulle (pour les compteurs) ou illisible.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchoolRecord {
    /// Identifiant stable du système source (clé naturelle)
    pub object_id: i64,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub county: Option<String>,
    pub county_fips: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub level: Option<String>,
    pub start_grade: Option<String>,
    pub end_grade: Option<String>,
    pub enrollment: Option<i64>,
    pub ft_teachers: Option<i64>,
    pub school_type: Option<i64>,
    pub status: Option<i64>,
    pub population: Option<i64>,
    pub nces_id: Option<String>,
    pub district_id: Option<String>,
    pub naics_code: Option<String>,
    pub naics_desc: Option<String>,
    pub website: Option<String>,
    pub telephone: Option<String>,
    pub source_date: Option<DateTime<Utc>>,
    pub validation_date: Option<DateTime<Utc>>,
    pub validation_method: Option<String>,
    pub source: Option<String>,
    pub shelter_id: Option<String>,
}
