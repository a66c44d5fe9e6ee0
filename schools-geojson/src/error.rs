//! Types d'erreurs pour le crate schools-geojson

use thiserror::Error;

/// Erreurs pouvant survenir lors du décodage d'une FeatureCollection
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Erreur d'I/O lors de la lecture du document
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document JSON mal formé
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Type de premier niveau différent de `FeatureCollection`
    #[error("Expected a FeatureCollection, found type {found:?}")]
    NotACollection { found: String },

    /// Tableau `features` absent ou invalide
    #[error("Missing or invalid `features` array")]
    MissingFeatures,

    /// Feature structurellement invalide (pas un objet JSON, etc.)
    #[error("Invalid feature at index {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

impl DecodeError {
    /// Crée une erreur de feature invalide avec contexte
    pub fn invalid_feature(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidFeature {
            index,
            reason: reason.into(),
        }
    }
}
