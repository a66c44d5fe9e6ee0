//! Import transactionnel des écoles
//!
//! Un import est tout ou rien: les features écartées (géométrie non
//! ponctuelle, coordonnées insuffisantes) ne comptent pas, mais la moindre
//! erreur du stockage annule toute la transaction.

pub mod batch;
pub mod loader;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use schools_geojson::DecodeError;

use crate::store::StoreError;

pub use batch::ImportBatch;
pub use loader::{
    import_features, import_features_with_report, import_file, import_file_with_report,
    ImportOutcome,
};

/// Instruction en cours lors d'une erreur de stockage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Insert,
    Locate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Insert => f.write_str("insert"),
            Stage::Locate => f.write_str("locate"),
        }
    }
}

/// Erreurs d'import
///
/// Toute variante implique qu'aucune ligne n'a été persistée par l'appel.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Document illisible ou mal formé, rien n'a été tenté
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// Impossible d'ouvrir la transaction
    #[error("Failed to begin import transaction: {0}")]
    Begin(#[source] StoreError),

    /// Une instruction a échoué; la transaction a été annulée
    #[error("Failed to {stage} feature #{index} (objectid {object_id}): {source}")]
    Store {
        stage: Stage,
        index: usize,
        object_id: i64,
        #[source]
        source: StoreError,
    },

    /// Le commit final a échoué
    #[error("Failed to commit import: {0}")]
    Commit(#[source] StoreError),
}
