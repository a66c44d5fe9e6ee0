//! # schools-pg
//!
//! Import de jeux de données GeoJSON d'écoles vers PostGIS, en une seule
//! transaction par fichier.
//!
//! ## Features
//!
//! - Insertion idempotente sur la clé naturelle `objectid`
//! - Tout ou rien: une erreur du stockage annule tout l'import
//! - Stockage mémoire pour le mode `--dry-run` et les tests
//! - Rapport d'import (console ou JSON)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Créer la table puis importer
//! schools-pg import --path ./us-public-schools.geojson
//!
//! # Vérifier un fichier sans base de données
//! schools-pg import --path ./us-public-schools.geojson --dry-run
//!
//! # Recréer la table
//! schools-pg schema --drop
//! ```

pub mod config;
pub mod import;
pub mod report;
pub mod store;

pub use config::TargetConfig;
pub use import::{import_features, import_file, ImportError, ImportOutcome};
pub use report::{ImportReport, ImportStatus};
pub use store::{create_pool, DatabaseConfig, MemoryStore, PgStore, RecordStore, StoreError};
