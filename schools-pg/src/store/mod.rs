//! Stockage des écoles (PostGIS ou mémoire)
//!
//! Le chargeur ne connaît que les traits [`RecordStore`] et
//! [`StoreTransaction`]: la portée de la transaction (tout ou rien) est
//! décidée ici, pas dans le décodage ni la coercition.

pub mod memory;
pub mod pool;
pub mod postgres;

use async_trait::async_trait;
use geo::Point;
use thiserror::Error;

use schools_geojson::SchoolRecord;

pub use memory::MemoryStore;
pub use pool::{create_pool, DatabaseConfig, SslMode};
pub use postgres::PgStore;

/// Erreurs remontées par la couche de stockage
#[derive(Debug, Error)]
pub enum StoreError {
    /// Erreur renvoyée par PostgreSQL (contrainte, type, connexion...)
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Impossible d'obtenir une connexion du pool
    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Instruction refusée par le stockage
    #[error("Statement rejected: {message}")]
    Rejected { message: String },

    /// Transaction utilisée après commit ou rollback
    #[error("Transaction already finished")]
    Finished,
}

/// Une école telle que stockée
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSchool {
    /// Identifiant généré par le stockage
    pub id: i64,
    pub record: SchoolRecord,
    /// Colonne géométrique (None tant qu'elle n'a pas été renseignée)
    pub location: Option<Point<f64>>,
}

/// Stockage capable d'ouvrir une transaction d'import
#[async_trait]
pub trait RecordStore: Send {
    /// Ouvre une transaction et prépare les instructions d'insertion et de
    /// positionnement.
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn StoreTransaction + 'a>, StoreError>;
}

/// Transaction ouverte sur un stockage
///
/// Dropper une transaction non terminée l'annule.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Insère une école; un conflit sur `object_id` n'insère rien et
    /// retourne 0.
    async fn insert(&mut self, record: &SchoolRecord) -> Result<u64, StoreError>;

    /// Renseigne la géométrie de la (des) ligne(s) portant cet `object_id`.
    async fn set_location(&mut self, object_id: i64, location: Point<f64>)
        -> Result<u64, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}
