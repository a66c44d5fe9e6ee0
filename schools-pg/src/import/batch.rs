//! Transaction atomique pour un import
//!
//! Un `ImportBatch` possède la transaction ouverte et le compteur
//! d'enregistrements. Il se termine par un commit unique ou par un rollback
//! complet; un batch droppé sans commit est annulé par le stockage.

use geo::Point;
use tracing::{error, info};

use schools_geojson::SchoolRecord;

use super::{ImportError, Stage};
use crate::store::{RecordStore, StoreError, StoreTransaction};

/// Import en cours sur une transaction
pub struct ImportBatch<'a> {
    transaction: Box<dyn StoreTransaction + 'a>,
    source: String,
    persisted: usize,
}

impl<'a> ImportBatch<'a> {
    /// Démarre une nouvelle transaction d'import
    ///
    /// # Arguments
    /// * `store` - Stockage (reste réservé pendant toute la transaction)
    /// * `source` - Libellé de la source, pour les logs
    ///
    /// # Errors
    /// Retourne `ImportError::Begin` si la transaction ou la préparation
    /// des instructions échoue
    pub async fn begin<S>(store: &'a mut S, source: &str) -> Result<Self, ImportError>
    where
        S: RecordStore + ?Sized,
    {
        let transaction = store.begin().await.map_err(ImportError::Begin)?;

        info!(source = %source, "Starting school import transaction");

        Ok(Self {
            transaction,
            source: source.to_string(),
            persisted: 0,
        })
    }

    /// Insère une école puis renseigne sa géométrie.
    ///
    /// Le compteur avance dès que les deux instructions réussissent, même
    /// si l'insertion a été ignorée pour conflit de clé naturelle.
    pub async fn persist(
        &mut self,
        index: usize,
        record: &SchoolRecord,
        location: Point<f64>,
    ) -> Result<(), ImportError> {
        let store_error = |stage: Stage| {
            move |source: StoreError| ImportError::Store {
                stage,
                index,
                object_id: record.object_id,
                source,
            }
        };

        self.transaction
            .insert(record)
            .await
            .map_err(store_error(Stage::Insert))?;

        self.transaction
            .set_location(record.object_id, location)
            .await
            .map_err(store_error(Stage::Locate))?;

        self.persisted += 1;
        Ok(())
    }

    /// Nombre d'enregistrements comptés jusqu'ici
    pub fn persisted(&self) -> usize {
        self.persisted
    }

    /// Valide et commit la transaction
    ///
    /// # Errors
    /// Retourne `ImportError::Commit` si le commit échoue
    pub async fn commit(mut self) -> Result<usize, ImportError> {
        self.transaction
            .commit()
            .await
            .map_err(ImportError::Commit)?;

        info!(
            source = %self.source,
            records = self.persisted,
            "School import committed successfully"
        );

        Ok(self.persisted)
    }

    /// Annule la transaction (rollback)
    ///
    /// Tout le travail du batch est perdu, quel que soit le nombre
    /// d'enregistrements déjà traités.
    pub async fn rollback(mut self, reason: &str) {
        error!(
            source = %self.source,
            reason = %reason,
            records_attempted = self.persisted,
            "Rolling back school import"
        );

        if let Err(e) = self.transaction.rollback().await {
            error!(error = %e, "Explicit rollback failed (will rollback on drop anyway)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn school(object_id: i64) -> SchoolRecord {
        SchoolRecord {
            object_id,
            name: format!("School {object_id}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_commit_returns_count() {
        let mut store = MemoryStore::new();
        let mut batch = ImportBatch::begin(&mut store, "test").await.unwrap();
        batch.persist(0, &school(1), Point::new(1.0, 2.0)).await.unwrap();
        batch.persist(1, &school(1), Point::new(3.0, 4.0)).await.unwrap();
        assert_eq!(batch.persisted(), 2);

        let count = batch.commit().await.unwrap();
        assert_eq!(count, 2, "conflicting keys are still counted");
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_store_error_carries_context() {
        let mut store = MemoryStore::new().fail_on_insert(2);
        let mut batch = ImportBatch::begin(&mut store, "test").await.unwrap();
        batch.persist(0, &school(10), Point::new(0.0, 0.0)).await.unwrap();

        let err = batch
            .persist(4, &school(11), Point::new(0.0, 0.0))
            .await
            .unwrap_err();
        match &err {
            ImportError::Store {
                stage,
                index,
                object_id,
                ..
            } => {
                assert_eq!(*stage, Stage::Insert);
                assert_eq!(*index, 4);
                assert_eq!(*object_id, 11);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        batch.rollback(&err.to_string()).await;
        assert_eq!(store.count(), 0);
    }
}
