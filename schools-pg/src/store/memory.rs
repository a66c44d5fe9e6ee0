//! Stockage en mémoire
//!
//! Reproduit les garanties du stockage PostgreSQL utiles au chargeur:
//! unicité de `object_id` (insertion ignorée en cas de conflit), isolation
//! de la transaction jusqu'au commit, annulation complète au rollback.
//! Sert au mode `--dry-run` et aux tests; une panne peut être simulée sur
//! la N-ième insertion ou le N-ième positionnement.

use std::collections::BTreeMap;

use async_trait::async_trait;
use geo::Point;
use tracing::debug;

use schools_geojson::SchoolRecord;

use super::{RecordStore, StoreError, StoreTransaction, StoredSchool};

/// Stockage en mémoire, indexé par clé naturelle
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: BTreeMap<i64, StoredSchool>,
    next_id: i64,
    fail_on_insert: Option<usize>,
    fail_on_locate: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fait échouer la N-ième insertion (1-based) de chaque transaction
    pub fn fail_on_insert(mut self, nth: usize) -> Self {
        self.fail_on_insert = Some(nth);
        self
    }

    /// Fait échouer le N-ième positionnement (1-based) de chaque transaction
    pub fn fail_on_locate(mut self, nth: usize) -> Self {
        self.fail_on_locate = Some(nth);
        self
    }

    /// Nombre de lignes commitées
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Recherche une école commitée par clé naturelle
    pub fn find_by_object_id(&self, object_id: i64) -> Option<&StoredSchool> {
        self.rows.get(&object_id)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn StoreTransaction + 'a>, StoreError> {
        let working = self.rows.clone();
        let next_id = self.next_id;
        Ok(Box::new(MemoryTransaction {
            store: self,
            working,
            next_id,
            inserts: 0,
            locates: 0,
            finished: false,
        }))
    }
}

/// Copie de travail des lignes, publiée au commit
struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    working: BTreeMap<i64, StoredSchool>,
    next_id: i64,
    inserts: usize,
    locates: usize,
    finished: bool,
}

impl MemoryTransaction<'_> {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.finished {
            return Err(StoreError::Finished);
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction<'_> {
    async fn insert(&mut self, record: &SchoolRecord) -> Result<u64, StoreError> {
        self.ensure_open()?;
        self.inserts += 1;

        if self.store.fail_on_insert == Some(self.inserts) {
            return Err(StoreError::Rejected {
                message: format!("injected failure on insert #{}", self.inserts),
            });
        }

        if self.working.contains_key(&record.object_id) {
            return Ok(0);
        }

        self.next_id += 1;
        self.working.insert(
            record.object_id,
            StoredSchool {
                id: self.next_id,
                record: record.clone(),
                location: None,
            },
        );
        Ok(1)
    }

    async fn set_location(&mut self, object_id: i64, location: Point<f64>) -> Result<u64, StoreError> {
        self.ensure_open()?;
        self.locates += 1;

        if self.store.fail_on_locate == Some(self.locates) {
            return Err(StoreError::Rejected {
                message: format!("injected failure on locate #{}", self.locates),
            });
        }

        match self.working.get_mut(&object_id) {
            Some(row) => {
                row.location = Some(location);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.finished = true;
        self.store.rows = std::mem::take(&mut self.working);
        self.store.next_id = self.next_id;
        debug!(rows = self.store.rows.len(), "Memory transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.finished = true;
        self.working.clear();
        Ok(())
    }
}
