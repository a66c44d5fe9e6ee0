//! Chargement d'une collection dans un stockage
//!
//! Ordre par feature: géométrie, coercition, insertion, positionnement.
//! Une feature écartée n'atteint jamais le stockage et n'est pas comptée.

use std::path::Path;
use std::time::Instant;

use geo::Point;
use tracing::{debug, info, trace};

use schools_geojson::{decoder, to_record, DecodeError, RawFeature};

use super::{ImportBatch, ImportError};
use crate::report::ImportReport;
use crate::store::RecordStore;

/// Résultat d'un import commité
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Features ayant atteint l'étape post-insertion, conflits de clé inclus
    pub count: usize,
    pub report: ImportReport,
}

/// Importe un fichier GeoJSON dans une seule transaction.
///
/// # Errors
/// `ImportError::Decode` si le fichier est illisible (rien n'est tenté),
/// sinon toute erreur du stockage après rollback complet.
pub async fn import_file<S>(store: &mut S, path: &Path) -> Result<ImportOutcome, ImportError>
where
    S: RecordStore + ?Sized,
{
    let mut report = ImportReport::new(&path.display().to_string());
    let count = import_file_with_report(store, path, &mut report).await?;
    Ok(ImportOutcome { count, report })
}

/// Comme [`import_file`], en remplissant un rapport fourni par l'appelant.
///
/// Le rapport reste exploitable en cas d'erreur (statut, message).
pub async fn import_file_with_report<S>(
    store: &mut S,
    path: &Path,
    report: &mut ImportReport,
) -> Result<usize, ImportError>
where
    S: RecordStore + ?Sized,
{
    let started_at = Instant::now();
    let decode_error = |source: DecodeError| ImportError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = decode_error(DecodeError::Io(e));
            report.mark_failed(&err.to_string());
            return Err(err);
        }
    };
    report.checksum = Some(hex::encode(blake3::hash(&bytes).as_bytes()));

    let collection = match decoder::decode_slice(&bytes) {
        Ok(collection) => collection,
        Err(e) => {
            let err = decode_error(e);
            report.mark_failed(&err.to_string());
            return Err(err);
        }
    };
    drop(bytes);

    info!(
        path = %path.display(),
        features = collection.features.len(),
        checksum = report.checksum.as_deref().unwrap_or_default(),
        "Decoded feature collection"
    );
    report.collection_type = Some(collection.collection_type.clone());

    let result = import_features_with_report(store, &collection.features, report).await;
    report.set_duration(started_at.elapsed());
    result
}

/// Importe des features déjà décodées dans une seule transaction.
///
/// `source` ne sert qu'aux logs et au rapport.
pub async fn import_features<S>(
    store: &mut S,
    features: &[RawFeature],
    source: &str,
) -> Result<ImportOutcome, ImportError>
where
    S: RecordStore + ?Sized,
{
    let mut report = ImportReport::new(source);
    let count = import_features_with_report(store, features, &mut report).await?;
    Ok(ImportOutcome { count, report })
}

/// Cœur du chargeur: un begin, N insertions, un commit (ou un rollback).
pub async fn import_features_with_report<S>(
    store: &mut S,
    features: &[RawFeature],
    report: &mut ImportReport,
) -> Result<usize, ImportError>
where
    S: RecordStore + ?Sized,
{
    let started_at = Instant::now();
    report.features_read = features.len();

    let mut batch = match ImportBatch::begin(store, &report.source).await {
        Ok(batch) => batch,
        Err(e) => {
            report.mark_failed(&e.to_string());
            return Err(e);
        }
    };

    for (index, feature) in features.iter().enumerate() {
        let record = match to_record(feature) {
            Ok(record) => record,
            Err(skip) => {
                debug!(index, reason = %skip, "Skipping feature");
                report.record_skip(index, &skip);
                continue;
            }
        };

        let location = Point::new(record.longitude, record.latitude);
        let persisted = batch.persist(index, &record, location).await;
        if let Err(e) = persisted {
            let message = e.to_string();
            batch.rollback(&message).await;
            report.mark_rolled_back(&message);
            report.set_duration(started_at.elapsed());
            return Err(e);
        }
        trace!(index, object_id = record.object_id, "Feature persisted");
    }

    let count = match batch.commit().await {
        Ok(count) => count,
        Err(e) => {
            report.mark_rolled_back(&e.to_string());
            report.set_duration(started_at.elapsed());
            return Err(e);
        }
    };

    report.set_count(count);
    report.set_duration(started_at.elapsed());

    info!(
        source = %report.source,
        count,
        skipped = report.skipped_total(),
        "Import finished"
    );

    Ok(count)
}
