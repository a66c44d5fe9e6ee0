//! Rapport d'import
//!
//! Collecte ce qui s'est passé pendant un import (features lues, écartées,
//! comptées) sans influencer le résultat de l'import lui-même.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use schools_geojson::GeometrySkip;

/// Statut global de l'import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportStatus {
    /// Transaction commitée
    Success,
    /// Erreur du stockage: transaction annulée, aucune ligne persistée
    RolledBack,
    /// Document illisible ou transaction impossible à ouvrir
    Failed,
}

/// Motif d'exclusion d'une feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotPoint,
    TooFewCoordinates,
    NonNumericCoordinates,
}

/// Feature écartée avant insertion
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFeature {
    /// Position dans la collection (0-based)
    pub index: usize,
    pub reason: SkipReason,
    /// Message lisible
    pub detail: String,
}

/// Rapport complet d'un import
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Fichier (ou libellé) importé
    pub source: String,
    /// Empreinte BLAKE3 du document (hex)
    pub checksum: Option<String>,
    /// Valeur du champ `type` racine
    pub collection_type: Option<String>,
    /// Import vers le stockage mémoire
    pub dry_run: bool,
    pub status: ImportStatus,
    pub duration_secs: f64,

    /// Nombre de features dans la collection
    pub features_read: usize,
    /// Géométries autres que "Point"
    pub skipped_not_point: usize,
    /// Points avec moins de deux coordonnées
    pub skipped_too_few_coordinates: usize,
    /// Points dont les coordonnées ne sont pas toutes des nombres
    pub skipped_non_numeric_coordinates: usize,
    /// Features ayant atteint l'étape post-insertion (conflits inclus)
    pub records_counted: usize,

    pub skipped: Vec<SkippedFeature>,
    /// Message d'erreur si l'import a échoué
    pub error: Option<String>,
}

impl ImportReport {
    /// Crée un rapport vide pour une source
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            checksum: None,
            collection_type: None,
            dry_run: false,
            status: ImportStatus::Success,
            duration_secs: 0.0,
            features_read: 0,
            skipped_not_point: 0,
            skipped_too_few_coordinates: 0,
            skipped_non_numeric_coordinates: 0,
            records_counted: 0,
            skipped: Vec::new(),
            error: None,
        }
    }

    /// Enregistre une feature écartée
    pub fn record_skip(&mut self, index: usize, skip: &GeometrySkip) {
        let reason = match skip {
            GeometrySkip::NotAPoint { .. } => {
                self.skipped_not_point += 1;
                SkipReason::NotPoint
            }
            GeometrySkip::TooFewCoordinates { .. } => {
                self.skipped_too_few_coordinates += 1;
                SkipReason::TooFewCoordinates
            }
            GeometrySkip::NonNumericCoordinates { .. } => {
                self.skipped_non_numeric_coordinates += 1;
                SkipReason::NonNumericCoordinates
            }
        };
        self.skipped.push(SkippedFeature {
            index,
            reason,
            detail: skip.to_string(),
        });
    }

    /// Enregistre le compte final après commit
    pub fn set_count(&mut self, count: usize) {
        self.records_counted = count;
        self.status = ImportStatus::Success;
        self.error = None;
    }

    /// Marque l'import comme annulé; le compte retombe à zéro
    pub fn mark_rolled_back(&mut self, message: &str) {
        self.status = ImportStatus::RolledBack;
        self.records_counted = 0;
        self.error = Some(message.to_string());
    }

    /// Marque l'import comme échoué avant toute écriture
    pub fn mark_failed(&mut self, message: &str) {
        self.status = ImportStatus::Failed;
        self.records_counted = 0;
        self.error = Some(message.to_string());
    }

    /// Définit la durée de l'import
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Nombre total de features écartées
    pub fn skipped_total(&self) -> usize {
        self.skipped_not_point
            + self.skipped_too_few_coordinates
            + self.skipped_non_numeric_coordinates
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("IMPORT REPORT - {}", self.source);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}{}", self.status, if self.dry_run { " (dry run)" } else { "" });
        println!("Duration: {:.2}s", self.duration_secs);
        if let Some(ref checksum) = self.checksum {
            println!("Checksum: {}", checksum);
        }
        if let Some(ref collection_type) = self.collection_type {
            println!("Collection type: {}", collection_type);
        }

        println!("\n--- SUMMARY ---");
        println!(
            "Features: {} read, {} counted, {} skipped",
            self.features_read,
            self.records_counted,
            self.skipped_total()
        );
        println!(
            "Skipped: {} not a point, {} too few coordinates, {} non-numeric coordinates",
            self.skipped_not_point,
            self.skipped_too_few_coordinates,
            self.skipped_non_numeric_coordinates
        );

        if !self.skipped.is_empty() {
            println!("\n--- SKIPPED ({}) ---", self.skipped.len());
            for s in self.skipped.iter().take(20) {
                println!("  #{}: {}", s.index, s.detail);
            }
            if self.skipped.len() > 20 {
                println!("  ... and {} more", self.skipped.len() - 20);
            }
        }

        if let Some(ref error) = self.error {
            println!("\n--- ERROR ---");
            println!("  {}", error);
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} counted, {} skipped ({:?})",
            self.source,
            self.records_counted,
            self.skipped_total(),
            self.status
        )
    }
}
