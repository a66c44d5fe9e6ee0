//! Stockage PostgreSQL/PostGIS

use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Object, Pool, Transaction};
use geo::Point;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Row, Statement};
use tracing::{info, trace, warn};

use schools_geojson::SchoolRecord;

use super::{RecordStore, StoreError, StoreTransaction, StoredSchool};
use crate::config::{TargetConfig, SRID};

/// Colonnes attributaires, dans l'ordre des paramètres de l'INSERT
const RECORD_COLUMNS: [&str; 30] = [
    "objectid", "name", "address", "city", "state", "zip", "country", "county", "countyfips",
    "latitude", "longitude", "level", "st_grade", "end_grade", "enrollment", "ft_teacher",
    "type", "status", "population", "ncesid", "districtid", "naics_code", "naics_desc",
    "website", "telephone", "sourcedate", "val_date", "val_method", "source", "shelter_id",
];

/// Crée l'extension PostGIS, la table et ses index (idempotent)
pub async fn create_schema(pool: &Pool, target: &TargetConfig, drop_existing: bool) -> Result<()> {
    let client = pool.get().await?;
    let table = target.qualified_table();

    // Activer PostGIS si nécessaire (peut nécessiter des droits superuser).
    // Si l'extension existe déjà mais que l'utilisateur ne peut pas la (re)créer,
    // on dégrade gracieusement.
    match client
        .execute("CREATE EXTENSION IF NOT EXISTS postgis", &[])
        .await
    {
        Ok(_) => {}
        Err(e) => {
            warn!("CREATE EXTENSION postgis failed (will check if already installed): {e}");
            let exists = client
                .query_opt("SELECT 1 FROM pg_extension WHERE extname = 'postgis'", &[])
                .await
                .context("Failed to check pg_extension")?
                .is_some();
            if !exists {
                return Err(anyhow::anyhow!(
                    "PostGIS extension is not installed and could not be created: {e}"
                ));
            }
        }
    }

    client
        .execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", target.schema), &[])
        .await
        .context("Failed to create schema")?;

    if drop_existing {
        client
            .execute(&format!("DROP TABLE IF EXISTS {} CASCADE", table), &[])
            .await
            .with_context(|| format!("Failed to drop table {}", table))?;
    }

    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id BIGSERIAL PRIMARY KEY,
            objectid BIGINT NOT NULL,
            name TEXT NOT NULL,
            address TEXT,
            city TEXT,
            state TEXT,
            zip TEXT,
            country TEXT,
            county TEXT,
            countyfips TEXT,
            latitude DOUBLE PRECISION NOT NULL DEFAULT 0,
            longitude DOUBLE PRECISION NOT NULL DEFAULT 0,
            level TEXT,
            st_grade TEXT,
            end_grade TEXT,
            enrollment BIGINT,
            ft_teacher BIGINT,
            type BIGINT,
            status BIGINT,
            population BIGINT,
            ncesid TEXT,
            districtid TEXT,
            naics_code TEXT,
            naics_desc TEXT,
            website TEXT,
            telephone TEXT,
            sourcedate TIMESTAMPTZ,
            val_date TIMESTAMPTZ,
            val_method TEXT,
            source TEXT,
            shelter_id TEXT,
            location geometry(Point, {srid}),
            created_at TIMESTAMPTZ DEFAULT NOW(),
            updated_at TIMESTAMPTZ DEFAULT NOW(),
            CONSTRAINT {name}_objectid_unique UNIQUE (objectid)
        )
        "#,
        table = table,
        srid = SRID,
        name = target.table,
    );

    client
        .execute(&sql, &[])
        .await
        .with_context(|| format!("Failed to create table {}", table))?;

    // Index spatial
    client
        .execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_location ON {} USING GIST (location)",
                target.table, table
            ),
            &[],
        )
        .await
        .with_context(|| format!("Failed to create location index on {}", table))?;

    info!("Table {} ready", table);
    Ok(())
}

/// Stockage PostgreSQL tenant une connexion dédiée
///
/// La connexion reste réservée à ce stockage tant qu'il vit: un import
/// l'occupe pendant toute sa transaction.
pub struct PgStore {
    client: Object,
    target: TargetConfig,
}

impl PgStore {
    /// Réserve une connexion du pool
    pub async fn connect(pool: &Pool, target: &TargetConfig) -> Result<Self, StoreError> {
        let client = pool.get().await?;
        Ok(Self {
            client,
            target: target.clone(),
        })
    }

    /// Nombre de lignes de la table
    pub async fn count(&self) -> Result<i64, StoreError> {
        let row = self
            .client
            .query_one(
                &format!("SELECT COUNT(*) FROM {}", self.target.qualified_table()),
                &[],
            )
            .await?;
        Ok(row.get(0))
    }

    /// Recherche une école par clé naturelle
    pub async fn find_by_object_id(&self, object_id: i64) -> Result<Option<StoredSchool>, StoreError> {
        let sql = format!(
            "SELECT id, {}, ST_X(location) AS location_x, ST_Y(location) AS location_y
             FROM {} WHERE objectid = $1",
            RECORD_COLUMNS.join(", "),
            self.target.qualified_table()
        );

        let row = self.client.query_opt(&sql, &[&object_id]).await?;
        Ok(row.as_ref().map(stored_school_from_row))
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn StoreTransaction + 'a>, StoreError> {
        let table = self.target.qualified_table();
        let tx = self.client.transaction().await?;

        let placeholders: Vec<String> = (1..=RECORD_COLUMNS.len()).map(|i| format!("${}", i)).collect();
        let insert = tx
            .prepare(&format!(
                "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT (objectid) DO NOTHING",
                table,
                RECORD_COLUMNS.join(", "),
                placeholders.join(", ")
            ))
            .await?;

        let locate = tx
            .prepare(&format!(
                "UPDATE {} SET location = ST_SetSRID(ST_MakePoint($1, $2), {}) WHERE objectid = $3",
                table, SRID
            ))
            .await?;

        Ok(Box::new(PgTransaction {
            tx: Some(tx),
            insert,
            locate,
        }))
    }
}

/// Transaction PostgreSQL avec ses deux instructions préparées
struct PgTransaction<'a> {
    tx: Option<Transaction<'a>>,
    insert: Statement,
    locate: Statement,
}

impl<'a> PgTransaction<'a> {
    fn open(&self) -> Result<&Transaction<'a>, StoreError> {
        self.tx.as_ref().ok_or(StoreError::Finished)
    }
}

#[async_trait]
impl StoreTransaction for PgTransaction<'_> {
    async fn insert(&mut self, record: &SchoolRecord) -> Result<u64, StoreError> {
        let tx = self.open()?;
        let params = record_params(record);
        let rows = tx.execute(&self.insert, &params).await?;
        trace!(object_id = record.object_id, rows, "Inserted school");
        Ok(rows)
    }

    async fn set_location(&mut self, object_id: i64, location: Point<f64>) -> Result<u64, StoreError> {
        let tx = self.open()?;
        let rows = tx
            .execute(&self.locate, &[&location.x(), &location.y(), &object_id])
            .await?;
        Ok(rows)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.rollback().await?;
        Ok(())
    }
}

/// Paramètres de l'INSERT, alignés sur `RECORD_COLUMNS`
fn record_params(record: &SchoolRecord) -> Vec<&(dyn ToSql + Sync)> {
    vec![
        &record.object_id,
        &record.name,
        &record.address,
        &record.city,
        &record.state,
        &record.zip,
        &record.country,
        &record.county,
        &record.county_fips,
        &record.latitude,
        &record.longitude,
        &record.level,
        &record.start_grade,
        &record.end_grade,
        &record.enrollment,
        &record.ft_teachers,
        &record.school_type,
        &record.status,
        &record.population,
        &record.nces_id,
        &record.district_id,
        &record.naics_code,
        &record.naics_desc,
        &record.website,
        &record.telephone,
        &record.source_date,
        &record.validation_date,
        &record.validation_method,
        &record.source,
        &record.shelter_id,
    ]
}

fn stored_school_from_row(row: &Row) -> StoredSchool {
    let location_x: Option<f64> = row.get("location_x");
    let location_y: Option<f64> = row.get("location_y");

    StoredSchool {
        id: row.get("id"),
        record: SchoolRecord {
            object_id: row.get("objectid"),
            name: row.get("name"),
            address: row.get("address"),
            city: row.get("city"),
            state: row.get("state"),
            zip: row.get("zip"),
            country: row.get("country"),
            county: row.get("county"),
            county_fips: row.get("countyfips"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            level: row.get("level"),
            start_grade: row.get("st_grade"),
            end_grade: row.get("end_grade"),
            enrollment: row.get("enrollment"),
            ft_teachers: row.get("ft_teacher"),
            school_type: row.get("type"),
            status: row.get("status"),
            population: row.get("population"),
            nces_id: row.get("ncesid"),
            district_id: row.get("districtid"),
            naics_code: row.get("naics_code"),
            naics_desc: row.get("naics_desc"),
            website: row.get("website"),
            telephone: row.get("telephone"),
            source_date: row.get("sourcedate"),
            validation_date: row.get("val_date"),
            validation_method: row.get("val_method"),
            source: row.get("source"),
            shelter_id: row.get("shelter_id"),
        },
        location: location_x.zip(location_y).map(|(x, y)| Point::new(x, y)),
    }
}
