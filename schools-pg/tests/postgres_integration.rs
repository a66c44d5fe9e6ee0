//! Tests d'intégration PostgreSQL
//!
//! Ces tests nécessitent une base PostgreSQL avec PostGIS disponible.
//! Configuration via variables d'environnement:
//! - PGHOST, PGPORT, PGUSER, PGPASSWORD, PGDATABASE
//!
//! Exécution:
//! ```bash
//! # Avec PostgreSQL local
//! cargo test --test postgres_integration -- --ignored
//!
//! # Avec Docker
//! docker run -d --name postgres-test -e POSTGRES_PASSWORD=test -p 5432:5432 postgis/postgis
//! PGPASSWORD=test cargo test --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::io::Write;

use anyhow::Result;
use deadpool_postgres::{Config, Pool, Runtime};
use tempfile::NamedTempFile;
use tokio_postgres::NoTls;

use schools_pg::import::{import_file, ImportError};
use schools_pg::store::postgres::create_schema;
use schools_pg::{PgStore, TargetConfig};

/// Configuration de test
fn test_config() -> Config {
    let mut cfg = Config::new();
    cfg.host = Some(std::env::var("PGHOST").unwrap_or_else(|_| "localhost".into()));
    cfg.port = Some(
        std::env::var("PGPORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5432),
    );
    cfg.dbname = Some(std::env::var("PGDATABASE").unwrap_or_else(|_| "schools_test".into()));
    cfg.user = Some(std::env::var("PGUSER").unwrap_or_else(|_| "postgres".into()));
    cfg.password = std::env::var("PGPASSWORD").ok();
    cfg
}

/// Crée un pool de connexions de test
async fn create_test_pool() -> Result<Pool> {
    let pool = test_config().create_pool(Some(Runtime::Tokio1), NoTls)?;
    Ok(pool)
}

/// Recrée une table vide dans le schéma de test
async fn fresh_target(pool: &Pool, table: &str) -> Result<TargetConfig> {
    let target = TargetConfig::new("schools_test", table)?;
    create_schema(pool, &target, true).await?;
    Ok(target)
}

fn write_geojson(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(body.as_bytes()).expect("Failed to write GeoJSON");
    file
}

const THREE_FEATURES: &str = r#"{"type": "FeatureCollection", "features": [
    {"type": "Feature",
     "properties": {"objectid": 1, "name": "Lincoln Elementary", "zip": "", "ft_teacher": 0,
                    "enrollment": 420, "sourcedate": "2019-08-01T00:00:00Z", "val_date": "garbage"},
     "geometry": {"type": "Point", "coordinates": [-89.65, 39.78]}},
    {"type": "Feature",
     "properties": {"objectid": 2, "name": "Campus Grounds"},
     "geometry": {"type": "Polygon", "coordinates": [[[-89.0, 39.0], [-88.9, 39.0], [-88.9, 39.1], [-89.0, 39.0]]]}},
    {"type": "Feature",
     "properties": {"objectid": 1, "name": "Renamed School", "enrollment": 999},
     "geometry": {"type": "Point", "coordinates": [-88.79, 39.41]}}
]}"#;

/// Import complet: doublon compté, valeurs de la première feature conservées
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_three_feature_import() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    let target = fresh_target(&pool, "schools_e2e").await.expect("Failed to create table");
    let file = write_geojson(THREE_FEATURES);

    let mut store = PgStore::connect(&pool, &target).await.expect("Failed to connect");
    let outcome = import_file(&mut store, file.path()).await.expect("Import failed");

    assert_eq!(outcome.count, 2);
    assert_eq!(store.count().await.expect("Count failed"), 1);

    let row = store
        .find_by_object_id(1)
        .await
        .expect("Query failed")
        .expect("Row 1 should exist");
    assert_eq!(row.record.name, "Lincoln Elementary");
    assert_eq!(row.record.enrollment, Some(420));
    assert_eq!(row.record.zip, None);
    assert_eq!(row.record.ft_teachers, None);
    assert!(row.record.source_date.is_some());
    assert_eq!(row.record.validation_date, None);
    assert_eq!(row.record.longitude, -89.65);

    let location = row.location.expect("Location should be set");
    assert!((location.x() - -88.79).abs() < 1e-9);
    assert!((location.y() - 39.41).abs() < 1e-9);
}

/// Un second import du même fichier ne crée aucune ligne
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_reimport_is_idempotent() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    let target = fresh_target(&pool, "schools_idempotent")
        .await
        .expect("Failed to create table");
    let file = write_geojson(THREE_FEATURES);

    let mut store = PgStore::connect(&pool, &target).await.expect("Failed to connect");
    import_file(&mut store, file.path()).await.expect("First import failed");
    let before = store.count().await.expect("Count failed");
    import_file(&mut store, file.path()).await.expect("Second import failed");

    assert_eq!(store.count().await.expect("Count failed"), before);
}

/// Une violation de contrainte annule tout l'import
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_constraint_violation_rolls_back() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    let target = fresh_target(&pool, "schools_rollback")
        .await
        .expect("Failed to create table");

    // Refuser les écoles sans nom pour provoquer une erreur sur la 3e feature
    let client = pool.get().await.expect("Failed to get client");
    client
        .batch_execute(&format!(
            "ALTER TABLE {} ADD CONSTRAINT name_not_empty CHECK (name <> '')",
            target.qualified_table()
        ))
        .await
        .expect("Failed to add constraint");
    drop(client);

    let file = write_geojson(
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"objectid": 1, "name": "A"},
             "geometry": {"type": "Point", "coordinates": [-70.0, 42.0]}},
            {"type": "Feature", "properties": {"objectid": 2, "name": "B"},
             "geometry": {"type": "Point", "coordinates": [-71.0, 43.0]}},
            {"type": "Feature", "properties": {"objectid": 3},
             "geometry": {"type": "Point", "coordinates": [-72.0, 44.0]}}
        ]}"#,
    );

    let mut store = PgStore::connect(&pool, &target).await.expect("Failed to connect");
    let err = import_file(&mut store, file.path())
        .await
        .expect_err("Import should fail");

    assert!(matches!(err, ImportError::Store { index: 2, object_id: 3, .. }));
    assert_eq!(store.count().await.expect("Count failed"), 0);
}

/// La création du schéma est idempotente
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_create_schema_twice() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    let target = TargetConfig::new("schools_test", "schools_schema").expect("Invalid target");

    create_schema(&pool, &target, false).await.expect("First create failed");
    create_schema(&pool, &target, false).await.expect("Second create failed");

    let client = pool.get().await.expect("Failed to get client");
    let row = client
        .query_one(
            "SELECT COUNT(*) FROM pg_indexes WHERE schemaname = $1 AND tablename = $2",
            &[&target.schema, &target.table],
        )
        .await
        .expect("Query failed");
    let indexes: i64 = row.get(0);
    // Clé primaire, unicité objectid, GIST
    assert_eq!(indexes, 3);
}
