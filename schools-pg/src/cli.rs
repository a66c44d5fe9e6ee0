//! Définition et implémentation des commandes CLI
//!
//! - `import`: GeoJSON → PostGIS (ou mémoire avec `--dry-run`)
//! - `schema`: création de la table et des index
//! - `count`: nombre de lignes de la table

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use deadpool_postgres::Pool;
use tracing::info;

use schools_pg::config::TargetConfig;
use schools_pg::import::import_file_with_report;
use schools_pg::report::ImportReport;
use schools_pg::store::{create_pool, pool::test_connection, postgres::create_schema};
use schools_pg::store::{DatabaseConfig, MemoryStore, PgStore};

#[derive(Subcommand)]
pub enum Commands {
    /// Import a GeoJSON school dataset in a single transaction
    Import {
        /// Path to the GeoJSON FeatureCollection
        #[arg(short, long)]
        path: PathBuf,

        /// Import into memory only (no database connection)
        #[arg(long)]
        dry_run: bool,

        /// Write the import report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Do not create the table before importing
        #[arg(long)]
        skip_schema: bool,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Create the schools table and its indexes
    Schema {
        /// Drop the table before creating it
        #[arg(long)]
        drop: bool,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Print the number of rows in the schools table
    Count {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        db: DbArgs,
    },
}

/// Table cible
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Target PostgreSQL schema (défaut : env SCHOOLS_SCHEMA / public)
    #[arg(long)]
    pub schema: Option<String>,

    /// Target table (défaut : env SCHOOLS_TABLE / schools)
    #[arg(long)]
    pub table: Option<String>,
}

impl TargetArgs {
    fn resolve(self) -> Result<TargetConfig> {
        let defaults = TargetConfig::from_env()?;
        TargetConfig::new(
            &self.schema.unwrap_or(defaults.schema),
            &self.table.unwrap_or(defaults.table),
        )
    }
}

/// Connexion PostgreSQL (surcharge l'environnement)
#[derive(Args, Debug, Clone, Default)]
pub struct DbArgs {
    /// PostgreSQL host (défaut : env DB_HOST / PGHOST / localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL database name (défaut : env DB_NAME / PGDATABASE / schools)
    #[arg(long)]
    pub database: Option<String>,

    /// PostgreSQL user (défaut : env DB_USER / PGUSER / postgres)
    #[arg(long)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env DB_PASSWORD / PGPASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// PostgreSQL port (défaut : env DB_PORT / PGPORT / 5432)
    #[arg(long)]
    pub port: Option<u16>,

    /// SSL mode: disable, prefer, require (défaut : env DB_SSLMODE / disable)
    #[arg(long)]
    pub ssl: Option<String>,
}

impl DbArgs {
    /// Applique les options CLI sur la configuration issue de l'environnement
    fn apply(self, config: &mut DatabaseConfig) -> Result<()> {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(database) = self.database {
            config.dbname = database;
        }
        if let Some(user) = self.user {
            config.user = user;
        }
        if let Some(password) = self.password {
            config.password = Some(password);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ssl) = self.ssl {
            config.ssl_mode = ssl.parse().map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }
}

/// Ouvre le pool et vérifie la connexion
async fn connect(db: DbArgs) -> Result<Pool> {
    let mut config = DatabaseConfig::from_env();
    db.apply(&mut config)?;
    println!(
        "Database: {}@{}:{}/{} (SSL: {:?})",
        config.user, config.host, config.port, config.dbname, config.ssl_mode
    );

    let pool = create_pool(&config).await?;
    test_connection(&pool).await?;
    println!("Connected to PostgreSQL");
    Ok(pool)
}

/// Exécute la commande import
pub async fn cmd_import(
    path: &Path,
    dry_run: bool,
    report_path: Option<&Path>,
    skip_schema: bool,
    target: TargetArgs,
    db: DbArgs,
) -> Result<()> {
    let target = target.resolve()?;

    println!("=== Import {} ===", path.display());
    println!("Target: {}", target.qualified_table());
    println!("Dry run: {}", dry_run);

    let mut report = ImportReport::new(&path.display().to_string());
    report.dry_run = dry_run;

    let result = if dry_run {
        let mut store = MemoryStore::new();
        import_file_with_report(&mut store, path, &mut report).await
    } else {
        let pool = connect(db).await?;
        if !skip_schema {
            create_schema(&pool, &target, false).await?;
            println!("Schema ready");
        }
        let mut store = PgStore::connect(&pool, &target)
            .await
            .context("Failed to reserve a database connection")?;
        import_file_with_report(&mut store, path, &mut report).await
    };

    report.display();

    if let Some(out) = report_path {
        report
            .save_to_file(out)
            .with_context(|| format!("Failed to write report to {}", out.display()))?;
        println!("Report saved to {}", out.display());
    }

    let count = result.with_context(|| format!("Import of {} failed", path.display()))?;
    info!(count, summary = %report.summary(), "Import complete");
    Ok(())
}

/// Exécute la commande schema
pub async fn cmd_schema(drop: bool, target: TargetArgs, db: DbArgs) -> Result<()> {
    let target = target.resolve()?;
    let pool = connect(db).await?;

    create_schema(&pool, &target, drop).await?;
    println!("Table {} ready", target.qualified_table());
    Ok(())
}

/// Exécute la commande count
pub async fn cmd_count(target: TargetArgs, db: DbArgs) -> Result<()> {
    let target = target.resolve()?;
    let pool = connect(db).await?;

    let store = PgStore::connect(&pool, &target)
        .await
        .context("Failed to reserve a database connection")?;
    let count = store
        .count()
        .await
        .with_context(|| format!("Failed to count rows in {}", target.qualified_table()))?;
    println!("{}: {} rows", target.qualified_table(), count);
    Ok(())
}
