//! Point d'entrée CLI pour schools-pg

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Importer des jeux de données GeoJSON d'écoles dans PostGIS
#[derive(Parser)]
#[command(name = "schools-pg")]
#[command(author, version)]
#[command(about = "Importer des écoles (GeoJSON, points) dans PostGIS, en une seule transaction")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Import {
            path,
            dry_run,
            report,
            skip_schema,
            target,
            db,
        } => {
            debug!(path = %path.display(), dry_run, "Import command");
            cli::cmd_import(&path, dry_run, report.as_deref(), skip_schema, target, db).await?;
        }
        Commands::Schema { drop, target, db } => {
            cli::cmd_schema(drop, target, db).await?;
        }
        Commands::Count { target, db } => {
            cli::cmd_count(target, db).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
