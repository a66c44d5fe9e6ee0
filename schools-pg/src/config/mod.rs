//! Configuration de la cible d'import

use anyhow::{bail, Result};

/// Schéma PostgreSQL par défaut
pub const DEFAULT_SCHEMA: &str = "public";

/// Table cible par défaut
pub const DEFAULT_TABLE: &str = "schools";

/// SRID de la colonne géométrique (WGS84, ordre longitude/latitude)
pub const SRID: i32 = 4326;

/// Emplacement de la table cible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Schéma PostgreSQL
    pub schema: String,

    /// Nom de la table
    pub table: String,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            table: default_table(),
        }
    }
}

impl TargetConfig {
    /// Construit et valide une cible
    pub fn new(schema: &str, table: &str) -> Result<Self> {
        let config = Self {
            schema: schema.to_string(),
            table: table.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Charge la cible depuis `SCHOOLS_SCHEMA` / `SCHOOLS_TABLE`
    pub fn from_env() -> Result<Self> {
        let schema = std::env::var("SCHOOLS_SCHEMA").unwrap_or_else(|_| default_schema());
        let table = std::env::var("SCHOOLS_TABLE").unwrap_or_else(|_| default_table());
        Self::new(&schema, &table)
    }

    /// Les noms sont interpolés dans le SQL: seuls les identifiants simples
    /// sont acceptés.
    pub fn validate(&self) -> Result<()> {
        for (kind, name) in [("schema", &self.schema), ("table", &self.table)] {
            if !is_plain_identifier(name) {
                bail!("Invalid {} name: {:?} (expected [a-z_][a-z0-9_]*)", kind, name);
            }
        }
        Ok(())
    }

    /// Nom qualifié `schema.table`
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
