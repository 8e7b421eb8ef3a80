//! Batch job configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | DATABASE_URL | (required) | sqlx SQLite URL, e.g. `sqlite:/var/lib/crab/catalog.db` |
//! | ENVIRONMENT | development | development, staging or production |
//! | LOG_LEVEL | info | tracing level for this crate |
//! | LOG_DIR | - | daily rolling log files when the directory exists |
//! | LOG_JSON | false | JSON log lines |
//! | BACKFILL_TABLES | note_detail,transfer_detail,sale_detail,lot_inventory_detail | detail tables, processed in this order |
//! | ENSURE_REFERENCE_COLUMN | true | add a nullable `sku_id` column when missing |
//! | SEED_LEGACY_ATTRIBUTES | false | import tonality/size names as attribute values first |
//! | GENERATE_LEGACY_SKUS | false | create SKUs for legacy variants before backfilling |
//! | MAX_SKU_COMBINATIONS | 1000 | upper bound for one generation request, 0 = unbounded |

use crate::utils::{AppError, AppResult};

/// Detail tables carrying legacy tonality/size references, in processing order
pub const DEFAULT_BACKFILL_TABLES: [&str; 4] = [
    "note_detail",
    "transfer_detail",
    "sale_detail",
    "lot_inventory_detail",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub log_json: bool,
    /// Validated SQL identifiers
    pub backfill_tables: Vec<String>,
    pub ensure_reference_column: bool,
    pub seed_legacy_attributes: bool,
    pub generate_legacy_skus: bool,
    /// 0 disables the guard
    pub max_sku_combinations: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::config("DATABASE_URL must be set"))?;

        let backfill_tables = match std::env::var("BACKFILL_TABLES") {
            Ok(raw) if !raw.trim().is_empty() => parse_table_list(&raw)?,
            _ => DEFAULT_BACKFILL_TABLES.iter().map(|t| t.to_string()).collect(),
        };

        Ok(Self {
            database_url,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            log_json: env_flag("LOG_JSON", false)?,
            backfill_tables,
            ensure_reference_column: env_flag("ENSURE_REFERENCE_COLUMN", true)?,
            seed_legacy_attributes: env_flag("SEED_LEGACY_ATTRIBUTES", false)?,
            generate_legacy_skus: env_flag("GENERATE_LEGACY_SKUS", false)?,
            max_sku_combinations: match std::env::var("MAX_SKU_COMBINATIONS") {
                Ok(raw) => raw.trim().parse().map_err(|_| {
                    AppError::config(format!("MAX_SKU_COMBINATIONS is not a number: {raw}"))
                })?,
                Err(_) => 1000,
            },
        })
    }

    /// Configuration for a given database with every other setting at its default.
    ///
    /// Used by tests and by embedders that drive the engine directly.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            environment: "development".into(),
            log_level: "info".into(),
            log_dir: None,
            log_json: false,
            backfill_tables: DEFAULT_BACKFILL_TABLES.iter().map(|t| t.to_string()).collect(),
            ensure_reference_column: true,
            seed_legacy_attributes: false,
            generate_legacy_skus: false,
            max_sku_combinations: 1000,
        }
    }
}

fn env_flag(name: &str, default: bool) -> AppResult<bool> {
    match std::env::var(name) {
        Ok(raw) => parse_flag(&raw)
            .ok_or_else(|| AppError::config(format!("{name} must be true or false, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma list of table names, rejecting anything that is not a plain identifier.
pub fn parse_table_list(raw: &str) -> AppResult<Vec<String>> {
    let mut tables = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !shared::util::is_sql_identifier(name) {
            return Err(AppError::config(format!("invalid table name in BACKFILL_TABLES: {name:?}")));
        }
        if !tables.iter().any(|t: &String| t == name) {
            tables.push(name.to_string());
        }
    }
    if tables.is_empty() {
        return Err(AppError::config("BACKFILL_TABLES is empty"));
    }
    Ok(tables)
}
