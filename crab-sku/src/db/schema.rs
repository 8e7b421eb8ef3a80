//! Schema introspection
//!
//! Installs differ: some never had the legacy tonality/size columns, some
//! already dropped them, some lack the `sku_id` reference column. Probes report
//! this as a [`Capability`] instead of letting queries fail.

use serde::Serialize;
use sqlx::SqliteExecutor;

use super::repository::{RepoError, RepoResult};
use shared::models::LegacyDimension;
use shared::util::is_sql_identifier;

/// Column on detail tables holding the new SKU reference
pub const SKU_REFERENCE_COLUMN: &str = "sku_id";

/// Tri-state result of a schema probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<T> {
    /// The feature exists, with what was learned about it
    Present(T),
    /// The feature does not exist on this install
    Absent,
    /// The probe itself failed
    Unavailable(String),
}

impl<T> Capability<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Capability::Present(_))
    }
}

/// One column as reported by `pragma_table_info`
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ColumnInfo {
    pub name: String,
    /// 1-based position inside the primary key, 0 when not part of it
    pub pk: i64,
}

/// What a transactional detail table offers for the backfill
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailTableShape {
    pub primary_key: String,
    pub has_tonality: bool,
    pub has_size: bool,
    pub has_reference: bool,
}

/// Columns of `table` in declaration order; empty when the table does not exist.
pub async fn table_columns<'e, E>(executor: E, table: &str) -> RepoResult<Vec<ColumnInfo>>
where
    E: SqliteExecutor<'e>,
{
    let columns = sqlx::query_as::<_, ColumnInfo>(
        "SELECT name, pk FROM pragma_table_info(?) ORDER BY cid",
    )
    .bind(table)
    .fetch_all(executor)
    .await?;
    Ok(columns)
}

/// Probe whether a table exists at all.
pub async fn probe_table<'e, E>(executor: E, table: &str) -> Capability<()>
where
    E: SqliteExecutor<'e>,
{
    match table_columns(executor, table).await {
        Ok(columns) if columns.is_empty() => Capability::Absent,
        Ok(_) => Capability::Present(()),
        Err(e) => Capability::Unavailable(e.to_string()),
    }
}

/// Probe a detail table for legacy tonality/size columns.
///
/// `Absent` covers both a missing table and a table with neither legacy
/// column (already-migrated or never-legacy installs).
pub async fn probe_detail_table<'e, E>(executor: E, table: &str) -> Capability<DetailTableShape>
where
    E: SqliteExecutor<'e>,
{
    if !is_sql_identifier(table) {
        return Capability::Unavailable(format!("invalid table name {table:?}"));
    }
    let columns = match table_columns(executor, table).await {
        Ok(columns) => columns,
        Err(e) => return Capability::Unavailable(e.to_string()),
    };
    if columns.is_empty() {
        return Capability::Absent;
    }

    let has = |name: &str| columns.iter().any(|c| c.name.eq_ignore_ascii_case(name));
    let has_tonality = has(LegacyDimension::Tonality.detail_column());
    let has_size = has(LegacyDimension::Size.detail_column());
    if !has_tonality && !has_size {
        return Capability::Absent;
    }

    // Single-column primary key, else the conventional `id`
    let pk_columns: Vec<&ColumnInfo> = columns.iter().filter(|c| c.pk > 0).collect();
    let primary_key = match pk_columns.as_slice() {
        [only] => only.name.clone(),
        _ => "id".to_string(),
    };

    Capability::Present(DetailTableShape {
        primary_key,
        has_tonality,
        has_size,
        has_reference: has(SKU_REFERENCE_COLUMN),
    })
}

/// Add the nullable `sku_id` column to `table`. Additive only.
pub async fn add_reference_column<'e, E>(executor: E, table: &str) -> RepoResult<()>
where
    E: SqliteExecutor<'e>,
{
    if !is_sql_identifier(table) {
        return Err(RepoError::Validation(format!("invalid table name {table:?}")));
    }
    let sql = format!("ALTER TABLE \"{table}\" ADD COLUMN \"{SKU_REFERENCE_COLUMN}\" INTEGER NULL");
    sqlx::query(&sql).execute(executor).await?;
    tracing::info!(table, column = SKU_REFERENCE_COLUMN, "Added SKU reference column");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        for ddl in [
            "CREATE TABLE sale_detail (id_line INTEGER PRIMARY KEY, tenant_id INTEGER, product_id INTEGER, tonality_id INTEGER, size_id INTEGER, sku_id INTEGER)",
            "CREATE TABLE note_detail (id INTEGER PRIMARY KEY, tenant_id INTEGER, product_id INTEGER, size_id INTEGER)",
            "CREATE TABLE modern_detail (id INTEGER PRIMARY KEY, tenant_id INTEGER, product_id INTEGER, sku_id INTEGER)",
            "CREATE TABLE composite_detail (a INTEGER, b INTEGER, tonality_id INTEGER, PRIMARY KEY (a, b))",
        ] {
            sqlx::query(ddl).execute(&pool).await.unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_probe_detects_columns_and_primary_key() {
        let pool = test_pool().await;
        let shape = probe_detail_table(&pool, "sale_detail").await;
        assert_eq!(
            shape,
            Capability::Present(DetailTableShape {
                primary_key: "id_line".into(),
                has_tonality: true,
                has_size: true,
                has_reference: true,
            })
        );
    }

    #[tokio::test]
    async fn test_probe_single_dimension_without_reference() {
        let pool = test_pool().await;
        let Capability::Present(shape) = probe_detail_table(&pool, "note_detail").await else {
            panic!("note_detail should be present");
        };
        assert!(!shape.has_tonality);
        assert!(shape.has_size);
        assert!(!shape.has_reference);
    }

    #[tokio::test]
    async fn test_probe_absent_for_missing_or_modern_tables() {
        let pool = test_pool().await;
        assert_eq!(probe_detail_table(&pool, "no_such_table").await, Capability::Absent);
        assert_eq!(probe_detail_table(&pool, "modern_detail").await, Capability::Absent);
    }

    #[tokio::test]
    async fn test_probe_rejects_bad_identifier() {
        let pool = test_pool().await;
        assert!(matches!(
            probe_detail_table(&pool, "x; DROP TABLE sale_detail").await,
            Capability::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_composite_primary_key_falls_back_to_id() {
        let pool = test_pool().await;
        let Capability::Present(shape) = probe_detail_table(&pool, "composite_detail").await else {
            panic!("composite_detail should be present");
        };
        assert_eq!(shape.primary_key, "id");
    }

    #[tokio::test]
    async fn test_add_reference_column() {
        let pool = test_pool().await;
        add_reference_column(&pool, "note_detail").await.unwrap();
        let Capability::Present(shape) = probe_detail_table(&pool, "note_detail").await else {
            panic!("note_detail should be present");
        };
        assert!(shape.has_reference);
    }

    #[tokio::test]
    async fn test_probe_table() {
        let pool = test_pool().await;
        assert!(probe_table(&pool, "sale_detail").await.is_present());
        assert_eq!(probe_table(&pool, "tonality").await, Capability::Absent);
    }
}
