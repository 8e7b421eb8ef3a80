//! Transactional detail rows (sale, transfer, note and lot-inventory lines)
//!
//! Column sets differ per install, so queries are assembled from a probed
//! [`DetailTableShape`]. Table names are validated identifiers; every value is
//! bound.

use sqlx::{Row, SqliteExecutor};

use super::{RepoError, RepoResult};
use crate::db::schema::{DetailTableShape, SKU_REFERENCE_COLUMN};
use shared::util::is_sql_identifier;

/// A detail row still waiting for its SKU reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailRow {
    /// Primary key value
    pub pk: i64,
    /// NULL on some historical lines; such rows can never resolve
    pub product_id: Option<i64>,
    pub tonality_id: Option<i64>,
    pub size_id: Option<i64>,
}

/// A distinct (product, tonality, size) variant referenced by detail rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LegacyVariant {
    pub product_id: i64,
    pub tonality_id: Option<i64>,
    pub size_id: Option<i64>,
}

fn check_identifiers(table: &str, shape: &DetailTableShape) -> RepoResult<()> {
    if !is_sql_identifier(table) || !is_sql_identifier(&shape.primary_key) {
        return Err(RepoError::Validation(format!(
            "invalid identifier in {table:?}.{:?}",
            shape.primary_key
        )));
    }
    Ok(())
}

/// `tonality_id IS NOT NULL OR size_id IS NOT NULL`, restricted to the columns present
fn legacy_condition(shape: &DetailTableShape) -> String {
    let mut conditions = Vec::new();
    if shape.has_tonality {
        conditions.push("tonality_id IS NOT NULL");
    }
    if shape.has_size {
        conditions.push("size_id IS NOT NULL");
    }
    conditions.join(" OR ")
}

fn legacy_select(shape: &DetailTableShape) -> String {
    let tonality = if shape.has_tonality { "tonality_id" } else { "NULL" };
    let size = if shape.has_size { "size_id" } else { "NULL" };
    format!("{tonality} AS tonality_id, {size} AS size_id")
}

/// Rows of `tenant_id` with no SKU reference yet and at least one legacy id.
///
/// Ordered by product then primary key so rows of one product are adjacent.
/// Rows whose primary key is not an integer cannot be patched by key and are
/// not selected.
pub async fn select_candidates<'e, E>(
    executor: E,
    table: &str,
    shape: &DetailTableShape,
    tenant_id: i64,
) -> RepoResult<Vec<DetailRow>>
where
    E: SqliteExecutor<'e>,
{
    check_identifiers(table, shape)?;
    let pk = &shape.primary_key;
    let sql = format!(
        "SELECT \"{pk}\" AS pk, product_id, {legacy} FROM \"{table}\" \
         WHERE tenant_id = ? AND {SKU_REFERENCE_COLUMN} IS NULL AND ({condition}) \
         AND typeof(\"{pk}\") = 'integer' \
         ORDER BY product_id, \"{pk}\"",
        legacy = legacy_select(shape),
        condition = legacy_condition(shape),
    );
    let rows = sqlx::query(&sql).bind(tenant_id).fetch_all(executor).await?;
    rows.iter()
        .map(|row| {
            Ok(DetailRow {
                pk: row.try_get("pk")?,
                product_id: row.try_get("product_id")?,
                tonality_id: row.try_get("tonality_id")?,
                size_id: row.try_get("size_id")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(RepoError::from)
}

/// Distinct legacy variants among rows that still lack a SKU reference.
///
/// Rows without a product are left out: no SKU can be generated for them.
pub async fn distinct_unresolved_variants<'e, E>(
    executor: E,
    table: &str,
    shape: &DetailTableShape,
    tenant_id: i64,
) -> RepoResult<Vec<LegacyVariant>>
where
    E: SqliteExecutor<'e>,
{
    check_identifiers(table, shape)?;
    // Without the reference column every row is still unresolved
    let unresolved = if shape.has_reference {
        format!(" AND {SKU_REFERENCE_COLUMN} IS NULL")
    } else {
        String::new()
    };
    let sql = format!(
        "SELECT DISTINCT product_id, {legacy} FROM \"{table}\" \
         WHERE tenant_id = ?{unresolved} AND product_id IS NOT NULL AND ({condition}) \
         ORDER BY product_id",
        legacy = legacy_select(shape),
        condition = legacy_condition(shape),
    );
    let rows = sqlx::query(&sql).bind(tenant_id).fetch_all(executor).await?;
    rows.iter()
        .map(|row| {
            Ok(LegacyVariant {
                product_id: row.try_get("product_id")?,
                tonality_id: row.try_get("tonality_id")?,
                size_id: row.try_get("size_id")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(RepoError::from)
}

/// Set the SKU reference of one row by primary key.
///
/// Only writes when the reference is still NULL; returns whether the row was updated.
pub async fn set_sku_reference<'e, E>(
    executor: E,
    table: &str,
    shape: &DetailTableShape,
    pk: i64,
    sku_id: i64,
) -> RepoResult<bool>
where
    E: SqliteExecutor<'e>,
{
    check_identifiers(table, shape)?;
    let sql = format!(
        "UPDATE \"{table}\" SET {SKU_REFERENCE_COLUMN} = ? WHERE \"{pk}\" = ? AND {SKU_REFERENCE_COLUMN} IS NULL",
        pk = shape.primary_key,
    );
    let result = sqlx::query(&sql).bind(sku_id).bind(pk).execute(executor).await?;
    Ok(result.rows_affected() == 1)
}
