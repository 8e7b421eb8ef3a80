//! Legacy lookup tables (read-only)
//!
//! `tenant`, `tonality` and `size` belong to the surrounding application.
//! Table names come from [`LegacyDimension`], never from input.

use sqlx::SqliteExecutor;

use super::RepoResult;
use shared::models::{LegacyDimension, LegacyDimensionRow};

/// Every tenant id, ascending
pub async fn list_tenants<'e, E>(executor: E) -> RepoResult<Vec<i64>>
where
    E: SqliteExecutor<'e>,
{
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM tenant ORDER BY id")
        .fetch_all(executor)
        .await?;
    Ok(ids)
}

/// Rows of one legacy dimension table for a tenant
pub async fn list_dimension_rows<'e, E>(
    executor: E,
    dimension: LegacyDimension,
    tenant_id: i64,
) -> RepoResult<Vec<LegacyDimensionRow>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT id, tenant_id, name FROM \"{}\" WHERE tenant_id = ? ORDER BY id",
        dimension.table()
    );
    let rows = sqlx::query_as::<_, LegacyDimensionRow>(&sql)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}
