//! SKU repository
//!
//! `(product_id, tenant_id, canonical_key)` is unique in storage; inserts go
//! through `ON CONFLICT DO NOTHING` so a concurrent writer never turns into an
//! error here.

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqliteExecutor};

use super::RepoResult;
use shared::models::{Sku, SkuAttributeValue};
use shared::sku_key::AttributeValuePair;

const SKU_COLUMNS: &str = "id, product_id, tenant_id, canonical_key, created_at";

pub async fn find_by_key<'e, E>(
    executor: E,
    product_id: i64,
    tenant_id: i64,
    canonical_key: &str,
) -> RepoResult<Option<Sku>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {SKU_COLUMNS} FROM sku WHERE product_id = ? AND tenant_id = ? AND canonical_key = ?"
    );
    let row = sqlx::query_as::<_, Sku>(&sql)
        .bind(product_id)
        .bind(tenant_id)
        .bind(canonical_key)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn list_for_product<'e, E>(executor: E, tenant_id: i64, product_id: i64) -> RepoResult<Vec<Sku>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {SKU_COLUMNS} FROM sku WHERE tenant_id = ? AND product_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, Sku>(&sql)
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// canonical_key → sku id for every SKU of one product
pub async fn key_map_for_product<'e, E>(
    executor: E,
    tenant_id: i64,
    product_id: i64,
) -> RepoResult<HashMap<String, i64>>
where
    E: SqliteExecutor<'e>,
{
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT canonical_key, id FROM sku WHERE tenant_id = ? AND product_id = ?")
            .bind(tenant_id)
            .bind(product_id)
            .fetch_all(executor)
            .await?;
    Ok(rows.into_iter().collect())
}

/// Insert an SKU unless one already holds the key.
///
/// Returns the new id, or `None` when the row already existed.
pub async fn insert_if_absent<'e, E>(
    executor: E,
    product_id: i64,
    tenant_id: i64,
    canonical_key: &str,
) -> RepoResult<Option<i64>>
where
    E: SqliteExecutor<'e>,
{
    let now = shared::util::now_millis();
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO sku (product_id, tenant_id, canonical_key, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (product_id, tenant_id, canonical_key) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(product_id)
    .bind(tenant_id)
    .bind(canonical_key)
    .bind(now)
    .fetch_optional(executor)
    .await?;
    Ok(id)
}

/// Store one association row per attribute of the SKU
pub async fn link_values(
    conn: &mut SqliteConnection,
    sku_id: i64,
    pairs: &[AttributeValuePair],
) -> RepoResult<()> {
    for pair in pairs {
        sqlx::query(
            "INSERT INTO sku_attribute_value (sku_id, attribute_id, value_id) VALUES (?, ?, ?) ON CONFLICT (sku_id, attribute_id) DO NOTHING",
        )
        .bind(sku_id)
        .bind(pair.attribute_id)
        .bind(pair.value_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Attribute values of one SKU, ordered by attribute id
pub async fn find_combination<'e, E>(executor: E, sku_id: i64) -> RepoResult<Vec<AttributeValuePair>>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, SkuAttributeValue>(
        "SELECT sku_id, attribute_id, value_id FROM sku_attribute_value WHERE sku_id = ? ORDER BY attribute_id",
    )
    .bind(sku_id)
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(AttributeValuePair::from).collect())
}
