//! Attribute catalog repository
//!
//! Read side of the tenant attribute catalog plus the few writes the batch
//! job needs (legacy import, soft-disable). Full CRUD lives in the catalog
//! service.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor};

use super::{RepoError, RepoResult};
use shared::models::{Attribute, AttributeCreate, AttributeValue, AttributeValueCreate};

const ATTRIBUTE_COLUMNS: &str = "id, tenant_id, code, label, created_at";
const VALUE_COLUMNS: &str = "id, attribute_id, value, display_order, is_active, created_at";

// =========================================================================
// Attribute
// =========================================================================

pub async fn list_attributes<'e, E>(executor: E, tenant_id: i64) -> RepoResult<Vec<Attribute>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {ATTRIBUTE_COLUMNS} FROM attribute WHERE tenant_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, Attribute>(&sql)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn find_attribute_by_code<'e, E>(
    executor: E,
    tenant_id: i64,
    code: &str,
) -> RepoResult<Option<Attribute>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {ATTRIBUTE_COLUMNS} FROM attribute WHERE tenant_id = ? AND code = ?");
    let row = sqlx::query_as::<_, Attribute>(&sql)
        .bind(tenant_id)
        .bind(code)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

/// Attributes among `ids` that belong to `tenant_id`
pub async fn find_attributes_by_ids<'e, E>(
    executor: E,
    tenant_id: i64,
    ids: &[i64],
) -> RepoResult<Vec<Attribute>>
where
    E: SqliteExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {ATTRIBUTE_COLUMNS} FROM attribute WHERE tenant_id = "
    ));
    qb.push_bind(tenant_id).push(" AND id IN (");
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    qb.push(")");
    let rows = qb.build_query_as::<Attribute>().fetch_all(executor).await?;
    Ok(rows)
}

pub async fn create_attribute<'e, E>(executor: E, data: &AttributeCreate) -> RepoResult<Attribute>
where
    E: SqliteExecutor<'e>,
{
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO attribute (tenant_id, code, label, created_at) VALUES (?, ?, ?, ?) RETURNING {ATTRIBUTE_COLUMNS}"
    );
    let attr = sqlx::query_as::<_, Attribute>(&sql)
        .bind(data.tenant_id)
        .bind(&data.code)
        .bind(&data.label)
        .bind(now)
        .fetch_one(executor)
        .await?;
    Ok(attr)
}

/// Find the tenant's attribute by code, creating it when missing.
/// Returns the attribute and whether it was created.
pub async fn ensure_attribute(
    conn: &mut SqliteConnection,
    data: &AttributeCreate,
) -> RepoResult<(Attribute, bool)> {
    if let Some(attr) = find_attribute_by_code(&mut *conn, data.tenant_id, &data.code).await? {
        return Ok((attr, false));
    }
    match create_attribute(&mut *conn, data).await {
        Ok(attr) => Ok((attr, true)),
        // Lost a race with another writer: the row exists now
        Err(RepoError::Duplicate(_)) => find_attribute_by_code(&mut *conn, data.tenant_id, &data.code)
            .await?
            .map(|attr| (attr, false))
            .ok_or_else(|| RepoError::NotFound(format!("attribute {}", data.code))),
        Err(e) => Err(e),
    }
}

// =========================================================================
// Attribute value
// =========================================================================

pub async fn list_values<'e, E>(
    executor: E,
    attribute_id: i64,
    include_inactive: bool,
) -> RepoResult<Vec<AttributeValue>>
where
    E: SqliteExecutor<'e>,
{
    let filter = if include_inactive { "" } else { " AND is_active = 1" };
    let sql = format!(
        "SELECT {VALUE_COLUMNS} FROM attribute_value WHERE attribute_id = ?{filter} ORDER BY display_order, id"
    );
    let rows = sqlx::query_as::<_, AttributeValue>(&sql)
        .bind(attribute_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// Values among `ids`, active or not
pub async fn find_values_by_ids<'e, E>(executor: E, ids: &[i64]) -> RepoResult<Vec<AttributeValue>>
where
    E: SqliteExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {VALUE_COLUMNS} FROM attribute_value WHERE id IN ("
    ));
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    qb.push(")");
    let rows = qb.build_query_as::<AttributeValue>().fetch_all(executor).await?;
    Ok(rows)
}

/// Exact (case-sensitive) text match inside one attribute
pub async fn find_value_by_text<'e, E>(
    executor: E,
    attribute_id: i64,
    text: &str,
) -> RepoResult<Option<AttributeValue>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {VALUE_COLUMNS} FROM attribute_value WHERE attribute_id = ? AND value = ?");
    let row = sqlx::query_as::<_, AttributeValue>(&sql)
        .bind(attribute_id)
        .bind(text)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn create_value<'e, E>(executor: E, data: &AttributeValueCreate) -> RepoResult<AttributeValue>
where
    E: SqliteExecutor<'e>,
{
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO attribute_value (attribute_id, value, display_order, is_active, created_at) VALUES (?, ?, ?, 1, ?) RETURNING {VALUE_COLUMNS}"
    );
    let value = sqlx::query_as::<_, AttributeValue>(&sql)
        .bind(data.attribute_id)
        .bind(&data.value)
        .bind(data.display_order.unwrap_or(0))
        .bind(now)
        .fetch_one(executor)
        .await?;
    Ok(value)
}

/// Find a value by exact text, creating it when missing.
/// Returns the value and whether it was created.
pub async fn ensure_value(
    conn: &mut SqliteConnection,
    data: &AttributeValueCreate,
) -> RepoResult<(AttributeValue, bool)> {
    if let Some(value) = find_value_by_text(&mut *conn, data.attribute_id, &data.value).await? {
        return Ok((value, false));
    }
    let value = create_value(&mut *conn, data).await?;
    Ok((value, true))
}

/// Soft-enable or soft-disable a value. Values are never deleted.
pub async fn set_value_active<'e, E>(executor: E, value_id: i64, is_active: bool) -> RepoResult<()>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("UPDATE attribute_value SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(value_id)
        .execute(executor)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("attribute value {value_id}")));
    }
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
        crate::db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn attr(tenant_id: i64, code: &str) -> AttributeCreate {
        AttributeCreate {
            tenant_id,
            code: code.into(),
            label: code.to_uppercase(),
        }
    }

    fn val(attribute_id: i64, value: &str, order: i32) -> AttributeValueCreate {
        AttributeValueCreate {
            attribute_id,
            value: value.into(),
            display_order: Some(order),
        }
    }

    #[tokio::test]
    async fn test_code_is_unique_per_tenant() {
        let pool = test_pool().await;
        create_attribute(&pool, &attr(1, "color")).await.unwrap();
        create_attribute(&pool, &attr(2, "color")).await.unwrap();
        let dup = create_attribute(&pool, &attr(1, "color")).await;
        assert!(matches!(dup, Err(RepoError::Duplicate(_))));

        let t1 = list_attributes(&pool, 1).await.unwrap();
        assert_eq!(t1.len(), 1);
        assert_eq!(t1[0].code, "color");
    }

    #[tokio::test]
    async fn test_find_by_code_is_tenant_scoped() {
        let pool = test_pool().await;
        let color = create_attribute(&pool, &attr(1, "color")).await.unwrap();
        assert_eq!(
            find_attribute_by_code(&pool, 1, "color").await.unwrap(),
            Some(color)
        );
        assert_eq!(find_attribute_by_code(&pool, 2, "color").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_attributes_by_ids_filters_tenant() {
        let pool = test_pool().await;
        let a = create_attribute(&pool, &attr(1, "color")).await.unwrap();
        let b = create_attribute(&pool, &attr(2, "talla")).await.unwrap();
        let found = find_attributes_by_ids(&pool, 1, &[a.id, b.id, 999]).await.unwrap();
        assert_eq!(found, vec![a]);
        assert!(find_attributes_by_ids(&pool, 1, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_attribute_is_idempotent() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let (first, created) = ensure_attribute(&mut conn, &attr(1, "talla")).await.unwrap();
        assert!(created);
        let (second, created) = ensure_attribute(&mut conn, &attr(1, "talla")).await.unwrap();
        assert!(!created);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_values_order_and_soft_disable() {
        let pool = test_pool().await;
        let color = create_attribute(&pool, &attr(1, "color")).await.unwrap();
        let blue = create_value(&pool, &val(color.id, "Blue", 2)).await.unwrap();
        let red = create_value(&pool, &val(color.id, "Red", 1)).await.unwrap();

        let values = list_values(&pool, color.id, false).await.unwrap();
        assert_eq!(values.iter().map(|v| v.value.as_str()).collect::<Vec<_>>(), ["Red", "Blue"]);

        set_value_active(&pool, blue.id, false).await.unwrap();
        assert_eq!(list_values(&pool, color.id, false).await.unwrap(), vec![red.clone()]);
        assert_eq!(list_values(&pool, color.id, true).await.unwrap().len(), 2);

        // Disabled values still resolve by id and by text
        let by_ids = find_values_by_ids(&pool, &[blue.id]).await.unwrap();
        assert!(!by_ids[0].is_active);
        assert!(find_value_by_text(&pool, color.id, "Blue").await.unwrap().is_some());

        assert!(matches!(
            set_value_active(&pool, 4242, false).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_value_text_match_is_exact() {
        let pool = test_pool().await;
        let color = create_attribute(&pool, &attr(1, "color")).await.unwrap();
        create_value(&pool, &val(color.id, "Red", 0)).await.unwrap();
        assert!(find_value_by_text(&pool, color.id, "red").await.unwrap().is_none());
        assert!(find_value_by_text(&pool, color.id, "Red ").await.unwrap().is_none());
        assert!(find_value_by_text(&pool, color.id, "Red").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ensure_value() {
        let pool = test_pool().await;
        let color = create_attribute(&pool, &attr(1, "color")).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let (a, created_a) = ensure_value(&mut conn, &val(color.id, "Red", 0)).await.unwrap();
        let (b, created_b) = ensure_value(&mut conn, &val(color.id, "Red", 0)).await.unwrap();
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a.id, b.id);
    }
}
