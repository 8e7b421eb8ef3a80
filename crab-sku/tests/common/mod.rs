//! Test fixtures: in-memory catalog plus the legacy tables owned by the
//! surrounding application.

#![allow(dead_code)]

use crab_sku::Config;
use crab_sku::db::repository::attribute::{create_attribute, create_value};
use crab_sku::sku::{AttributeSelection, GenerateRequest, SkuGenerator};
use shared::models::{AttributeCreate, AttributeValueCreate};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Fresh database with migrations applied and empty legacy tables
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crab_sku::db::run_migrations(&pool).await.unwrap();
    for ddl in [
        "CREATE TABLE tenant (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        "CREATE TABLE tonality (id INTEGER PRIMARY KEY, tenant_id INTEGER NOT NULL, name TEXT NOT NULL)",
        "CREATE TABLE size (id INTEGER PRIMARY KEY, tenant_id INTEGER NOT NULL, name TEXT NOT NULL)",
    ] {
        exec(&pool, ddl).await;
    }
    pool
}

pub async fn exec(pool: &SqlitePool, sql: &str) {
    sqlx::query(sql).execute(pool).await.unwrap();
}

/// Legacy detail table with the given primary key column and an optional `sku_id`
pub async fn create_detail_table(pool: &SqlitePool, table: &str, with_reference: bool) {
    let reference = if with_reference { ", sku_id INTEGER NULL" } else { "" };
    exec(
        pool,
        &format!(
            "CREATE TABLE {table} (id INTEGER PRIMARY KEY, tenant_id INTEGER NOT NULL, product_id INTEGER NOT NULL, \
             tonality_id INTEGER NULL, size_id INTEGER NULL, quantity INTEGER NOT NULL DEFAULT 1{reference})"
        ),
    )
    .await;
}

pub async fn insert_detail(
    pool: &SqlitePool,
    table: &str,
    id: i64,
    tenant_id: i64,
    product_id: i64,
    tonality_id: Option<i64>,
    size_id: Option<i64>,
) {
    sqlx::query(&format!(
        "INSERT INTO {table} (id, tenant_id, product_id, tonality_id, size_id) VALUES (?, ?, ?, ?, ?)"
    ))
    .bind(id)
    .bind(tenant_id)
    .bind(product_id)
    .bind(tonality_id)
    .bind(size_id)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn sku_reference(pool: &SqlitePool, table: &str, id: i64) -> Option<i64> {
    sqlx::query_scalar(&format!("SELECT sku_id FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Ids of one tenant's catalog: `color` {Red, Blue}, `talla` {S, M}
/// and matching legacy rows (tonality Red/Blue, size S/M).
#[derive(Debug, Clone, Copy)]
pub struct Tenant {
    pub id: i64,
    pub color: i64,
    pub talla: i64,
    pub red: i64,
    pub blue: i64,
    pub s: i64,
    pub m: i64,
    pub legacy_red: i64,
    pub legacy_blue: i64,
    pub legacy_s: i64,
    pub legacy_m: i64,
}

async fn attribute(pool: &SqlitePool, tenant_id: i64, code: &str) -> i64 {
    create_attribute(
        pool,
        &AttributeCreate {
            tenant_id,
            code: code.into(),
            label: code.into(),
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn value(pool: &SqlitePool, attribute_id: i64, text: &str) -> i64 {
    create_value(
        pool,
        &AttributeValueCreate {
            attribute_id,
            value: text.into(),
            display_order: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn legacy_row(pool: &SqlitePool, table: &str, tenant_id: i64, name: &str) -> i64 {
    sqlx::query_scalar(&format!("INSERT INTO {table} (tenant_id, name) VALUES (?, ?) RETURNING id"))
        .bind(tenant_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn add_tenant(pool: &SqlitePool, tenant_id: i64) {
    sqlx::query("INSERT INTO tenant (id, name) VALUES (?, ?)")
        .bind(tenant_id)
        .bind(format!("tenant {tenant_id}"))
        .execute(pool)
        .await
        .unwrap();
}

/// Tenant row, full catalog and legacy rows
pub async fn seed_tenant(pool: &SqlitePool, tenant_id: i64) -> Tenant {
    add_tenant(pool, tenant_id).await;
    let color = attribute(pool, tenant_id, "color").await;
    let talla = attribute(pool, tenant_id, "talla").await;
    Tenant {
        id: tenant_id,
        color,
        talla,
        red: value(pool, color, "Red").await,
        blue: value(pool, color, "Blue").await,
        s: value(pool, talla, "S").await,
        m: value(pool, talla, "M").await,
        legacy_red: legacy_row(pool, "tonality", tenant_id, "Red").await,
        legacy_blue: legacy_row(pool, "tonality", tenant_id, "Blue").await,
        legacy_s: legacy_row(pool, "size", tenant_id, "S").await,
        legacy_m: legacy_row(pool, "size", tenant_id, "M").await,
    }
}

/// Generate SKUs for `selections` and return their ids in enumeration order
pub async fn generate(
    pool: &SqlitePool,
    tenant: &Tenant,
    product_id: i64,
    selections: Vec<AttributeSelection>,
) -> Vec<i64> {
    SkuGenerator::default()
        .generate(
            pool,
            &GenerateRequest {
                product_id,
                tenant_id: tenant.id,
                selections,
            },
        )
        .await
        .unwrap()
        .sku_ids()
}

pub fn config(tables: &[&str]) -> Config {
    let mut config = Config::for_database("sqlite::memory:");
    config.backfill_tables = tables.iter().map(|t| t.to_string()).collect();
    config
}
