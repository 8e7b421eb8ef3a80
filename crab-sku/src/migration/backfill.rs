//! Migration Backfill Engine
//!
//! Work is split into (tenant, table) units. Each unit runs in its own
//! transaction, so a failure rolls back only that unit and the run moves on
//! to the next table and tenant.

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};

use super::report::{RunReport, TenantOutcome, TenantReport, UnitReport, UnitStatus};
use super::resolver::{self, LegacyMaps, Resolution};
use super::seed;
use crate::core::Config;
use crate::db::repository::{RepoResult, detail, legacy, sku};
use crate::db::schema::{self, Capability, DetailTableShape};
use crate::sku::SkuGenerator;
use shared::sku_key::encode_canonical_key;

pub struct BackfillEngine {
    pool: SqlitePool,
    tables: Vec<String>,
    ensure_reference_column: bool,
    seed_legacy_attributes: bool,
    generate_legacy_skus: bool,
    generator: SkuGenerator,
}

impl BackfillEngine {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            pool,
            tables: config.backfill_tables.clone(),
            ensure_reference_column: config.ensure_reference_column,
            seed_legacy_attributes: config.seed_legacy_attributes,
            generate_legacy_skus: config.generate_legacy_skus,
            generator: SkuGenerator::new(config.max_sku_combinations),
        }
    }

    /// Process every tenant in id order.
    ///
    /// Only a failure to list tenants is returned; everything below is
    /// recorded in the report.
    pub async fn run(&self) -> RepoResult<RunReport> {
        let tenants = legacy::list_tenants(&self.pool).await?;
        tracing::info!(tenants = tenants.len(), tables = ?self.tables, "Backfill started");

        let mut report = RunReport::default();
        for tenant_id in tenants {
            report.push(self.run_tenant(tenant_id).await);
        }

        let totals = &report.totals;
        tracing::info!(
            tenants_processed = totals.tenants_processed,
            tenants_skipped = totals.tenants_skipped,
            tenants_failed = totals.tenants_failed,
            units_failed = totals.units_failed,
            resolved = totals.resolved,
            unresolved = totals.unresolved,
            "Backfill finished"
        );
        Ok(report)
    }

    #[tracing::instrument(skip(self))]
    pub async fn run_tenant(&self, tenant_id: i64) -> TenantReport {
        let mut report = TenantReport::new(tenant_id);

        if self.seed_legacy_attributes {
            match seed::import_legacy_attributes(&self.pool, tenant_id).await {
                Ok(created) => report.seeded_values = created,
                Err(e) => {
                    tracing::error!(tenant_id, error = %e, "Legacy attribute import failed");
                    report.outcome = TenantOutcome::Failed { error: e.to_string() };
                    return report;
                }
            }
        }

        let maps = match resolver::build_maps(&self.pool, tenant_id).await {
            Ok(Resolution::Resolved(maps)) => maps,
            Ok(Resolution::Skipped(reason)) => {
                tracing::warn!(tenant_id, reason = %reason, "Tenant skipped");
                report.outcome = TenantOutcome::Skipped { reason };
                return report;
            }
            Err(e) => {
                tracing::error!(tenant_id, error = %e, "Failed to build legacy maps");
                report.outcome = TenantOutcome::Failed { error: e.to_string() };
                return report;
            }
        };
        report.maps = Some(maps.stats());

        if self.generate_legacy_skus {
            match seed::generate_legacy_skus(&self.pool, &self.generator, &maps, &self.tables).await {
                Ok(created) => report.generated_skus = created,
                // Backfill still resolves against the SKUs that do exist
                Err(e) => {
                    tracing::error!(tenant_id, error = %e, "Legacy SKU generation failed");
                    report.generation_error = Some(e.to_string());
                }
            }
        }

        for table in &self.tables {
            report.units.push(self.run_unit(&maps, table).await);
        }
        report
    }

    /// Backfill one table for one tenant. Never fails; errors end up in the report.
    pub async fn run_unit(&self, maps: &LegacyMaps, table: &str) -> UnitReport {
        let tenant_id = maps.tenant_id;
        let mut unit = UnitReport::new(tenant_id, table);

        let shape = match schema::probe_detail_table(&self.pool, table).await {
            Capability::Present(shape) => shape,
            Capability::Absent => {
                tracing::info!(tenant_id, table, "No legacy columns, unit skipped");
                unit.advance(UnitStatus::Skipped);
                return unit;
            }
            Capability::Unavailable(e) => {
                tracing::error!(tenant_id, table, error = %e, "Schema probe failed");
                unit.fail(e);
                return unit;
            }
        };
        if !shape.has_reference && !self.ensure_reference_column {
            tracing::warn!(tenant_id, table, "Reference column missing and may not be added, unit skipped");
            unit.advance(UnitStatus::Skipped);
            return unit;
        }

        match self.backfill_unit(maps, table, &shape, &mut unit).await {
            Ok(()) => {
                unit.complete();
                tracing::info!(
                    tenant_id,
                    table,
                    status = ?unit.status,
                    candidates = unit.candidates,
                    resolved = unit.resolved,
                    unresolved = unit.unresolved,
                    "Unit finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    tenant_id,
                    table,
                    state = ?unit.status,
                    candidates = unit.candidates,
                    error = %e,
                    "Unit failed, rolled back"
                );
                unit.fail(e);
            }
        }
        unit
    }

    async fn backfill_unit(
        &self,
        maps: &LegacyMaps,
        table: &str,
        shape: &DetailTableShape,
        unit: &mut UnitReport,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        if !shape.has_reference {
            schema::add_reference_column(&mut *tx, table).await?;
        }

        unit.advance(UnitStatus::Scanning);
        let rows = detail::select_candidates(&mut *tx, table, shape, maps.tenant_id).await?;
        unit.candidates = rows.len();

        unit.advance(UnitStatus::Patching);
        let mut keys = ProductKeys::default();
        for row in rows {
            let Some(product_id) = row.product_id else {
                tracing::debug!(table, pk = row.pk, "Row has no product");
                unit.unresolved += 1;
                continue;
            };
            let pairs = maps.pairs_for(row.tonality_id, row.size_id);
            if pairs.is_empty() {
                tracing::debug!(table, pk = row.pk, "Legacy ids unmapped");
                unit.unresolved += 1;
                continue;
            }
            let key = encode_canonical_key(&pairs);
            let Some(sku_id) = keys.lookup(&mut *tx, maps.tenant_id, product_id, &key).await? else {
                tracing::debug!(table, pk = row.pk, product_id, key = %key, "No SKU for key");
                unit.unresolved += 1;
                continue;
            };
            if detail::set_sku_reference(&mut *tx, table, shape, row.pk, sku_id).await? {
                unit.resolved += 1;
            } else {
                tracing::debug!(table, pk = row.pk, "Row referenced concurrently, left as is");
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

/// canonical_key → sku_id per product, loaded on first use within a unit
#[derive(Default)]
struct ProductKeys {
    by_product: HashMap<i64, HashMap<String, i64>>,
}

impl ProductKeys {
    async fn lookup(
        &mut self,
        conn: &mut SqliteConnection,
        tenant_id: i64,
        product_id: i64,
        key: &str,
    ) -> RepoResult<Option<i64>> {
        if !self.by_product.contains_key(&product_id) {
            let map = sku::key_map_for_product(&mut *conn, tenant_id, product_id).await?;
            self.by_product.insert(product_id, map);
        }
        Ok(self.by_product.get(&product_id).and_then(|m| m.get(key).copied()))
    }
}
