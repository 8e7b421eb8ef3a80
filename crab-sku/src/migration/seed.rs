//! Optional pre-phases of the backfill
//!
//! * Legacy attribute import: copy tonality/size names into the tenant's
//!   `color` / `talla` attributes so the resolver can match them.
//! * Legacy SKU generation: create SKUs for the (product, tonality, size)
//!   variants still referenced by unresolved detail rows.
//!
//! Both are idempotent.

use std::collections::BTreeSet;

use sqlx::SqlitePool;

use super::resolver::{LegacyMaps, attribute_role};
use crate::db::repository::{RepoResult, attribute, detail, legacy};
use crate::db::schema::{Capability, probe_detail_table, probe_table};
use crate::sku::{AttributeSelection, GenerateError, GenerateRequest, SkuGenerator};
use shared::models::{AttributeCreate, AttributeValueCreate, LegacyDimension};

/// Ensure `color` / `talla` exist for the tenant and hold every legacy name.
///
/// Runs in one transaction. Returns the number of values created.
pub async fn import_legacy_attributes(pool: &SqlitePool, tenant_id: i64) -> RepoResult<usize> {
    let mut tx = pool.begin().await?;
    let mut created_values = 0;

    for dimension in LegacyDimension::ALL {
        let (code, label) = attribute_role(dimension);
        let (attr, created) = attribute::ensure_attribute(
            &mut *tx,
            &AttributeCreate {
                tenant_id,
                code: code.to_string(),
                label: label.to_string(),
            },
        )
        .await?;
        if created {
            tracing::info!(tenant_id, code, "Attribute created from legacy dimension");
        }

        if !probe_table(&mut *tx, dimension.table()).await.is_present() {
            continue;
        }

        // First occurrence wins the display order
        let mut names: Vec<String> = Vec::new();
        for row in legacy::list_dimension_rows(&mut *tx, dimension, tenant_id).await? {
            if !row.name.is_empty() && !names.contains(&row.name) {
                names.push(row.name);
            }
        }
        for (order, name) in names.into_iter().enumerate() {
            let (_, created) = attribute::ensure_value(
                &mut *tx,
                &AttributeValueCreate {
                    attribute_id: attr.id,
                    value: name,
                    display_order: Some(display_order(order)),
                },
            )
            .await?;
            if created {
                created_values += 1;
            }
        }
    }

    tx.commit().await?;
    if created_values > 0 {
        tracing::info!(tenant_id, created_values, "Legacy names imported as attribute values");
    }
    Ok(created_values)
}

/// Position in the legacy table as a display order, saturating at `i32::MAX`
fn display_order(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

/// Create SKUs for legacy variants found on unresolved rows of `tables`.
///
/// Variants that fail validation (e.g. a disabled value) are logged and
/// skipped; a storage error aborts the phase. Returns the number of SKUs created.
pub async fn generate_legacy_skus(
    pool: &SqlitePool,
    generator: &SkuGenerator,
    maps: &LegacyMaps,
    tables: &[String],
) -> RepoResult<usize> {
    let tenant_id = maps.tenant_id;

    // (product_id, pairs) already translated; BTreeSet keeps generation order stable
    let mut variants = BTreeSet::new();
    for table in tables {
        let Capability::Present(shape) = probe_detail_table(pool, table).await else {
            continue;
        };
        for variant in detail::distinct_unresolved_variants(pool, table, &shape, tenant_id).await? {
            let pairs = maps.pairs_for(variant.tonality_id, variant.size_id);
            if !pairs.is_empty() {
                variants.insert((variant.product_id, pairs));
            }
        }
    }

    let mut created = 0;
    for (product_id, pairs) in variants {
        let request = GenerateRequest {
            product_id,
            tenant_id,
            selections: pairs
                .iter()
                .map(|p| AttributeSelection::new(p.attribute_id, [p.value_id]))
                .collect(),
        };
        match generator.generate(pool, &request).await {
            Ok(outcome) => created += outcome.created,
            Err(GenerateError::Validation(e)) => {
                tracing::warn!(tenant_id, product_id, error = %e, "Legacy variant not generated");
            }
            Err(GenerateError::Repo(e)) => return Err(e),
        }
    }

    if created > 0 {
        tracing::info!(tenant_id, created, "SKUs generated for legacy variants");
    }
    Ok(created)
}
