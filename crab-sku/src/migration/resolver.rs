//! Legacy Mapping Resolver
//!
//! Translates a tenant's legacy `tonality` / `size` rows into attribute value
//! ids of the tenant's `color` / `talla` attributes by exact name equality.
//! Both attributes must exist; a tenant with only one of them is skipped as a
//! whole. Renamed or localized attribute codes are not recognised.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, RepoResult, attribute, legacy};
use crate::db::schema::{Capability, probe_table};
use shared::models::{Attribute, LegacyDimension};
use shared::sku_key::AttributeValuePair;

/// Attribute code receiving legacy tonality names
pub const COLOR_ATTRIBUTE_CODE: &str = "color";
/// Attribute code receiving legacy size names
pub const SIZE_ATTRIBUTE_CODE: &str = "talla";

/// Attribute code and label standing in for a legacy dimension
pub fn attribute_role(dimension: LegacyDimension) -> (&'static str, &'static str) {
    match dimension {
        LegacyDimension::Tonality => (COLOR_ATTRIBUTE_CODE, "Color"),
        LegacyDimension::Size => (SIZE_ATTRIBUTE_CODE, "Talla"),
    }
}

/// legacy row id → attribute value id for one dimension
#[derive(Debug, Clone, Default)]
pub struct DimensionMap {
    pub attribute_id: i64,
    values: HashMap<i64, i64>,
    unmapped: usize,
}

impl DimensionMap {
    pub fn get(&self, legacy_id: i64) -> Option<i64> {
        self.values.get(&legacy_id).copied()
    }

    pub fn mapped(&self) -> usize {
        self.values.len()
    }

    /// Legacy rows whose name matched no value
    pub fn unmapped(&self) -> usize {
        self.unmapped
    }

    fn pair(&self, legacy_id: Option<i64>) -> Option<AttributeValuePair> {
        let value_id = self.get(legacy_id?)?;
        Some(AttributeValuePair::new(self.attribute_id, value_id))
    }
}

/// Both dimension maps of one tenant
#[derive(Debug, Clone)]
pub struct LegacyMaps {
    pub tenant_id: i64,
    pub color: DimensionMap,
    pub size: DimensionMap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MapStats {
    pub color_mapped: usize,
    pub color_unmapped: usize,
    pub size_mapped: usize,
    pub size_unmapped: usize,
}

impl LegacyMaps {
    /// Attribute value pairs for whichever legacy ids resolve.
    ///
    /// Unresolvable ids are dropped, so a row may yield one pair or none.
    pub fn pairs_for(&self, tonality_id: Option<i64>, size_id: Option<i64>) -> Vec<AttributeValuePair> {
        [self.color.pair(tonality_id), self.size.pair(size_id)]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn stats(&self) -> MapStats {
        MapStats {
            color_mapped: self.color.mapped(),
            color_unmapped: self.color.unmapped(),
            size_mapped: self.size.mapped(),
            size_unmapped: self.size.unmapped(),
        }
    }
}

/// Outcome of building a tenant's maps
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(LegacyMaps),
    /// Tenant precondition not met; nothing should be done for it
    Skipped(String),
}

/// Build both legacy maps for `tenant_id`.
///
/// A missing legacy lookup table yields an empty map for that dimension.
pub async fn build_maps(pool: &SqlitePool, tenant_id: i64) -> RepoResult<Resolution> {
    let Some(color) = attribute::find_attribute_by_code(pool, tenant_id, COLOR_ATTRIBUTE_CODE).await? else {
        return Ok(Resolution::Skipped(format!(
            "attribute {COLOR_ATTRIBUTE_CODE:?} is not defined"
        )));
    };
    let Some(size) = attribute::find_attribute_by_code(pool, tenant_id, SIZE_ATTRIBUTE_CODE).await? else {
        return Ok(Resolution::Skipped(format!(
            "attribute {SIZE_ATTRIBUTE_CODE:?} is not defined"
        )));
    };

    let maps = LegacyMaps {
        tenant_id,
        color: build_dimension(pool, tenant_id, LegacyDimension::Tonality, &color).await?,
        size: build_dimension(pool, tenant_id, LegacyDimension::Size, &size).await?,
    };

    tracing::debug!(tenant_id, stats = ?maps.stats(), "Legacy maps built");
    Ok(Resolution::Resolved(maps))
}

async fn build_dimension(
    pool: &SqlitePool,
    tenant_id: i64,
    dimension: LegacyDimension,
    target: &Attribute,
) -> RepoResult<DimensionMap> {
    let mut map = DimensionMap {
        attribute_id: target.id,
        ..Default::default()
    };
    match probe_table(pool, dimension.table()).await {
        Capability::Present(()) => {}
        Capability::Absent => {
            tracing::debug!(tenant_id, table = dimension.table(), "Legacy table absent");
            return Ok(map);
        }
        Capability::Unavailable(e) => return Err(RepoError::Database(e)),
    }

    // Disabled values still resolve: history must stay translatable
    let by_text: HashMap<String, i64> = attribute::list_values(pool, target.id, true)
        .await?
        .into_iter()
        .map(|v| (v.value, v.id))
        .collect();

    for row in legacy::list_dimension_rows(pool, dimension, tenant_id).await? {
        match by_text.get(&row.name) {
            Some(value_id) => {
                map.values.insert(row.id, *value_id);
            }
            None => {
                tracing::debug!(tenant_id, dimension = %dimension, legacy_id = row.id, name = %row.name, "Legacy name has no attribute value");
                map.unmapped += 1;
            }
        }
    }
    Ok(map)
}
