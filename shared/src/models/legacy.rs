//! Legacy variant dimensions
//!
//! Before the generic attribute catalog, variants were modelled with two
//! fixed free-text lookup tables: `tonality` (colour) and `size`. They are
//! read-only here and kept only so historical rows can be translated.

use serde::{Deserialize, Serialize};

/// Which legacy lookup table a row comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyDimension {
    Tonality,
    Size,
}

impl LegacyDimension {
    pub const ALL: [LegacyDimension; 2] = [LegacyDimension::Tonality, LegacyDimension::Size];

    /// Lookup table holding the dimension's names
    pub fn table(self) -> &'static str {
        match self {
            LegacyDimension::Tonality => "tonality",
            LegacyDimension::Size => "size",
        }
    }

    /// Column on transactional detail rows referencing the lookup table
    pub fn detail_column(self) -> &'static str {
        match self {
            LegacyDimension::Tonality => "tonality_id",
            LegacyDimension::Size => "size_id",
        }
    }
}

impl std::fmt::Display for LegacyDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Row of a legacy lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LegacyDimensionRow {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
}
