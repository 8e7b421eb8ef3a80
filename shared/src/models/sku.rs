//! SKU Model

use serde::{Deserialize, Serialize};

use crate::sku_key::AttributeValuePair;

/// Stock-keeping unit: one concrete variant of a product.
///
/// `(product_id, tenant_id, canonical_key)` is unique. SKUs are never deleted
/// and never re-keyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Sku {
    pub id: i64,
    pub product_id: i64,
    pub tenant_id: i64,
    pub canonical_key: String,
    pub created_at: i64,
}

/// SKU ↔ attribute value association (one row per SKU and attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SkuAttributeValue {
    pub sku_id: i64,
    pub attribute_id: i64,
    pub value_id: i64,
}

impl From<SkuAttributeValue> for AttributeValuePair {
    fn from(link: SkuAttributeValue) -> Self {
        AttributeValuePair::new(link.attribute_id, link.value_id)
    }
}
