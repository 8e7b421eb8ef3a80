//! Attribute Model
//!
//! Tenant-scoped variation dimensions (`color`, `talla`, ...) and their
//! discrete values. Attributes are immutable once created; values are only
//! ever soft-disabled so that historical references keep resolving.

use serde::{Deserialize, Serialize};

/// Attribute entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Attribute {
    pub id: i64,
    pub tenant_id: i64,
    /// Unique per tenant, e.g. "color"
    pub code: String,
    pub label: String,
    pub created_at: i64,
}

/// Attribute value entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttributeValue {
    pub id: i64,
    pub attribute_id: i64,
    /// Display text, matched exactly against legacy dimension names
    pub value: String,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create attribute payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeCreate {
    pub tenant_id: i64,
    pub code: String,
    pub label: String,
}

/// Create attribute value payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeValueCreate {
    pub attribute_id: i64,
    pub value: String,
    pub display_order: Option<i32>,
}
