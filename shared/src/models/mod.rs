//! Data models
//!
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod attribute;
pub mod legacy;
pub mod sku;

// Re-exports
pub use attribute::*;
pub use legacy::*;
pub use sku::*;
