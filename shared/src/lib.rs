//! Shared types for the Crab variant catalog
//!
//! Domain models used by every consumer of the attribute/SKU catalog, plus the
//! canonical key encoder that gives each attribute-value combination its
//! identity. The key encoder lives here so that SKU generation and the legacy
//! backfill can only ever use one implementation.

pub mod models;
pub mod sku_key;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
pub use sku_key::{AttributeValuePair, encode_canonical_key};
