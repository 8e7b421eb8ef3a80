//! SKU Generator
//!
//! Expands per-attribute value selections into concrete SKUs of one product.
//! Existing SKUs are reused by canonical key, so a request can be repeated
//! without creating duplicates.

pub mod generator;

pub use generator::{
    AttributeSelection, GenerateError, GenerateOutcome, GenerateRequest, GeneratedSku, SkuGenerator,
    ValidationError,
};
