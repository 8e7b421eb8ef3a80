//! Legacy variant migration
//!
//! Backfills `sku_id` onto historical detail rows that still reference the
//! legacy tonality/size tables. Safe to re-run: rows that already carry a
//! reference are never selected again.

pub mod backfill;
pub mod report;
pub mod resolver;
pub mod seed;

pub use backfill::BackfillEngine;
pub use report::{RunReport, TenantOutcome, TenantReport, UnitReport, UnitStatus};
pub use resolver::{LegacyMaps, Resolution, build_maps};
