//! Crab SKU - variant catalog and legacy variant migration
//!
//! # Overview
//!
//! - **SKU Generator** (`sku`): expands attribute value selections into the
//!   SKUs of a product, reusing existing ones by canonical key
//! - **Legacy migration** (`migration`): resolves legacy tonality/size ids to
//!   attribute values and backfills `sku_id` onto historical detail rows
//! - **Database** (`db`): SQLite pool, embedded migrations, repositories and
//!   schema probes
//!
//! # Module layout
//!
//! ```text
//! crab-sku/src/
//! ├── core/          # configuration
//! ├── db/            # pool, schema probes, repositories
//! ├── sku/           # SKU generator
//! ├── migration/     # resolver, backfill engine, legacy seeding, reports
//! └── utils/         # errors, logging
//! ```

pub mod core;
pub mod db;
pub mod migration;
pub mod sku;
pub mod utils;

// Re-export public types
pub use core::Config;
pub use db::DbService;
pub use migration::{BackfillEngine, RunReport};
pub use sku::{GenerateRequest, SkuGenerator};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
