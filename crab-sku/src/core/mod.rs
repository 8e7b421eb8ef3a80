//! Core - configuration

pub mod config;

pub use config::{Config, DEFAULT_BACKFILL_TABLES};
