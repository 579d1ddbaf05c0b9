//! Library surface for the price-transparency ingestion pipeline, split
//! out from the `main.rs` binary so integration tests (`tests/`) can
//! drive the reconciliation engine directly, the way
//! `ibapi`'s crate root exposes its modules to its own `tests/` suite.

pub mod catalog;
pub mod chain_scraper;
pub mod config;
pub mod database;
pub mod driver;
pub mod extract;
pub mod grammar;
pub mod parse;
pub mod reconcile;
pub mod state;
pub mod utils;
