//! Database module for scoutboard.
//!
//! Reads the scouter's SQLite run history, bootstrapping the schema
//! through embedded migrations.

mod models;
mod store;

pub use models::*;
pub use store::*;
