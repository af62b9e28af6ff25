//! Configuration loading and schema definitions
//!
//! The client reads an optional TOML file; every value has a default so a
//! missing file is not an error.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
