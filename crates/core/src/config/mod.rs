//! Application configuration: vault location, settings file, logging.

pub mod loader;
pub mod types;
