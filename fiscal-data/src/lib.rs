//! Loads bracket tables for a fiscal year from CSV into a repository.

pub mod loader;

pub use loader::{BracketLoader, BracketLoaderError, BracketRecord};
