pub mod calculations;
pub mod db;
pub mod exchange;
pub mod models;

pub use db::repository::{FiscalRepository, RepositoryError};
pub use models::*;
