pub mod app;
pub mod config;
pub mod logging;
pub mod models;
pub mod report;
pub mod scenario_loader;
pub mod utils;
