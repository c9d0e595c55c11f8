pub mod api;
pub mod config;
pub mod error;
pub mod monobank;
mod main_lib;

pub use main_lib::{build_pipeline, init_tracing, run, validate_mappings};
