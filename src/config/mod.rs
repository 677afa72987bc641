//! Configuration loading and application.
mod apply;
mod loader;
pub mod types;


pub use apply::build_harness_config;
pub use loader::{load_config, load_config_file};
pub use types::{ConfigFile, HarnessConfig, RunBounds};
