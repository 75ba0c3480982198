//! Command-line support for jptts.
//!
//! Loads and edits the YAML configuration file and renders results as YAML
//! or JSON.

pub mod config;
pub mod output;

pub use config::{load_config, mask_api_key, Config};
pub use output::{print_verbose, Output, OutputFormat};
