//! Configuration module for fetch-webpage
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file yields the defaults.
//!
//! # Example
//!
//! ```no_run
//! use fetch_webpage::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fetch-webpage.toml")).unwrap();
//! println!("Parallelism: {:?}", config.downloader.parallelism);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, DownloaderConfig, OutputConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
