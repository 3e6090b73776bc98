//! Configuration module for Magpie
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. All sections are optional; a run without a config file uses the
//! built-in defaults.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, MirrorConfig, OutputConfig, PacingConfig};

// Re-export parser functions
pub use parser::load_config;

// Re-export validation
pub use validation::validate;
