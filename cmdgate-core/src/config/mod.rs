//! Configuration module.
//!
//! This module provides:
//! - YAML configuration parsing with `${VAR}` substitution
//! - Validation of endpoint, timeouts and field names
//! - Centralized default values
//!
//! # Example
//!
//! ```ignore
//! use cmdgate_core::config::load_and_validate;
//! use cmdgate_core::Dispatcher;
//!
//! let config = load_and_validate(Path::new("cmdgate.yaml"))?;
//! let dispatcher = Dispatcher::new(config.dispatcher_config())?;
//! ```

pub mod defaults;
mod duration_format;
mod error;
mod loader;
mod schema;

pub use duration_format::parse_duration;
pub use error::ConfigError;
pub use loader::{
    default_config_paths, find_config_file, load_and_validate, load_config, substitute_env_vars,
    validate,
};
pub use schema::{Config, GateSection};
