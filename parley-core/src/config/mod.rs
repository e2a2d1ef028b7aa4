//! Configuration management module.
//!
//! - YAML, TOML and JSON configuration files
//! - Validation with path-qualified error messages
//! - `PARLEY_*` environment variable overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use parley_core::config::{ConfigLoader, ParleyConfig};
//!
//! let config: ParleyConfig = ConfigLoader::new()
//!     .with_env_prefix("PARLEY")
//!     .load_or_default(Some("parley.yaml"))?;
//! println!("{}", config.server.ws_url);
//! # Ok::<(), parley_core::error::ConfigError>(())
//! ```

mod loader;
mod parley_config;
mod traits;
pub mod validation;

pub use loader::{ConfigFormat, ConfigLoader};
pub use parley_config::{
    ConnectionConfig, LoggingConfig, ParleyConfig, ServerConfig, SessionConfig,
};
pub use traits::{Configurable, Validatable};
pub use validation::{EnvOverride, ValidationContext, ValidationResult, Validator};
