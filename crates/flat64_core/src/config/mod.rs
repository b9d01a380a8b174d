//! Configuration management for flat64.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Validation on load
//!
//! # Example
//!
//! ```no_run
//! use flat64_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new(".config/flat64.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Entry cap: {}", config.settings().layout.max_entries);
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ErrorPolicy, LayoutSettings, NamingSettings, RunSettings, Settings, ToolSettings,
};
