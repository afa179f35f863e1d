//! Mount configuration file.
//!
//! A JSON object, all fields optional:
//!
//! ```json
//! {
//!     "modules": ["builtins", "json", "sys"],
//!     "allow_other": true
//! }
//! ```
//!
//! `modules` overrides the default bootstrap set; command-line `--module`
//! flags override both.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Bootstrap module names; empty means the built-in default set.
    pub modules: Vec<String>,

    /// Pass `allow_other` to the mount.
    pub allow_other: bool,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
