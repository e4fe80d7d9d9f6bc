// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Drawer configuration
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file
//! 3. Environment variables (a `.env` file is loaded first if present)
//!
//! ```toml
//! num_cores = 4
//! staging_height = 2160
//! pass_height = 270
//! ```
//!
//! | Variable | Field |
//! |---|---|
//! | `RTDRAW_CORES` | `num_cores` |
//! | `RTDRAW_STAGING_HEIGHT` | `staging_height` |
//! | `RTDRAW_PASS_HEIGHT` | `pass_height` |

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{DrawerError, Result};

/// Default staging capacity in rows
pub const DEFAULT_STAGING_HEIGHT: usize = 4096;

/// Worker pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawerConfig {
    /// Number of worker threads
    pub num_cores: usize,

    /// Rows each worker's staging buffer holds
    pub staging_height: usize,

    /// Split each frame into passes of this many rows (`None` = one pass)
    pub pass_height: Option<usize>,
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            num_cores: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            staging_height: DEFAULT_STAGING_HEIGHT,
            pass_height: None,
        }
    }
}

impl DrawerConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| DrawerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded drawer config from {}", path.as_ref().display());
        Self::from_toml(&text)
    }

    /// Apply `RTDRAW_*` overrides from the process environment
    ///
    /// Loads `.env` from the working directory first, if there is one.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("RTDRAW_CORES") {
            self.num_cores = parse_var("RTDRAW_CORES", &value)?;
        }
        if let Some(value) = lookup("RTDRAW_STAGING_HEIGHT") {
            self.staging_height = parse_var("RTDRAW_STAGING_HEIGHT", &value)?;
        }
        if let Some(value) = lookup("RTDRAW_PASS_HEIGHT") {
            self.pass_height = match value.trim() {
                "" | "none" => None,
                v => Some(parse_var("RTDRAW_PASS_HEIGHT", v)?),
            };
        }
        self.validate()
    }

    /// Reject settings no worker pool can run with
    pub fn validate(&self) -> Result<()> {
        if self.num_cores == 0 {
            return Err(DrawerError::InvalidCoreCount(0));
        }
        if self.staging_height == 0 {
            return Err(DrawerError::Config("staging_height must be non-zero".into()));
        }
        if self.pass_height == Some(0) {
            return Err(DrawerError::Config("pass_height must be non-zero".into()));
        }
        Ok(())
    }
}

fn parse_var(name: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| DrawerError::Config(format!("{} is not a number: {:?}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = DrawerConfig::default();
        assert!(config.num_cores >= 1);
        assert_eq!(config.staging_height, DEFAULT_STAGING_HEIGHT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DrawerConfig::from_toml("num_cores = 3").unwrap();
        assert_eq!(config.num_cores, 3);
        assert_eq!(config.staging_height, DEFAULT_STAGING_HEIGHT);
        assert_eq!(config.pass_height, None);
    }

    #[test]
    fn test_invalid_toml_values() {
        assert!(matches!(
            DrawerConfig::from_toml("num_cores = 0"),
            Err(DrawerError::InvalidCoreCount(0))
        ));
        assert!(matches!(
            DrawerConfig::from_toml("pass_height = 0"),
            Err(DrawerError::Config(_))
        ));
        assert!(matches!(
            DrawerConfig::from_toml("num_cores = \"many\""),
            Err(DrawerError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_cores = 2\nstaging_height = 480\npass_height = 120").unwrap();

        let config = DrawerConfig::load(file.path()).unwrap();
        assert_eq!(
            config,
            DrawerConfig {
                num_cores: 2,
                staging_height: 480,
                pass_height: Some(120),
            }
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = DrawerConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(DrawerError::Io(_))));
    }

    #[test]
    fn test_variable_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RTDRAW_CORES", "6"),
            ("RTDRAW_STAGING_HEIGHT", " 720 "),
            ("RTDRAW_PASS_HEIGHT", "none"),
        ]
        .into_iter()
        .collect();

        let mut config = DrawerConfig {
            num_cores: 1,
            staging_height: 10,
            pass_height: Some(5),
        };
        config
            .apply_vars(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.num_cores, 6);
        assert_eq!(config.staging_height, 720);
        assert_eq!(config.pass_height, None);
    }

    #[test]
    fn test_bad_variable() {
        let mut config = DrawerConfig::default();
        let result = config.apply_vars(|name| (name == "RTDRAW_CORES").then(|| "x".to_string()));
        assert!(matches!(result, Err(DrawerError::Config(_))));
    }
}
