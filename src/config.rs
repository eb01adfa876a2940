//! Backend configuration.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! gives the stock behavior: both families enabled with their standard
//! candidate lists.
//!
//! ```toml
//! attached_only = true
//! skip_xinput_devices = true
//!
//! [xinput]
//! enabled = true
//! libraries = ["xinput1_4.dll", "xinput1_3.dll"]
//!
//! [dinput]
//! enabled = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::library::{DIRECTINPUT8_LIBRARIES, XINPUT_LIBRARIES};

/// One library family's switches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyConfig {
    pub enabled: bool,
    /// Candidate library names, highest priority first.
    pub libraries: Vec<String>,
}

impl FamilyConfig {
    fn with_defaults(libraries: &[&str]) -> Self {
        Self {
            enabled: true,
            libraries: libraries.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            libraries: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub xinput: FamilyConfig,
    pub dinput: FamilyConfig,
    /// Enumerate only DirectInput devices that are currently attached.
    pub attached_only: bool,
    /// Hide DirectInput devices that XInput already reports.
    pub skip_xinput_devices: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            xinput: FamilyConfig::with_defaults(XINPUT_LIBRARIES),
            dinput: FamilyConfig::with_defaults(DIRECTINPUT8_LIBRARIES),
            attached_only: true,
            skip_xinput_devices: true,
        }
    }
}

impl BackendConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let mut cfg: BackendConfig = toml::from_str(src)?;
        cfg.fill_default_candidates();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read `path` and parse it with [`BackendConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// An enabled family with no `libraries` key (or an empty list) uses the stock list.
    fn fill_default_candidates(&mut self) {
        if self.xinput.enabled && self.xinput.libraries.is_empty() {
            self.xinput.libraries = FamilyConfig::with_defaults(XINPUT_LIBRARIES).libraries;
        }
        if self.dinput.enabled && self.dinput.libraries.is_empty() {
            self.dinput.libraries = FamilyConfig::with_defaults(DIRECTINPUT8_LIBRARIES).libraries;
        }
    }

    /// Rejects an enabled family whose candidate list is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.xinput.enabled && self.xinput.libraries.is_empty() {
            return Err(ConfigError::EmptyCandidates("xinput"));
        }
        if self.dinput.enabled && self.dinput.libraries.is_empty() {
            return Err(ConfigError::EmptyCandidates("dinput"));
        }
        Ok(())
    }
}
