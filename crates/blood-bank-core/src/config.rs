//! Engine configuration.
//!
//! Loaded from TOML; every field has a default so an empty document is valid.
//!
//! ```toml
//! database_path = "/var/lib/blood-bank/blood_bank.db"
//! sweep_interval_secs = 300
//! default_page_size = 20
//! max_page_size = 100
//! mark_unavailable_after_donation = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BloodBankError, BloodBankResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Seconds between expiration sweeps
    pub sweep_interval_secs: u64,
    /// Page size when a listing does not ask for one
    pub default_page_size: u32,
    /// Upper bound on any requested page size
    pub max_page_size: u32,
    /// Whether recording a donation also switches the donor to unavailable
    pub mark_unavailable_after_donation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("blood_bank.db"),
            sweep_interval_secs: 300,
            default_page_size: 20,
            max_page_size: 100,
            mark_unavailable_after_donation: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> BloodBankResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| BloodBankError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> BloodBankResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BloodBankError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> BloodBankResult<()> {
        if self.sweep_interval_secs == 0 {
            return Err(BloodBankError::Config(
                "sweep_interval_secs must be positive".into(),
            ));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(BloodBankError::Config("page sizes must be positive".into()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(BloodBankError::Config(
                "default_page_size cannot exceed max_page_size".into(),
            ));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Resolve an optional page size against the configured bounds.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.default_page_size,
            Some(limit) => limit.min(self.max_page_size),
        }
    }
}
