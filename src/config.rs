//! Runtime settings loaded from an optional YAML file.

use crate::domain::invoice::Invoice;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Upper bound on a single refund call to the payment platform.
    pub refund_timeout_secs: u64,
    /// Long-poll timeout for `getUpdates`.
    pub poll_timeout_secs: u64,
    /// Invoice used by `/pay` and `/paylink`.
    pub invoice: Invoice,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refund_timeout_secs: 10,
            poll_timeout_secs: 30,
            invoice: Invoice::default(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| LedgerError::Config(format!("failed to parse config: {}", e)))
    }

    /// Loads `path` when given and present, otherwise falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn refund_timeout(&self) -> Duration {
        Duration::from_secs(self.refund_timeout_secs)
    }
}
