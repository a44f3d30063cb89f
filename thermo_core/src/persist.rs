//! Restart continuity: the learned bias and what was last sent, as a small TOML file.

use crate::error::{BuildError, Result};
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::{fs, io::Write, path::Path};

/// The only state worth keeping across restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub bias_c: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sent_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sent_at_ms: Option<u64>,
}

pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

impl PersistedState {
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| eyre::Report::new(BuildError::PersistedState(e.to_string())))
    }

    /// Finiteness is checked when the state is handed to the builder.
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e: toml::de::Error| eyre::Report::new(BuildError::PersistedState(e.to_string())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_toml()?;
        write_atomic(path, text.as_bytes())
            .wrap_err_with(|| format!("write state file {}", path.display()))
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(s) => Self::from_toml(&s).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(eyre::Report::new(e))
                .wrap_err_with(|| format!("read state file {}", path.display())),
        }
    }
}
