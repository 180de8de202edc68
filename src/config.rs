use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "compose-scout.json";

/// Persisted, user-facing project state. Service entries are kept in a
/// BTreeMap so re-serialization is deterministic and re-synthesis over an
/// unchanged tree produces an identical file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfiguration {
    pub project_name: String,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceEntry>,
    /// How to invoke the compose tool for the selected file, e.g.
    /// `docker compose -f backend/docker-compose.yml`.
    pub compose_invocation: String,
}

/// One service entry. `detected` marks values populated from a compose
/// scan; entries without it were authored by the user and are never
/// overwritten, only supplemented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub detected: bool,
    #[serde(default)]
    pub health_check: Option<String>,
    #[serde(default = "default_restart")]
    pub restart: String,
    #[serde(default = "default_scale")]
    pub scale: u32,
}

pub fn default_restart() -> String {
    "unless-stopped".to_string()
}

fn default_scale() -> u32 {
    1
}

/// Default location: next to the compose file, at the project root.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the configuration if one exists. A missing file is a normal first
/// run, not an error.
pub fn load(path: &Path) -> Result<Option<ProjectConfiguration>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Persist via temp-file-then-rename so a concurrent reader never observes
/// a torn write.
pub fn save(path: &Path, config: &ProjectConfiguration) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, format!("{json}\n")).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
