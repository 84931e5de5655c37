//! Configuration file loading for pattr.
//!
//! Reads `pattr.config.json` from the page's directory, falling back to the
//! current working directory.

use std::path::{Path, PathBuf};

use pattr_atelier::EngineOptions;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "pattr.config.json";

/// Top-level pattr configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PattrConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Log level used when `--log-level` is not given.
    pub log_level: String,

    /// Element ids the engine reads.
    pub engine: EngineOptions,

    /// Directory `p-src` urls resolve against, relative to the config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for PattrConfig {
    fn default() -> Self {
        Self {
            schema: None,
            log_level: "warn".to_string(),
            engine: EngineOptions::default(),
            data_dir: None,
        }
    }
}

/// Load the configuration. An explicit path wins; otherwise
/// `pattr.config.json` next to the page, then in the CWD.
pub fn load_config(explicit: Option<&Path>, page_dir: Option<&Path>) -> PattrConfig {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir().unwrap_or_default();
            let candidates = page_dir.into_iter().map(Path::to_path_buf).chain([cwd]);
            match candidates
                .map(|dir| dir.join(CONFIG_FILE))
                .find(|path| path.exists())
            {
                Some(path) => path,
                None => return PattrConfig::default(),
            }
        }
    };

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match serde_json::from_str::<PattrConfig>(&content) {
            Ok(mut config) => {
                if let (Some(data_dir), Some(base)) = (&config.data_dir, config_path.parent()) {
                    config.data_dir = Some(base.join(data_dir));
                }
                config
            }
            Err(e) => {
                eprintln!(
                    "\x1b[33mWarning:\x1b[0m Failed to parse {}: {}",
                    config_path.display(),
                    e
                );
                PattrConfig::default()
            }
        },
        Err(e) => {
            eprintln!(
                "\x1b[33mWarning:\x1b[0m Failed to read {}: {}",
                config_path.display(),
                e
            );
            PattrConfig::default()
        }
    }
}
