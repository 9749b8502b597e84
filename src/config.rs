use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "TCG_COLLECTOR_CONFIG";

/// Config file read when neither `--config` nor the env var is set
pub const DEFAULT_CONFIG_FILE: &str = "tcg-collector.json";

/// Where the reference data and the collection live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory of reference CSV files
    pub reference_dir: PathBuf,
    /// Compiled artifact; preferred over `reference_dir` when it exists
    pub artifact_path: Option<PathBuf>,
    /// The collection file
    pub ledger_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reference_dir: PathBuf::from("data/en"),
            artifact_path: None,
            ledger_path: PathBuf::from("collection/Collection.csv"),
        }
    }
}

/// Values given on the command line; each one overrides the file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub reference_dir: Option<PathBuf>,
    pub artifact_path: Option<PathBuf>,
    pub ledger_path: Option<PathBuf>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// defaults -> config file -> command line.
    ///
    /// An explicitly named config file must exist; the default one may not.
    pub fn resolve(explicit: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply(overrides);
        debug!("Resolved config: {:?}", config);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(dir) = overrides.reference_dir {
            self.reference_dir = dir;
        }
        if let Some(artifact) = overrides.artifact_path {
            self.artifact_path = Some(artifact);
        }
        if let Some(ledger) = overrides.ledger_path {
            self.ledger_path = ledger;
        }
    }

    /// The artifact to load, if one is configured and present on disk
    pub fn usable_artifact(&self) -> Option<&Path> {
        self.artifact_path
            .as_deref()
            .filter(|p| p.is_file())
    }
}
