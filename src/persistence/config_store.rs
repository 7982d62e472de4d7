//! Loading and saving the configuration file
//!
//! Location: `$XRPADSIM_CONFIG` when set, otherwise
//! `<config dir>/xrpadsim/config.toml`.

use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::SimulatorConfig;

const CONFIG_ENV_VAR: &str = "XRPADSIM_CONFIG";
const CONFIG_DIR: &str = "xrpadsim";
const CONFIG_FILE: &str = "config.toml";

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the environment override or the platform config dir
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                info!("Using configuration from {}", CONFIG_ENV_VAR);
                Self::new(PathBuf::from(path))
            }
            None => Self::new(default_config_path()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the default configuration if no file exists yet
    pub async fn ensure_default_config(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            debug!("Config file present at {}", self.path.display());
            return Ok(());
        }

        info!("Creating default configuration at {}", self.path.display());
        self.save(&SimulatorConfig::default()).await
    }

    pub async fn load(&self) -> Result<SimulatorConfig> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", self.path.display(), e))?;

        let config: SimulatorConfig = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", self.path.display(), e))?;
        config.validate()?;

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub async fn save(&self, config: &SimulatorConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| eyre!("Failed to serialize configuration: {}", e))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file {}: {}", self.path.display(), e))?;

        info!("Configuration saved to {}", self.path.display());
        Ok(())
    }
}

fn default_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::updater::RotationSpace;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("xrpadsim-test-{}-{}", std::process::id(), name))
            .join(CONFIG_FILE)
    }

    #[tokio::test]
    async fn ensure_default_then_load() {
        let store = ConfigStore::new(scratch_path("default"));
        store.ensure_default_config().await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, SimulatorConfig::default());

        let _ = tokio::fs::remove_dir_all(store.path().parent().unwrap()).await;
    }

    #[tokio::test]
    async fn ensure_default_keeps_existing_file() {
        let store = ConfigStore::new(scratch_path("existing"));
        let mut config = SimulatorConfig::default();
        config.simulator.rotation_space = RotationSpace::Reference;
        config.sensitivity.head_x = 4.0;
        store.save(&config).await.unwrap();

        store.ensure_default_config().await.unwrap();

        assert_eq!(store.load().await.unwrap(), config);
        let _ = tokio::fs::remove_dir_all(store.path().parent().unwrap()).await;
    }

    #[tokio::test]
    async fn invalid_file_is_an_error() {
        let store = ConfigStore::new(scratch_path("invalid"));
        tokio::fs::create_dir_all(store.path().parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(store.path(), "[simulator]\ntick_interval_ms = 0\n")
            .await
            .unwrap();

        assert!(store.load().await.is_err());
        let _ = tokio::fs::remove_dir_all(store.path().parent().unwrap()).await;
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let store = ConfigStore::new(scratch_path("missing"));
        assert!(store.load().await.is_err());
    }
}
