use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub services: ServicesConfig,

    #[serde(default)]
    pub launch: LaunchTuning,
}

/// Command lines for the three managed services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub ollama: String,
    pub backend: String,
    pub frontend: String,
}

/// Readiness poll tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchTuning {
    pub retries: u32,
    pub poll_interval_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        ServicesConfig {
            ollama: "ollama serve".to_string(),
            backend: "uvicorn main:app --host 0.0.0.0".to_string(),
            frontend: "streamlit run app.py".to_string(),
        }
    }
}

impl Default for LaunchTuning {
    fn default() -> Self {
        LaunchTuning {
            retries: 30,
            poll_interval_secs: 1,
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(&config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".chatstack").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            services: ServicesConfig::default(),
            launch: LaunchTuning::default(),
        }
    }
}

/// Split a configured command line into argv parts.
///
/// Commands are executed argv-style (no shell), so whitespace splitting is
/// the whole contract. Returns an error on an empty command.
pub fn split_command(command: &str) -> Result<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(String::from);
    let program = parts
        .next()
        .context("Service command cannot be empty")?;
    Ok((program, parts.collect()))
}
