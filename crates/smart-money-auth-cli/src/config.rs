/*
[INPUT]:  Optional YAML configuration file and SMART_MONEY_* environment variables
[OUTPUT]: Parsed CLI configuration
[POS]:    Configuration layer - operator settings
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use smart_money_auth::ClientConfig;
use smart_money_auth::http::DEFAULT_API_BASE_URL;
use smart_money_auth::session::DEFAULT_NAMESPACE;

/// Prefix of environment overrides, e.g. `SMART_MONEY_API_BASE_URL`
pub const ENV_PREFIX: &str = "SMART_MONEY";

/// Top-level configuration for the auth CLI
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// API base; the session endpoint is resolved relative to it
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Session cache root; defaults to the platform data dir
    pub storage_dir: Option<PathBuf>,
    /// Prefix of the persisted session entry names
    pub namespace: String,
    /// Solana CLI keypair file (JSON byte array)
    pub keypair_path: Option<PathBuf>,
    /// Label embedded in signed challenges
    pub app_label: String,
    pub dedupe_in_flight: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: client.timeout.as_secs(),
            connect_timeout_secs: client.connect_timeout.as_secs(),
            storage_dir: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            keypair_path: None,
            app_label: smart_money_auth::auth::DEFAULT_APP_LABEL.to_string(),
            dedupe_in_flight: false,
        }
    }
}

impl CliConfig {
    /// Load defaults, then the YAML file (if any), then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            let path_str = path.to_str().context("config path must be valid utf-8")?;
            builder = builder.add_source(File::new(path_str, FileFormat::Yaml).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Self = builder
            .build()
            .context("read configuration sources")?
            .try_deserialize()
            .context("parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(anyhow!("api_base_url cannot be empty"));
        }
        if self.namespace.trim().is_empty() {
            return Err(anyhow!("namespace cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be positive"));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    /// Root under which per-origin session directories live
    pub fn storage_root(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| anyhow!("Could not determine data directory"))?
                .join("smart-money")
                .join("sessions")),
        }
    }

    pub fn keypair_path(&self) -> Result<&Path> {
        self.keypair_path
            .as_deref()
            .ok_or_else(|| anyhow!("keypair_path is not configured (set it in the config file or {ENV_PREFIX}_KEYPAIR_PATH)"))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("serialize configuration")
    }
}
