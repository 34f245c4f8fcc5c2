//! CLI configuration management.
//!
//! Handles the Horizon endpoint, logging, timeouts and the wallet scan
//! parameters.

use hdledger_wallet::WalletConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Horizon server URL
    pub horizon_url: String,
    /// Log filter directive
    pub log_level: String,
    /// Emit logs as JSON
    pub json_logs: bool,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
    /// Whole-scan deadline, 0 for none
    pub scan_timeout_secs: u64,
    /// Discovery and selection parameters
    pub wallet: WalletConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            horizon_url: "https://horizon-testnet.stellar.org".to_string(),
            log_level: "warn".to_string(),
            json_logs: false,
            request_timeout_secs: 10,
            scan_timeout_secs: 300,
            wallet: WalletConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from the default file, creating it on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: CliConfig = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default file.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get configuration file path.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".hdledger").join("config.toml"))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.horizon_url.is_empty() {
            anyhow::bail!("horizon_url cannot be empty");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs cannot be 0");
        }
        self.wallet.validate()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        (self.scan_timeout_secs > 0).then(|| Duration::from_secs(self.scan_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdledger_wallet::CeilingPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.horizon_url, "https://horizon-testnet.stellar.org");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.scan_timeout(), Some(Duration::from_secs(300)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config, CliConfig::default());
        assert!(path.exists());

        let reloaded = CliConfig::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            horizon_url = "http://localhost:8000"
            scan_timeout_secs = 0

            [wallet]
            look_ahead = 5
            ceiling_policy = "fail"
            "#,
        )
        .unwrap();

        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config.horizon_url, "http://localhost:8000");
        assert_eq!(config.scan_timeout(), None);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.wallet.look_ahead, 5);
        assert_eq!(config.wallet.ceiling_policy, CeilingPolicy::Fail);
        assert_eq!(config.wallet.max_horizon, 100);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[wallet]\nlook_ahead = 0\n").unwrap();
        assert!(CliConfig::load_from(&path).is_err());
    }
}
