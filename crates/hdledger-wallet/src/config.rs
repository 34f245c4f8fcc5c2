//! Wallet configuration.
//!
//! A `WalletConfig` is built once (from defaults or a config file) and passed
//! by reference into discovery, selection and the codecs.

use crate::error::{Result, WalletError};
use hdledger_crypto::VersionBytes;
use serde::{Deserialize, Serialize};

/// What to do when a scan wants to grow past its hard ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CeilingPolicy {
    /// Stop the branch at the ceiling and log a warning.
    #[default]
    Truncate,
    /// Fail the scan with `HorizonExceeded`.
    Fail,
}

/// Scanning and encoding parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Initial horizon per branch
    pub look_ahead: u32,
    /// Initial number of secondary branches
    pub branch_ahead: u32,
    /// Capacity assigned to each invoice account
    pub account_balance_limit: u32,
    /// Hard ceiling on a branch horizon
    pub max_horizon: u32,
    /// Hard ceiling on the number of secondary branches
    pub max_branches: u32,
    /// Behaviour at a ceiling
    pub ceiling_policy: CeilingPolicy,
    /// Version bytes for text keys
    pub versions: VersionBytes,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            look_ahead: 20,
            branch_ahead: 20,
            account_balance_limit: 500,
            max_horizon: 100,
            max_branches: 40,
            ceiling_policy: CeilingPolicy::Truncate,
            versions: VersionBytes::default(),
        }
    }
}

impl WalletConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.look_ahead == 0 {
            return Err(WalletError::InvalidConfig("look_ahead cannot be 0".to_string()));
        }
        if self.max_horizon < self.look_ahead {
            return Err(WalletError::InvalidConfig(format!(
                "max_horizon ({}) is below look_ahead ({})",
                self.max_horizon, self.look_ahead
            )));
        }
        if self.max_branches < self.branch_ahead {
            return Err(WalletError::InvalidConfig(format!(
                "max_branches ({}) is below branch_ahead ({})",
                self.max_branches, self.branch_ahead
            )));
        }
        // u32::MAX marks "no funded index" in the envelope
        if self.max_horizon == u32::MAX {
            return Err(WalletError::InvalidConfig(
                "max_horizon must be below u32::MAX".to_string(),
            ));
        }
        if self.account_balance_limit == 0 {
            return Err(WalletError::InvalidConfig(
                "account_balance_limit cannot be 0".to_string(),
            ));
        }
        if !self.versions.are_distinct() {
            return Err(WalletError::InvalidConfig(
                "version bytes must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WalletConfig::default();
        assert_eq!(config.look_ahead, 20);
        assert_eq!(config.branch_ahead, 20);
        assert_eq!(config.account_balance_limit, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = WalletConfig::default();
        config.look_ahead = 0;
        assert!(config.validate().is_err());

        let mut config = WalletConfig::default();
        config.max_horizon = 10;
        assert!(config.validate().is_err());

        let mut config = WalletConfig::default();
        config.max_branches = 5;
        assert!(config.validate().is_err());

        let mut config = WalletConfig::default();
        config.account_balance_limit = 0;
        assert!(config.validate().is_err());

        let mut config = WalletConfig::default();
        config.versions.seed = config.versions.account_id;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: WalletConfig = toml::from_str(
            r#"
            look_ahead = 5
            ceiling_policy = "fail"

            [versions]
            account_id = 48
            "#,
        )
        .unwrap();
        assert_eq!(config.look_ahead, 5);
        assert_eq!(config.ceiling_policy, CeilingPolicy::Fail);
        assert_eq!(config.branch_ahead, 20);
        assert_eq!(config.versions, VersionBytes::default());
    }
}
