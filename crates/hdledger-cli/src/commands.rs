//! CLI command implementations.

use clap::{Parser, Subcommand};
use colored::Colorize;
use hdledger_crypto::{generate_seed, strkey};
use hdledger_wallet::{ScanControl, Wallet};

use crate::config::CliConfig;
use crate::horizon::HorizonClient;
use crate::output::*;

/// Main CLI.
#[derive(Parser)]
#[command(name = "hdledger")]
#[command(about = "HD wallet discovery and fund selection for Stellar-style ledgers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Horizon server URL
    #[arg(long, global = true, env = "HDLEDGER_HORIZON_URL")]
    pub horizon: Option<String>,

    /// Log filter, e.g. "info" or "hdledger_wallet=debug"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Abort a scan after this many seconds
    #[arg(long, global = true)]
    pub scan_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply flag values over the loaded configuration.
    pub fn apply_overrides(&self, config: &mut CliConfig) {
        if let Some(url) = &self.horizon {
            config.horizon_url = url.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.json_logs {
            config.json_logs = true;
        }
        if let Some(secs) = self.scan_timeout {
            config.scan_timeout_secs = secs;
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a random wallet seed
    Seed {
        /// Seed length in bytes
        #[arg(long, default_value_t = 32)]
        bytes: usize,
    },

    /// Derive the key at a path below the wallet root
    Derive {
        /// Seed, master key or wallet envelope
        #[arg(env = "HDLEDGER_KEY", hide_env_values = true)]
        key: String,
        /// Path such as m/1/0 or M/2/0/3
        path: String,
    },

    /// Scan the ledger and show the wallet cursors
    Discover {
        /// Seed, master key or wallet envelope
        #[arg(env = "HDLEDGER_KEY", hide_env_values = true)]
        key: String,
    },

    /// List spend seeds and amounts covering a withdrawal
    Withdraw {
        /// Amount in whole units
        amount: u32,
        /// Seed, master private key or private wallet envelope
        #[arg(env = "HDLEDGER_KEY", hide_env_values = true)]
        key: String,
    },

    /// List fresh accounts and amounts for receiving a payment
    Invoice {
        /// Amount in whole units
        amount: u32,
        /// Seed, master key or wallet envelope
        #[arg(env = "HDLEDGER_KEY", hide_env_values = true)]
        key: String,
    },

    /// Print the wallet envelope, after discovery unless --offline
    Export {
        /// Seed, master key or wallet envelope
        #[arg(env = "HDLEDGER_KEY", hide_env_values = true)]
        key: String,
        /// Export a watch-only wallet
        #[arg(long)]
        public: bool,
        /// Skip discovery and keep the current cursors
        #[arg(long)]
        offline: bool,
    },

    /// Configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Config commands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Print the config file path
    Path,
}

/// Execute a CLI command.
pub async fn execute(cmd: Commands, config: &CliConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Seed { bytes } => execute_seed(bytes, config),
        Commands::Derive { key, path } => execute_derive(&key, &path, config),
        Commands::Discover { key } => execute_discover(&key, config).await,
        Commands::Withdraw { amount, key } => execute_withdraw(&key, amount, config).await,
        Commands::Invoice { amount, key } => execute_invoice(&key, amount, config).await,
        Commands::Export {
            key,
            public,
            offline,
        } => execute_export(&key, public, offline, config).await,
        Commands::Config(cmd) => execute_config(cmd, config),
    }
}

fn execute_seed(bytes: usize, config: &CliConfig) -> anyhow::Result<()> {
    let seed = generate_seed(bytes)?;
    let encoded = zeroize::Zeroizing::new(strkey::encode(
        config.wallet.versions.seed,
        seed.as_bytes(),
    ));
    let wallet = Wallet::from_wallet_seed(&seed)?;

    print_warning("Keep this seed secret; anyone holding it can spend every account");
    println!("{}", encoded.as_str());
    print_info(&format!(
        "Master public key: {}",
        wallet.root().master_public_strkey(&config.wallet.versions)
    ));
    Ok(())
}

fn execute_derive(key: &str, path: &str, config: &CliConfig) -> anyhow::Result<()> {
    let versions = &config.wallet.versions;
    let wallet = Wallet::from_strkey(key, versions)?;
    let node = wallet.root().derive_str(path)?;
    let account_id = node.account_id(versions);

    println!(
        "{}",
        format!("Key {} ({})", path, format_account_short(&account_id)).bold()
    );
    println!("{}", "=".repeat(50));
    println!("Account:            {}", account_id.bright_cyan());
    println!("Public key:         {}", hex::encode(node.public_key()));
    println!("Depth:              {}", node.depth());
    println!(
        "Parent fingerprint: {}",
        hex::encode(node.parent_fingerprint())
    );
    println!("Child index:        {}", node.child_index());
    if node.is_private() {
        let seed = node.spend_seed(versions)?;
        print_warning("Spend seed follows");
        println!("Spend seed:         {}", seed.as_str());
    }
    Ok(())
}

async fn execute_discover(key: &str, config: &CliConfig) -> anyhow::Result<()> {
    let mut wallet = Wallet::from_strkey(key, &config.wallet.versions)?;
    let client = horizon_client(config)?;
    let control = scan_control(config);

    print_info(&format!("Scanning against {}", client.url()));
    wallet.discover(&client, &config.wallet, &control).await?;
    print_wallet(&wallet);
    Ok(())
}

async fn execute_withdraw(key: &str, amount: u32, config: &CliConfig) -> anyhow::Result<()> {
    let wallet = Wallet::from_strkey(key, &config.wallet.versions)?;
    if !wallet.is_private() {
        anyhow::bail!("withdrawals need a private key; this wallet is watch-only");
    }
    let client = horizon_client(config)?;
    let control = scan_control(config);

    let entries = wallet
        .withdrawal_list(amount, &client, &config.wallet, &control)
        .await?;
    print_warning("The list below contains spend seeds");
    print_allocations("Withdrawal", &entries);
    Ok(())
}

async fn execute_invoice(key: &str, amount: u32, config: &CliConfig) -> anyhow::Result<()> {
    let wallet = Wallet::from_strkey(key, &config.wallet.versions)?;
    let client = horizon_client(config)?;
    let control = scan_control(config);

    let entries = wallet
        .invoice_list(amount, &client, &config.wallet, &control)
        .await?;
    print_allocations("Invoice", &entries);
    Ok(())
}

async fn execute_export(
    key: &str,
    public: bool,
    offline: bool,
    config: &CliConfig,
) -> anyhow::Result<()> {
    let versions = &config.wallet.versions;
    let mut wallet = Wallet::from_strkey(key, versions)?;

    if !offline {
        let client = horizon_client(config)?;
        let control = scan_control(config);
        wallet.discover(&client, &config.wallet, &control).await?;
    }
    if public {
        wallet = wallet.watch_only();
    } else if wallet.is_private() {
        print_warning("The envelope below contains the private root key");
    }

    println!("{}", wallet.to_strkey(versions).as_str());
    print_success("Wallet exported");
    Ok(())
}

fn execute_config(cmd: ConfigCommands, config: &CliConfig) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let wallet = &config.wallet;
            println!("{}", "CLI Configuration".bold());
            println!("{}", "=".repeat(50));
            println!("Horizon URL:      {}", config.horizon_url.bright_cyan());
            println!("Log level:        {}", config.log_level);
            println!("JSON logs:        {}", config.json_logs);
            println!("Request timeout:  {}s", config.request_timeout_secs);
            println!("Scan timeout:     {}s", config.scan_timeout_secs);
            println!(
                "Look ahead:       {} (max {})",
                wallet.look_ahead.to_string().bright_green(),
                wallet.max_horizon
            );
            println!(
                "Branch ahead:     {} (max {})",
                wallet.branch_ahead.to_string().bright_green(),
                wallet.max_branches
            );
            println!(
                "Account limit:    {}",
                wallet.account_balance_limit.to_string().bright_yellow()
            );
            println!("Ceiling policy:   {:?}", wallet.ceiling_policy);
        }
        ConfigCommands::Path => {
            println!("{}", CliConfig::config_path()?.display());
        }
    }
    Ok(())
}

fn horizon_client(config: &CliConfig) -> anyhow::Result<HorizonClient> {
    HorizonClient::new(config.horizon_url.clone(), config.request_timeout())
}

/// Scan control with the configured deadline, cancelled on Ctrl-C.
fn scan_control(config: &CliConfig) -> ScanControl {
    let control = match config.scan_timeout() {
        Some(timeout) => ScanControl::with_timeout(timeout),
        None => ScanControl::new(),
    };

    let handle = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling scan");
            handle.cancel();
        }
    });
    control
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_withdraw() {
        let cli = Cli::try_parse_from(["hdledger", "withdraw", "400", "SKEY"]).unwrap();
        match cli.command {
            Commands::Withdraw { amount, key } => {
                assert_eq!(amount, 400);
                assert_eq!(key, "SKEY");
            }
            _ => panic!("expected withdraw"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "hdledger",
            "--horizon",
            "http://localhost:8000",
            "--log-level",
            "debug",
            "--scan-timeout",
            "0",
            "config",
            "show",
        ])
        .unwrap();

        let mut config = CliConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.horizon_url, "http://localhost:8000");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.scan_timeout(), None);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_derive_from_seed() {
        let config = CliConfig::default();
        let seed = strkey::encode(config.wallet.versions.seed, &[0u8; 32]);
        assert!(execute_derive(&seed, "m/1/0", &config).is_ok());
        assert!(execute_derive(&seed, "x/1", &config).is_err());
    }

    #[test]
    fn test_seed_too_short() {
        assert!(execute_seed(8, &CliConfig::default()).is_err());
    }
}
