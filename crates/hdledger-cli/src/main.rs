//! HDLedger CLI - discover accounts and build payment lists for an HD wallet.

pub mod commands;
pub mod config;
pub mod horizon;
pub mod output;
pub mod telemetry;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();

    let mut config = config::CliConfig::load()?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    telemetry::init_telemetry(&config.log_level, config.json_logs)?;

    if let Err(e) = commands::execute(cli.command, &config).await {
        output::print_error(&format!("Error: {}", e));
        std::process::exit(1);
    }

    Ok(())
}
