//! Output formatting utilities.
//!
//! Pretty printing for CLI commands.

use colored::Colorize;
use hdledger_wallet::{FundAllocation, Wallet};

/// Format an optional index, showing `none` when absent.
pub fn format_index(index: Option<u32>) -> String {
    index.map_or_else(|| "none".to_string(), |i| i.to_string())
}

/// Format account id (short version).
pub fn format_account_short(account_id: &str) -> String {
    if account_id.len() > 16 {
        format!(
            "{}...{}",
            &account_id[..8],
            &account_id[account_id.len() - 8..]
        )
    } else {
        account_id.to_string()
    }
}

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print error message.
pub fn print_error(msg: &str) {
    eprintln!("{}", format!("✗ {}", msg).red());
}

/// Print warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{}", format!("⚠ {}", msg).yellow());
}

/// Print info message.
pub fn print_info(msg: &str) {
    println!("{}", format!("ℹ {}", msg).blue());
}

/// Print the discovery cursors of a wallet.
pub fn print_wallet(wallet: &Wallet) {
    let kind = if wallet.is_private() {
        "private".green()
    } else {
        "watch-only".yellow()
    };

    println!("{}", "Wallet".bold());
    println!("{}", "=".repeat(50));
    println!("Root:             {}", kind);
    println!(
        "Fingerprint:      {}",
        hex::encode(wallet.root().fingerprint()).bright_cyan()
    );
    println!(
        "First unused:     {}",
        wallet.first_unused().to_string().bright_green()
    );
    println!(
        "First funded:     {}",
        format_index(wallet.first_with_money()).bright_green()
    );
    println!("Branches:");
    for (d, entry) in wallet.branch_map().iter().enumerate() {
        if entry.is_some() {
            println!("  2/{:<4}          first funded {}", d, format_index(*entry));
        }
    }
    let empty = wallet.branch_map().iter().filter(|e| e.is_none()).count();
    println!("  ({} of {} without funds)", empty, wallet.branch_map().len());
}

/// Print an allocation list, one credential per line.
pub fn print_allocations(title: &str, entries: &[FundAllocation]) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
    for entry in entries {
        println!(
            "{}  {}",
            entry.credential.as_str(),
            entry.amount.to_string().bright_yellow()
        );
    }
    let total: u64 = entries.iter().map(|e| e.amount as u64).sum();
    println!("{}", "-".repeat(50));
    println!("Total: {} over {} accounts", total, entries.len());
}
