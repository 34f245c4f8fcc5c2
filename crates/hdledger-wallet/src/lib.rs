//! HDLedger Wallet - account discovery and fund selection over a key tree.
//!
//! This crate provides:
//! - The [`Wallet`] aggregate (root key, cursors, branch map)
//! - Gap-extending account discovery against a [`LedgerLookup`]
//! - Greedy withdrawal and invoice list construction
//! - Binary and text wallet envelopes
//! - Immutable wallet configuration ([`WalletConfig`])

pub mod codec;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ledger;
pub mod scan;
pub mod selection;
pub mod wallet;

pub use codec::{decode_wallet, deserialize, encode_wallet, serialize};
pub use config::{CeilingPolicy, WalletConfig};
pub use discovery::{discover, Discovery};
pub use error::{Result, WalletError};
pub use ledger::{AccountStatus, LedgerLookup, LookupError, MemoryLedger};
pub use scan::ScanControl;
pub use selection::{select_for_invoice, select_for_withdrawal, Credential, FundAllocation};
pub use wallet::Wallet;

pub use hdledger_crypto as crypto;
