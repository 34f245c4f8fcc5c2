//! Ledger lookup contract.
//!
//! Discovery and selection only need to know, per account identifier,
//! whether the account has ever been used and what it holds. Transport
//! lives behind the [`LedgerLookup`] trait; [`MemoryLedger`] is a fixed
//! in-process ledger for tests and offline use.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// State of one account on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountStatus {
    /// The account exists (has been used)
    pub valid: bool,
    /// The account holds a balance
    pub has_balance: bool,
    /// Balance in whole units
    pub balance: u32,
}

impl AccountStatus {
    /// An account that has never been used.
    pub const fn unused() -> Self {
        Self {
            valid: false,
            has_balance: false,
            balance: 0,
        }
    }

    /// An existing account holding `balance`.
    pub const fn funded(balance: u32) -> Self {
        Self {
            valid: true,
            has_balance: balance > 0,
            balance,
        }
    }

    /// An existing account with nothing in it.
    pub const fn empty() -> Self {
        Self::funded(0)
    }

    /// Whether selection may draw from this account.
    pub fn is_funded(&self) -> bool {
        self.valid && self.has_balance && self.balance > 0
    }
}

/// Errors surfaced by a ledger backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("ledger returned status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Resolves account identifiers against a ledger.
///
/// Implementations must not retry internally; a failure aborts the scan that
/// issued it.
#[async_trait]
pub trait LedgerLookup: Send + Sync {
    async fn lookup(&self, account_id: &str) -> Result<AccountStatus, LookupError>;
}

/// In-memory ledger. Unknown accounts are reported as never used.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: RwLock<HashMap<String, AccountStatus>>,
    failing: RwLock<HashSet<String>>,
    default_status: AccountStatus,
    lookups: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that reports unknown accounts with `status` instead of unused.
    pub fn with_default(status: AccountStatus) -> Self {
        Self {
            default_status: status,
            ..Self::default()
        }
    }

    pub fn insert(&self, account_id: impl Into<String>, status: AccountStatus) {
        self.accounts.write().insert(account_id.into(), status);
    }

    /// Record an existing account holding `balance`.
    pub fn fund(&self, account_id: impl Into<String>, balance: u32) {
        self.insert(account_id, AccountStatus::funded(balance));
    }

    /// Make lookups of `account_id` fail with a transport error.
    pub fn fail_on(&self, account_id: impl Into<String>) {
        self.failing.write().insert(account_id.into());
    }

    /// Number of lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerLookup for MemoryLedger {
    async fn lookup(&self, account_id: &str) -> Result<AccountStatus, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.read().contains(account_id) {
            return Err(LookupError::Transport(format!(
                "injected failure for {}",
                account_id
            )));
        }
        Ok(self
            .accounts
            .read()
            .get(account_id)
            .copied()
            .unwrap_or(self.default_status))
    }
}
