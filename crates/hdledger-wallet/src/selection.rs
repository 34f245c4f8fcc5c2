//! Greedy fund selection.
//!
//! Both selectors walk the key tree in path order and stop as soon as the
//! target is covered. Neither tries to minimise the number of entries.

use crate::config::WalletConfig;
use crate::error::{Result, WalletError};
use crate::ledger::LedgerLookup;
use crate::scan::{
    primary_branch, probe, secondary_branch, Horizon, ScanControl, SECONDARY_BRANCHES,
};
use hdledger_crypto::{CryptoError, DerivationPath, ExtendedKey};
use std::fmt;
use zeroize::Zeroizing;

/// What a caller needs to move funds for one allocation entry.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Text-encoded private scalar of the source account
    SpendSeed(Zeroizing<String>),
    /// Text-encoded public key of the receiving account
    AccountId(String),
}

impl Credential {
    pub fn as_str(&self) -> &str {
        match self {
            Credential::SpendSeed(seed) => seed.as_str(),
            Credential::AccountId(id) => id.as_str(),
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, Credential::SpendSeed(_))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::SpendSeed(_) => f.write_str("SpendSeed(<redacted>)"),
            Credential::AccountId(id) => f.debug_tuple("AccountId").field(id).finish(),
        }
    }
}

/// One entry of a withdrawal or invoice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundAllocation {
    pub credential: Credential,
    pub amount: u32,
}

/// Running total of a withdrawal.
struct Tally {
    target: u32,
    running: u64,
    entries: Vec<FundAllocation>,
}

impl Tally {
    fn new(target: u32) -> Self {
        Self {
            target,
            running: 0,
            entries: Vec::new(),
        }
    }

    /// Take up to `balance` from one account. Returns true once the target
    /// is covered.
    fn take(&mut self, credential: Credential, balance: u32) -> bool {
        let remaining = self.target as u64 - self.running;
        if (balance as u64) < remaining {
            self.running += balance as u64;
            self.entries.push(FundAllocation {
                credential,
                amount: balance,
            });
            false
        } else {
            self.running = self.target as u64;
            self.entries.push(FundAllocation {
                credential,
                // remaining <= balance, so it fits in u32
                amount: remaining as u32,
            });
            true
        }
    }

    fn finish(self) -> Vec<FundAllocation> {
        tracing::info!(
            "Withdrawal of {} drawn from {} accounts",
            self.target,
            self.entries.len()
        );
        self.entries
    }
}

/// Draw from every funded account of one branch, in index order.
///
/// Returns the amount drawn, or `None` once the target is covered.
async fn draw_branch<L>(
    root: &ExtendedKey,
    branch: &DerivationPath,
    tally: &mut Tally,
    ledger: &L,
    config: &WalletConfig,
    control: &ScanControl,
) -> Result<Option<u64>>
where
    L: LedgerLookup + ?Sized,
{
    let before = tally.running;
    let mut horizon = Horizon::new(
        0,
        config.look_ahead,
        config.max_horizon,
        config.ceiling_policy,
        branch.to_string(),
    );

    let mut i = 0;
    while horizon.contains(i) {
        let candidate = probe(root, branch, i, ledger, config, control).await?;
        i += 1;

        if !candidate.status.valid {
            horizon.extend()?;
            continue;
        }
        if !candidate.status.is_funded() {
            continue;
        }

        let seed = candidate.node.spend_seed(&config.versions)?;
        if tally.take(Credential::SpendSeed(seed), candidate.status.balance) {
            return Ok(None);
        }
    }

    Ok(Some(tally.running - before))
}

/// Build a withdrawal list covering exactly `target`.
///
/// Walks the primary branch, then the secondary branches in order. Each
/// funded account contributes its full balance until the next one would
/// reach the target, which contributes only the remainder. Fails with
/// `InsufficientFunds` when every branch is exhausted first; no partial
/// list is returned.
pub async fn select_for_withdrawal<L>(
    root: &ExtendedKey,
    target: u32,
    ledger: &L,
    config: &WalletConfig,
    control: &ScanControl,
) -> Result<Vec<FundAllocation>>
where
    L: LedgerLookup + ?Sized,
{
    if !root.is_private() {
        return Err(CryptoError::PrivateDerivationUnavailable.into());
    }
    config.validate()?;
    if target == 0 {
        return Ok(Vec::new());
    }

    let mut tally = Tally::new(target);

    let primary = primary_branch(root);
    if draw_branch(root, &primary, &mut tally, ledger, config, control)
        .await?
        .is_none()
    {
        return Ok(tally.finish());
    }

    let mut window = Horizon::new(
        0,
        config.branch_ahead,
        config.max_branches,
        config.ceiling_policy,
        format!("{}/{}/*", primary.root().as_str(), SECONDARY_BRANCHES),
    );
    let mut d = 0;
    while window.contains(d) {
        let branch = secondary_branch(root, d);
        match draw_branch(root, &branch, &mut tally, ledger, config, control).await? {
            None => return Ok(tally.finish()),
            Some(0) => {
                window.extend()?;
            }
            Some(_) => {}
        }
        d += 1;
    }

    tracing::warn!(
        "Withdrawal of {} failed: only {} available",
        target,
        tally.running
    );
    Err(WalletError::InsufficientFunds {
        requested: target,
        available: tally.running,
    })
}

/// Build an invoice list covering exactly `target`.
///
/// Starts at `first_unused` on the primary branch and assigns
/// `account_balance_limit` to each never-used account, skipping accounts
/// that already exist. The last entry is capped to the remainder. Fails
/// with `HorizonExceeded` if `max_horizon` indices past the start do not
/// hold enough never-used accounts.
pub async fn select_for_invoice<L>(
    root: &ExtendedKey,
    first_unused: u32,
    target: u32,
    ledger: &L,
    config: &WalletConfig,
    control: &ScanControl,
) -> Result<Vec<FundAllocation>>
where
    L: LedgerLookup + ?Sized,
{
    config.validate()?;
    if target == 0 {
        return Ok(Vec::new());
    }

    let branch = primary_branch(root);
    let mut horizon = Horizon::new(
        first_unused,
        config.look_ahead,
        config.max_horizon,
        config.ceiling_policy,
        branch.to_string(),
    );
    let limit = config.account_balance_limit as u64;
    let mut running = 0u64;
    let mut entries = Vec::new();

    let mut i = first_unused;
    while horizon.contains(i) {
        let candidate = probe(root, &branch, i, ledger, config, control).await?;
        i = i.saturating_add(1);

        if candidate.status.valid {
            tracing::debug!("Skipping used account {}/{}", branch, candidate.index);
            continue;
        }

        let remaining = target as u64 - running;
        let credential = Credential::AccountId(candidate.account_id);
        if limit >= remaining {
            entries.push(FundAllocation {
                credential,
                amount: remaining as u32,
            });
            tracing::info!(
                "Invoice of {} spread over {} accounts",
                target,
                entries.len()
            );
            return Ok(entries);
        }

        running += limit;
        entries.push(FundAllocation {
            credential,
            amount: config.account_balance_limit,
        });
        horizon.grow();
    }

    Err(horizon.exceeded())
}
