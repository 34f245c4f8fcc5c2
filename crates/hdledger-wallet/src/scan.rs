//! Shared scanning machinery: branch layout, cancellation, probing and the
//! self-extending horizon.

use crate::config::{CeilingPolicy, WalletConfig};
use crate::error::{Result, WalletError};
use crate::ledger::{AccountStatus, LedgerLookup};
use hdledger_crypto::{DerivationPath, ExtendedKey, PathRoot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Index of the primary branch under the root.
pub const PRIMARY_BRANCH: u32 = 1;
/// Index under which the secondary branches live.
pub const SECONDARY_BRANCHES: u32 = 2;

/// Deadline and cancellation checked before every ledger lookup.
///
/// Clones share the cancellation flag, so a caller can keep one copy and
/// cancel a scan running on another.
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl ScanControl {
    /// No deadline, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Abort every scan sharing this control at its next lookup.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(WalletError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(WalletError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Path prefix of the primary branch: `m/1` or `M/1`.
pub fn primary_branch(root: &ExtendedKey) -> DerivationPath {
    DerivationPath::single(root_marker(root), PRIMARY_BRANCH)
}

/// Path prefix of secondary branch `d`: `m/2/d` or `M/2/d`.
pub fn secondary_branch(root: &ExtendedKey, d: u32) -> DerivationPath {
    DerivationPath::single(root_marker(root), SECONDARY_BRANCHES).child(d)
}

fn root_marker(root: &ExtendedKey) -> PathRoot {
    if root.is_private() {
        PathRoot::Private
    } else {
        PathRoot::PublicOnly
    }
}

/// An account derived and looked up during a scan. Never persisted.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub index: u32,
    pub node: ExtendedKey,
    pub account_id: String,
    pub status: AccountStatus,
}

/// Derive `branch/index`, encode its account id and look it up.
pub(crate) async fn probe<L>(
    root: &ExtendedKey,
    branch: &DerivationPath,
    index: u32,
    ledger: &L,
    config: &WalletConfig,
    control: &ScanControl,
) -> Result<Candidate>
where
    L: LedgerLookup + ?Sized,
{
    control.check()?;

    let node = root.derive(&branch.child(index))?;
    let account_id = node.account_id(&config.versions);
    let status = ledger
        .lookup(&account_id)
        .await
        .map_err(|reason| WalletError::LedgerLookupFailure {
            account_id: account_id.clone(),
            reason,
        })?;

    Ok(Candidate {
        index,
        node,
        account_id,
        status,
    })
}

/// Outcome of asking a bounded window to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Growth {
    Extended,
    AtCeiling,
}

/// A scan window `[start, end)` that grows by one per request up to a ceiling.
#[derive(Debug, Clone)]
pub(crate) struct Horizon {
    end: u32,
    ceiling: u32,
    policy: CeilingPolicy,
    label: String,
    truncated: bool,
}

impl Horizon {
    pub(crate) fn new(
        start: u32,
        initial: u32,
        limit: u32,
        policy: CeilingPolicy,
        label: impl Into<String>,
    ) -> Self {
        let ceiling = start.saturating_add(limit);
        Self {
            end: start.saturating_add(initial).min(ceiling),
            ceiling,
            policy,
            label: label.into(),
            truncated: false,
        }
    }

    pub(crate) fn contains(&self, i: u32) -> bool {
        i < self.end
    }

    pub(crate) fn end(&self) -> u32 {
        self.end
    }

    pub(crate) fn truncated(&self) -> bool {
        self.truncated
    }

    /// Grow by one. At the ceiling, `Fail` returns `HorizonExceeded` and
    /// `Truncate` leaves the window as is.
    pub(crate) fn extend(&mut self) -> Result<Growth> {
        if self.grow() == Growth::Extended {
            return Ok(Growth::Extended);
        }
        match self.policy {
            CeilingPolicy::Fail => Err(self.exceeded()),
            CeilingPolicy::Truncate => {
                if !self.truncated {
                    tracing::warn!(
                        "Scan of {} truncated at ceiling {}",
                        self.label,
                        self.ceiling
                    );
                    self.truncated = true;
                }
                Ok(Growth::AtCeiling)
            }
        }
    }

    /// Grow by one if below the ceiling, ignoring the policy.
    pub(crate) fn grow(&mut self) -> Growth {
        if self.end < self.ceiling {
            self.end += 1;
            Growth::Extended
        } else {
            Growth::AtCeiling
        }
    }

    pub(crate) fn exceeded(&self) -> WalletError {
        WalletError::HorizonExceeded {
            branch: self.label.clone(),
            limit: self.ceiling,
        }
    }
}
