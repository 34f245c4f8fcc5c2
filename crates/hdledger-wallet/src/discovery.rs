//! Account discovery.
//!
//! Each branch is walked from index 0 with a horizon of `look_ahead`
//! indices. A never-used account does not end the branch: it pushes the
//! horizon out by one, up to `max_horizon`. The secondary branches
//! `2/d` are walked the same way, and the branch window itself grows by
//! one for every secondary branch that holds no funds.

use crate::config::WalletConfig;
use crate::error::Result;
use crate::ledger::LedgerLookup;
use crate::scan::{
    primary_branch, probe, secondary_branch, Horizon, ScanControl, SECONDARY_BRANCHES,
};
use futures::future::try_join_all;
use hdledger_crypto::{DerivationPath, ExtendedKey};

/// Cursors produced by a discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// One past the last scanned index of the primary branch
    pub first_unused: u32,
    /// First funded index of the primary branch
    pub first_with_money: Option<u32>,
    /// First funded index of each secondary branch, in branch order
    pub branch_map: Vec<Option<u32>>,
}

/// Result of walking one branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchScan {
    pub first_unused: u32,
    pub first_with_money: Option<u32>,
    /// Number of lookups issued
    pub scanned: u32,
    /// The horizon hit its ceiling
    pub truncated: bool,
}

/// Walk one branch with the self-extending horizon.
///
/// With `stop_at_first_funded` the walk ends as soon as a funded account is
/// found; otherwise it runs until the horizon is exhausted.
pub async fn scan_branch<L>(
    root: &ExtendedKey,
    branch: &DerivationPath,
    stop_at_first_funded: bool,
    ledger: &L,
    config: &WalletConfig,
    control: &ScanControl,
) -> Result<BranchScan>
where
    L: LedgerLookup + ?Sized,
{
    let mut horizon = Horizon::new(
        0,
        config.look_ahead,
        config.max_horizon,
        config.ceiling_policy,
        branch.to_string(),
    );
    let mut scan = BranchScan::default();

    let mut i = 0;
    while horizon.contains(i) {
        let candidate = probe(root, branch, i, ledger, config, control).await?;

        if !candidate.status.valid {
            horizon.extend()?;
        } else if candidate.status.is_funded() && scan.first_with_money.is_none() {
            scan.first_with_money = Some(i);
        }
        scan.first_unused = i + 1;
        i += 1;

        if stop_at_first_funded && scan.first_with_money.is_some() {
            break;
        }
    }

    scan.scanned = i;
    scan.truncated = horizon.truncated();
    tracing::debug!(
        "Scanned {}: {} accounts, first unused {}, first funded {:?}",
        branch,
        scan.scanned,
        scan.first_unused,
        scan.first_with_money
    );
    Ok(scan)
}

/// Walk the secondary branches, one concurrent batch per window, folding
/// results in branch order.
pub async fn scan_secondary_branches<L>(
    root: &ExtendedKey,
    ledger: &L,
    config: &WalletConfig,
    control: &ScanControl,
) -> Result<Vec<Option<u32>>>
where
    L: LedgerLookup + ?Sized,
{
    let mut window = Horizon::new(
        0,
        config.branch_ahead,
        config.max_branches,
        config.ceiling_policy,
        format!("{}/{}/*", primary_branch(root).root().as_str(), SECONDARY_BRANCHES),
    );
    let mut branch_map = Vec::new();

    let mut d = 0;
    while window.contains(d) {
        let batch_end = window.end();
        let branches: Vec<DerivationPath> =
            (d..batch_end).map(|b| secondary_branch(root, b)).collect();

        let scans = try_join_all(
            branches
                .iter()
                .map(|branch| scan_branch(root, branch, true, ledger, config, control)),
        )
        .await?;

        for scan in scans {
            branch_map.push(scan.first_with_money);
            if scan.first_with_money.is_none() {
                window.extend()?;
            }
        }
        d = batch_end;
    }

    Ok(branch_map)
}

/// Discover the primary cursors and the secondary branch map of `root`.
///
/// The primary branch and the secondary branches are scanned concurrently.
/// One ledger lookup is issued per scanned index; the first lookup failure
/// aborts the whole run.
pub async fn discover<L>(
    root: &ExtendedKey,
    ledger: &L,
    config: &WalletConfig,
    control: &ScanControl,
) -> Result<Discovery>
where
    L: LedgerLookup + ?Sized,
{
    config.validate()?;

    let primary = primary_branch(root);
    let (primary_scan, branch_map) = futures::try_join!(
        scan_branch(root, &primary, false, ledger, config, control),
        scan_secondary_branches(root, ledger, config, control),
    )?;

    let discovery = Discovery {
        first_unused: primary_scan.first_unused,
        first_with_money: primary_scan.first_with_money,
        branch_map,
    };

    tracing::info!(
        "Discovery complete: first unused {}, first funded {:?}, {} secondary branches ({} funded)",
        discovery.first_unused,
        discovery.first_with_money,
        discovery.branch_map.len(),
        discovery.branch_map.iter().filter(|b| b.is_some()).count()
    );

    Ok(discovery)
}
