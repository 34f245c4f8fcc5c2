//! The wallet aggregate: a root key and its discovery cursors.

use crate::codec;
use crate::config::WalletConfig;
use crate::discovery::{self, Discovery};
use crate::error::{Result, WalletError};
use crate::ledger::LedgerLookup;
use crate::scan::ScanControl;
use crate::selection::{self, FundAllocation};
use hdledger_crypto::strkey;
use hdledger_crypto::{CryptoError, ExtendedKey, Seed, VersionBytes};
use zeroize::Zeroizing;

/// A root key plus the cursors learned by discovery.
///
/// The root's private scalar, when present, is wiped when the wallet is
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    root: ExtendedKey,
    first_unused: u32,
    first_with_money: Option<u32>,
    branch_map: Vec<Option<u32>>,
}

impl Wallet {
    /// Wallet over an existing root with empty cursors.
    pub fn from_root(root: ExtendedKey) -> Self {
        Self {
            root,
            first_unused: 0,
            first_with_money: None,
            branch_map: Vec::new(),
        }
    }

    /// Wallet over a root with known cursors.
    ///
    /// Funded indices must stay below [`codec::NONE_SENTINEL`], which the
    /// envelope reserves for "none".
    pub fn from_parts(
        root: ExtendedKey,
        first_unused: u32,
        first_with_money: Option<u32>,
        branch_map: Vec<Option<u32>>,
    ) -> Result<Self> {
        check_storable(first_with_money, &branch_map)?;
        Ok(Self {
            root,
            first_unused,
            first_with_money,
            branch_map,
        })
    }

    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        Ok(Self::from_root(ExtendedKey::from_seed(seed)?))
    }

    pub fn from_wallet_seed(seed: &Seed) -> Result<Self> {
        Ok(Self::from_root(ExtendedKey::from_wallet_seed(seed)?))
    }

    /// Wallet over raw private root material.
    pub fn from_master_private(chain_code: [u8; 32], scalar: &[u8]) -> Result<Self> {
        Ok(Self::from_root(ExtendedKey::from_private_parts(
            chain_code, scalar,
        )?))
    }

    /// Watch-only wallet over raw public root material.
    pub fn from_master_public(chain_code: [u8; 32], point: &[u8]) -> Result<Self> {
        Ok(Self::from_root(ExtendedKey::from_public_parts(
            chain_code, point,
        )?))
    }

    /// Build a wallet from any text key it can be rooted at: a seed, a
    /// master key, or a wallet envelope.
    pub fn from_strkey(encoded: &str, versions: &VersionBytes) -> Result<Self> {
        let (version, payload) = strkey::decode_any(encoded)?;

        if version == versions.seed {
            Self::from_seed(&payload)
        } else if version == versions.master_private || version == versions.master_public {
            Ok(Self::from_root(ExtendedKey::from_master_strkey(
                encoded, versions,
            )?))
        } else if version == versions.private_wallet || version == versions.public_wallet {
            codec::decode_wallet(encoded, versions)
        } else {
            Err(CryptoError::VersionMismatch {
                expected: versions.seed.0,
                actual: version.0,
            }
            .into())
        }
    }

    /// Text envelope of this wallet.
    pub fn to_strkey(&self, versions: &VersionBytes) -> Zeroizing<String> {
        codec::encode_wallet(self, versions)
    }

    pub fn root(&self) -> &ExtendedKey {
        &self.root
    }

    pub fn is_private(&self) -> bool {
        self.root.is_private()
    }

    pub fn first_unused(&self) -> u32 {
        self.first_unused
    }

    pub fn first_with_money(&self) -> Option<u32> {
        self.first_with_money
    }

    pub fn branch_map(&self) -> &[Option<u32>] {
        &self.branch_map
    }

    /// Replace the cursors with a discovery result. A result the envelope
    /// cannot store leaves the wallet unchanged.
    pub fn apply(&mut self, discovery: Discovery) -> Result<()> {
        check_storable(discovery.first_with_money, &discovery.branch_map)?;
        self.first_unused = discovery.first_unused;
        self.first_with_money = discovery.first_with_money;
        self.branch_map = discovery.branch_map;
        Ok(())
    }

    /// The same cursors over the public view of the root.
    pub fn watch_only(&self) -> Self {
        Self {
            root: self.root.public_view(),
            first_unused: self.first_unused,
            first_with_money: self.first_with_money,
            branch_map: self.branch_map.clone(),
        }
    }

    /// Rescan the ledger and update the cursors. On error the wallet is left
    /// unchanged.
    pub async fn discover<L>(
        &mut self,
        ledger: &L,
        config: &WalletConfig,
        control: &ScanControl,
    ) -> Result<()>
    where
        L: LedgerLookup + ?Sized,
    {
        let found = discovery::discover(&self.root, ledger, config, control).await?;
        self.apply(found)
    }

    /// Spend credentials and amounts covering `target`.
    pub async fn withdrawal_list<L>(
        &self,
        target: u32,
        ledger: &L,
        config: &WalletConfig,
        control: &ScanControl,
    ) -> Result<Vec<FundAllocation>>
    where
        L: LedgerLookup + ?Sized,
    {
        selection::select_for_withdrawal(&self.root, target, ledger, config, control).await
    }

    /// Receiving accounts and amounts covering `target`, starting at the
    /// first unused index.
    pub async fn invoice_list<L>(
        &self,
        target: u32,
        ledger: &L,
        config: &WalletConfig,
        control: &ScanControl,
    ) -> Result<Vec<FundAllocation>>
    where
        L: LedgerLookup + ?Sized,
    {
        selection::select_for_invoice(
            &self.root,
            self.first_unused,
            target,
            ledger,
            config,
            control,
        )
        .await
    }
}

fn check_storable(first_with_money: Option<u32>, branch_map: &[Option<u32>]) -> Result<()> {
    match std::iter::once(&first_with_money)
        .chain(branch_map)
        .flatten()
        .find(|&&index| index == codec::NONE_SENTINEL)
    {
        Some(&index) => Err(WalletError::IndexOutOfRange(index)),
        None => Ok(()),
    }
}
