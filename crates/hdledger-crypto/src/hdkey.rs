//! Hierarchical deterministic key derivation over Ed25519.
//!
//! The master key is `HMAC-SHA512("Stellar seed", seed)`; the left half is
//! reduced into the private scalar and the right half becomes the chain
//! code. Children are derived non-hardened style from the parent's public
//! point, so a public-only node yields the same child points as its private
//! counterpart.

use crate::arithmetic::{
    add_points, add_scalars, canonical_scalar, decompress, reduce, scalar_mult_base,
};
use crate::error::{CryptoError, Result};
use crate::path::{DerivationPath, PathRoot};
use crate::secret::{SecretScalar, Seed};
use crate::strkey::{self, VersionBytes};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

/// Minimum seed length in bytes (128 bits).
pub const MIN_SEED_LEN: usize = 16;

const MASTER_KEY_DOMAIN: &[u8] = b"Stellar seed";

/// Whether a node can derive private children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Private,
    PublicOnly,
}

/// A node in the key tree.
///
/// The private scalar is present iff the capability is `Private`, and then
/// `public_key == scalar_mult_base(private_key)`. Nodes are immutable;
/// derivation always returns a new node.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    depth: u16,
    parent_fingerprint: [u8; 4],
    child_index: [u8; 4],
    chain_code: [u8; 32],
    private_key: Option<SecretScalar>,
    public_key: [u8; 32],
}

impl ExtendedKey {
    /// Derive the root node from a seed of at least 128 bits.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        if seed.len() < MIN_SEED_LEN {
            return Err(CryptoError::SeedTooShort(seed.len()));
        }

        let mut mac = HmacSha512::new_from_slice(MASTER_KEY_DOMAIN)
            .map_err(|e| CryptoError::Arithmetic(e.to_string()))?;
        mac.update(seed);
        let i = hmac_output(mac);

        let scalar = Zeroizing::new(reduce(&i[..32])?);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);

        Ok(Self {
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: [0u8; 4],
            chain_code,
            public_key: scalar_mult_base(&scalar[..])?,
            private_key: Some(SecretScalar::from_reduced(*scalar)),
        })
    }

    /// Root node from a wrapped seed.
    pub fn from_wallet_seed(seed: &Seed) -> Result<Self> {
        Self::from_seed(seed.as_bytes())
    }

    /// Root node from raw private material. The scalar must be reduced.
    pub fn from_private_parts(chain_code: [u8; 32], scalar: &[u8]) -> Result<Self> {
        let reduced = canonical_scalar(scalar)?.to_bytes();
        Ok(Self {
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: [0u8; 4],
            chain_code,
            public_key: scalar_mult_base(&reduced)?,
            private_key: Some(SecretScalar::from_reduced(reduced)),
        })
    }

    /// Root node from raw public material. The point must be on the curve.
    pub fn from_public_parts(chain_code: [u8; 32], point: &[u8]) -> Result<Self> {
        decompress(point)?;
        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(point);
        Ok(Self {
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: [0u8; 4],
            chain_code,
            private_key: None,
            public_key,
        })
    }

    /// Derive the child at `index`.
    ///
    /// With `want_private` the parent must hold a private scalar; otherwise
    /// the child is public-only even when the parent is private.
    pub fn child(&self, index: u32, want_private: bool) -> Result<Self> {
        let parent_scalar = match (want_private, &self.private_key) {
            (true, Some(scalar)) => Some(scalar),
            (true, None) => return Err(CryptoError::PrivateDerivationUnavailable),
            (false, _) => None,
        };

        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|e| CryptoError::Arithmetic(e.to_string()))?;
        mac.update(&self.public_key);
        mac.update(&index.to_be_bytes());
        let i = hmac_output(mac);

        let tweak = Zeroizing::new(reduce(&i[..32])?);
        let (private_key, public_key) = match parent_scalar {
            Some(parent) => {
                let scalar = Zeroizing::new(add_scalars(&tweak[..], parent.expose())?);
                let public_key = scalar_mult_base(&scalar[..])?;
                (Some(SecretScalar::from_reduced(*scalar)), public_key)
            }
            None => {
                let public_key = add_points(&self.public_key, &scalar_mult_base(&tweak[..])?)?;
                (None, public_key)
            }
        };

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);

        Ok(Self {
            depth: self.depth.saturating_add(1),
            parent_fingerprint: self.fingerprint(),
            child_index: index.to_be_bytes(),
            chain_code,
            private_key,
            public_key,
        })
    }

    /// Derive along a parsed path, left to right.
    ///
    /// An `m` path needs a private node; an `M` path is always walked with
    /// public-only derivation.
    pub fn derive(&self, path: &DerivationPath) -> Result<Self> {
        let want_private = match path.root() {
            PathRoot::Private if self.private_key.is_none() => {
                return Err(CryptoError::PrivateDerivationUnavailable)
            }
            PathRoot::Private => true,
            PathRoot::PublicOnly => false,
        };

        let (first, rest) = path
            .indices()
            .split_first()
            .ok_or_else(|| CryptoError::InvalidPath(path.to_string()))?;

        let mut node = self.child(*first, want_private)?;
        for &index in rest {
            node = node.child(index, want_private)?;
        }
        Ok(node)
    }

    /// Parse `path` and derive along it.
    pub fn derive_str(&self, path: &str) -> Result<Self> {
        self.derive(&path.parse()?)
    }

    /// A public-only copy of this node.
    pub fn public_view(&self) -> Self {
        Self {
            private_key: None,
            ..self.clone()
        }
    }

    /// First four bytes of `sha256(public_key)`.
    pub fn fingerprint(&self) -> [u8; 4] {
        let digest = Sha256::digest(self.public_key);
        let mut out = [0u8; 4];
        out.copy_from_slice(&digest[..4]);
        out
    }

    pub fn capability(&self) -> Capability {
        if self.private_key.is_some() {
            Capability::Private
        } else {
            Capability::PublicOnly
        }
    }

    pub fn is_private(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_index(&self) -> u32 {
        u32::from_be_bytes(self.child_index)
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    pub fn private_key(&self) -> Option<&SecretScalar> {
        self.private_key.as_ref()
    }

    /// Account identifier: the public point under the account-id version.
    pub fn account_id(&self, versions: &VersionBytes) -> String {
        strkey::encode(versions.account_id, &self.public_key)
    }

    /// Spend credential: the private scalar under the seed version.
    pub fn spend_seed(&self, versions: &VersionBytes) -> Result<Zeroizing<String>> {
        let scalar = self
            .private_key
            .as_ref()
            .ok_or(CryptoError::PrivateDerivationUnavailable)?;
        Ok(Zeroizing::new(strkey::encode(versions.seed, scalar.expose())))
    }

    /// `chain_code || private_key` under the master-private version.
    pub fn master_private_strkey(&self, versions: &VersionBytes) -> Result<Zeroizing<String>> {
        let scalar = self
            .private_key
            .as_ref()
            .ok_or(CryptoError::PrivateDerivationUnavailable)?;
        let mut raw = Zeroizing::new(Vec::with_capacity(64));
        raw.extend_from_slice(&self.chain_code);
        raw.extend_from_slice(scalar.expose());
        Ok(Zeroizing::new(strkey::encode(versions.master_private, &raw)))
    }

    /// `chain_code || public_key` under the master-public version.
    pub fn master_public_strkey(&self, versions: &VersionBytes) -> String {
        let mut raw = Vec::with_capacity(64);
        raw.extend_from_slice(&self.chain_code);
        raw.extend_from_slice(&self.public_key);
        strkey::encode(versions.master_public, &raw)
    }

    /// Inverse of [`Self::master_private_strkey`] / [`Self::master_public_strkey`].
    pub fn from_master_strkey(encoded: &str, versions: &VersionBytes) -> Result<Self> {
        let (version, raw) = strkey::decode_any(encoded)?;
        if raw.len() != 64 {
            return Err(CryptoError::InvalidEncoding(format!(
                "master key payload must be 64 bytes, got {}",
                raw.len()
            )));
        }
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&raw[..32]);

        if version == versions.master_private {
            Self::from_private_parts(chain_code, &raw[32..])
        } else if version == versions.master_public {
            Self::from_public_parts(chain_code, &raw[32..])
        } else {
            Err(CryptoError::VersionMismatch {
                expected: versions.master_public.0,
                actual: version.0,
            })
        }
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("capability", &self.capability())
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_index", &self.child_index())
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}

fn hmac_output(mac: HmacSha512) -> Zeroizing<[u8; 64]> {
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Generate a random seed of `len` bytes from the OS RNG.
pub fn generate_seed(len: usize) -> Result<Seed> {
    if len < MIN_SEED_LEN {
        return Err(CryptoError::SeedTooShort(len));
    }
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    Seed::new(bytes)
}
