//! Scoped handles for secret key material.
//!
//! Both handles wipe their backing memory on drop and redact themselves in
//! `Debug` output, so they can be held in structs that are logged.

use crate::error::{CryptoError, Result};
use crate::hdkey::MIN_SEED_LEN;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A reduced private scalar. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretScalar([u8; 32]);

impl SecretScalar {
    pub(crate) fn from_reduced(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the scalar bytes (CAUTION: sensitive)
    pub fn expose(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretScalar(<redacted>)")
    }
}

/// Wallet seed bytes. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Seed(Vec<u8>);

impl Seed {
    /// Wrap seed bytes, enforcing the 128-bit minimum.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_SEED_LEN {
            let len = bytes.len();
            let mut bytes = bytes;
            bytes.zeroize();
            return Err(CryptoError::SeedTooShort(len));
        }
        Ok(Self(bytes))
    }

    /// Copy seed bytes from a borrowed slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed(<{} bytes redacted>)", self.0.len())
    }
}
