//! HDLedger Crypto - key material for hierarchical deterministic ledger wallets.
//!
//! This crate provides:
//! - Scalar and point arithmetic on the Ed25519 curve
//! - Path-based child key derivation (private and public-only)
//! - Derivation path parsing
//! - Zeroizing secret handles
//! - Checksummed base32 key encoding (strkey)

pub mod arithmetic;
pub mod error;
pub mod hdkey;
pub mod path;
pub mod secret;
pub mod strkey;

pub use arithmetic::{add_points, add_scalars, reduce, scalar_mult_base};
pub use error::{CryptoError, Result};
pub use hdkey::{generate_seed, Capability, ExtendedKey, MIN_SEED_LEN};
pub use path::{DerivationPath, PathRoot};
pub use secret::{SecretScalar, Seed};
pub use strkey::{VersionByte, VersionBytes};
