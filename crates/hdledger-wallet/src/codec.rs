//! Wallet state envelope.
//!
//! Binary layout, all integers big-endian:
//!
//! ```text
//! tag            1   private_wallet or public_wallet version byte
//! root material 32   private scalar or public point
//! chain code    32
//! first funded   4   u32::MAX when none
//! first unused   4
//! map length     4
//! map entries  4*n   u32::MAX when none
//! ```
//!
//! The text form is the strkey encoding of the body under the tag. Since
//! `u32::MAX` stands for "none", [`Wallet`] never holds it as a funded index.

use crate::error::{Result, WalletError};
use crate::wallet::Wallet;
use hdledger_crypto::strkey::{self, VersionByte};
use hdledger_crypto::{CryptoError, ExtendedKey, VersionBytes};
use zeroize::Zeroizing;

/// Envelope value for "no funded index".
pub const NONE_SENTINEL: u32 = u32::MAX;

const HEADER_LEN: usize = 1 + 32 + 32 + 4 + 4 + 4;

/// Pack a wallet into its binary envelope.
pub fn serialize(wallet: &Wallet, versions: &VersionBytes) -> Zeroizing<Vec<u8>> {
    let root = wallet.root();
    let mut out = Zeroizing::new(Vec::with_capacity(
        HEADER_LEN + 4 * wallet.branch_map().len(),
    ));

    match root.private_key() {
        Some(scalar) => {
            out.push(versions.private_wallet.0);
            out.extend_from_slice(scalar.expose());
        }
        None => {
            out.push(versions.public_wallet.0);
            out.extend_from_slice(root.public_key());
        }
    }
    out.extend_from_slice(root.chain_code());
    out.extend_from_slice(&to_wire(wallet.first_with_money()).to_be_bytes());
    out.extend_from_slice(&wallet.first_unused().to_be_bytes());
    out.extend_from_slice(&(wallet.branch_map().len() as u32).to_be_bytes());
    for entry in wallet.branch_map() {
        out.extend_from_slice(&to_wire(*entry).to_be_bytes());
    }
    out
}

/// Unpack a binary envelope. The buffer length must match the declared
/// branch map length exactly.
pub fn deserialize(bytes: &[u8], versions: &VersionBytes) -> Result<Wallet> {
    if bytes.len() < HEADER_LEN {
        return Err(WalletError::MalformedWalletEnvelope(format!(
            "envelope is {} bytes, header needs {}",
            bytes.len(),
            HEADER_LEN
        )));
    }

    let mut reader = Reader::new(bytes);
    let tag = VersionByte(reader.byte()?);
    let material = reader.array::<32>()?;
    let chain_code = reader.array::<32>()?;

    let parts = if tag == versions.private_wallet {
        ExtendedKey::from_private_parts(*chain_code, &material[..])
    } else if tag == versions.public_wallet {
        ExtendedKey::from_public_parts(*chain_code, &material[..])
    } else {
        return Err(WalletError::MalformedWalletEnvelope(format!(
            "unknown wallet tag {:#04x}",
            tag.0
        )));
    };
    let root = parts.map_err(|e| {
        WalletError::MalformedWalletEnvelope(format!("invalid root material: {}", e))
    })?;

    let first_with_money = from_wire(reader.u32()?);
    let first_unused = reader.u32()?;
    let map_len = reader.u32()? as usize;

    let expected = map_len
        .checked_mul(4)
        .and_then(|n| n.checked_add(HEADER_LEN))
        .ok_or_else(|| WalletError::MalformedWalletEnvelope("branch map too long".to_string()))?;
    if bytes.len() != expected {
        return Err(WalletError::MalformedWalletEnvelope(format!(
            "branch map of {} entries needs {} bytes, got {}",
            map_len,
            expected,
            bytes.len()
        )));
    }

    let branch_map = (0..map_len)
        .map(|_| reader.u32().map(from_wire))
        .collect::<Result<Vec<_>>>()?;

    Wallet::from_parts(root, first_unused, first_with_money, branch_map)
}

/// Text form of the envelope.
pub fn encode_wallet(wallet: &Wallet, versions: &VersionBytes) -> Zeroizing<String> {
    let bytes = serialize(wallet, versions);
    Zeroizing::new(strkey::encode(VersionByte(bytes[0]), &bytes[1..]))
}

/// Parse the text form of the envelope.
pub fn decode_wallet(encoded: &str, versions: &VersionBytes) -> Result<Wallet> {
    let (version, body) = strkey::decode_any(encoded)?;
    if version != versions.private_wallet && version != versions.public_wallet {
        return Err(CryptoError::VersionMismatch {
            expected: versions.private_wallet.0,
            actual: version.0,
        }
        .into());
    }

    let mut bytes = Zeroizing::new(Vec::with_capacity(body.len() + 1));
    bytes.push(version.0);
    bytes.extend_from_slice(&body);
    deserialize(&bytes, versions)
}

fn to_wire(index: Option<u32>) -> u32 {
    index.unwrap_or(NONE_SENTINEL)
}

fn from_wire(raw: u32) -> Option<u32> {
    (raw != NONE_SENTINEL).then_some(raw)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            WalletError::MalformedWalletEnvelope(format!("truncated at byte {}", self.pos))
        })?;
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<Zeroizing<[u8; N]>> {
        let mut out = Zeroizing::new([0u8; N]);
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }
}
