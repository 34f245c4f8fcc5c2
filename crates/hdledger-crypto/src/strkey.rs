//! Checksummed base32 text encoding for keys, account ids and wallets.
//!
//! Format: `base32(version || payload || crc16_xmodem(version || payload))`
//! with the RFC 4648 alphabet, no padding, and the checksum little-endian.

use crate::error::{CryptoError, Result};
use crc::{Crc, CRC_16_XMODEM};
use zeroize::Zeroizing;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
const ALPHABET: base32::Alphabet = base32::Alphabet::RFC4648 { padding: false };

/// A single version byte tagging an encoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VersionByte(pub u8);

/// Version bytes used by a ledger network.
///
/// Built once and passed by reference to everything that encodes or decodes
/// text keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VersionBytes {
    /// Account identifiers ("G...")
    pub account_id: VersionByte,
    /// Seeds and spend credentials ("S...")
    pub seed: VersionByte,
    /// Master private key: chain code || scalar ("M...")
    pub master_private: VersionByte,
    /// Master public key: chain code || point ("P...")
    pub master_public: VersionByte,
    /// Serialized wallet with a private root ("W...")
    pub private_wallet: VersionByte,
    /// Serialized wallet with a public root ("Z...")
    pub public_wallet: VersionByte,
}

impl Default for VersionBytes {
    fn default() -> Self {
        Self {
            account_id: VersionByte(0x30),
            seed: VersionByte(0x90),
            master_private: VersionByte(0x60),
            master_public: VersionByte(0x78),
            private_wallet: VersionByte(0xb0),
            public_wallet: VersionByte(0xc8),
        }
    }
}

impl VersionBytes {
    /// All versions, in declaration order.
    pub fn all(&self) -> [VersionByte; 6] {
        [
            self.account_id,
            self.seed,
            self.master_private,
            self.master_public,
            self.private_wallet,
            self.public_wallet,
        ]
    }

    /// True when no two roles share a version byte.
    pub fn are_distinct(&self) -> bool {
        let all = self.all();
        all.iter()
            .enumerate()
            .all(|(i, v)| all[i + 1..].iter().all(|w| w != v))
    }
}

/// Encode a payload under a version byte.
pub fn encode(version: VersionByte, payload: &[u8]) -> String {
    let mut raw = Zeroizing::new(Vec::with_capacity(payload.len() + 3));
    raw.push(version.0);
    raw.extend_from_slice(payload);
    let checksum = CRC16.checksum(&raw);
    raw.extend_from_slice(&checksum.to_le_bytes());
    base32::encode(ALPHABET, &raw)
}

/// Decode a string, returning its version byte and payload.
pub fn decode_any(encoded: &str) -> Result<(VersionByte, Zeroizing<Vec<u8>>)> {
    let raw = Zeroizing::new(
        base32::decode(ALPHABET, encoded)
            .ok_or_else(|| CryptoError::InvalidEncoding("not valid base32".to_string()))?,
    );
    if raw.len() < 3 {
        return Err(CryptoError::InvalidEncoding(format!(
            "decoded length {} is too short",
            raw.len()
        )));
    }
    // Reject trailing bits that would let two strings decode to the same bytes.
    if base32::encode(ALPHABET, &raw) != encoded {
        return Err(CryptoError::InvalidEncoding("non-canonical base32".to_string()));
    }

    let (body, checksum) = raw.split_at(raw.len() - 2);
    let expected = CRC16.checksum(body);
    if checksum != expected.to_le_bytes() {
        return Err(CryptoError::ChecksumInvalid);
    }

    Ok((VersionByte(body[0]), Zeroizing::new(body[1..].to_vec())))
}

/// Decode a string that must carry the given version byte.
pub fn decode(expected: VersionByte, encoded: &str) -> Result<Zeroizing<Vec<u8>>> {
    let (version, payload) = decode_any(encoded)?;
    if version != expected {
        return Err(CryptoError::VersionMismatch {
            expected: expected.0,
            actual: version.0,
        });
    }
    Ok(payload)
}

/// Decode a fixed-length 32-byte payload such as an account id or seed.
pub fn decode_32(expected: VersionByte, encoded: &str) -> Result<Zeroizing<[u8; 32]>> {
    let payload = decode(expected, encoded)?;
    let mut out = Zeroizing::new([0u8; 32]);
    if payload.len() != out.len() {
        return Err(CryptoError::InvalidEncoding(format!(
            "expected 32-byte payload, got {}",
            payload.len()
        )));
    }
    out.copy_from_slice(&payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_prefix() {
        let versions = VersionBytes::default();
        let id = encode(versions.account_id, &[0u8; 32]);
        assert_eq!(id.len(), 56);
        assert!(id.starts_with('G'));

        let seed = encode(versions.seed, &[0u8; 32]);
        assert!(seed.starts_with('S'));
    }

    #[test]
    fn test_known_account_id() {
        // All-zero ed25519 key on the public network encoding.
        let id = encode(VersionByte(0x30), &[0u8; 32]);
        assert_eq!(id, "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF");
    }

    #[test]
    fn test_decode_roundtrip() {
        let payload: Vec<u8> = (0u8..77).collect();
        let encoded = encode(VersionByte(0xb0), &payload);
        let (version, decoded) = decode_any(&encoded).unwrap();
        assert_eq!(version, VersionByte(0xb0));
        assert_eq!(decoded.as_slice(), payload.as_slice());
    }

    #[test]
    fn test_decode_wrong_version() {
        let encoded = encode(VersionByte(0x30), &[7u8; 32]);
        let err = decode(VersionByte(0x90), &encoded).unwrap_err();
        assert_eq!(
            err,
            CryptoError::VersionMismatch {
                expected: 0x90,
                actual: 0x30
            }
        );
    }

    #[test]
    fn test_decode_bad_checksum() {
        let mut encoded = encode(VersionByte(0x30), &[7u8; 32]).into_bytes();
        // Flip a payload character to another valid base32 symbol.
        encoded[10] = if encoded[10] == b'A' { b'B' } else { b'A' };
        let encoded = String::from_utf8(encoded).unwrap();
        assert_eq!(
            decode(VersionByte(0x30), &encoded).unwrap_err(),
            CryptoError::ChecksumInvalid
        );
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_any("not base32!"),
            Err(CryptoError::InvalidEncoding(_))
        ));
        assert!(matches!(decode_any(""), Err(CryptoError::InvalidEncoding(_))));
    }

    #[test]
    fn test_decode_32_length() {
        let encoded = encode(VersionByte(0x90), &[1u8; 31]);
        assert!(matches!(
            decode_32(VersionByte(0x90), &encoded),
            Err(CryptoError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_default_versions_distinct() {
        assert!(VersionBytes::default().are_distinct());
        let mut versions = VersionBytes::default();
        versions.public_wallet = versions.seed;
        assert!(!versions.are_distinct());
    }
}
