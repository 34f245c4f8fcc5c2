use thiserror::Error;

/// Errors that can occur in key arithmetic, derivation and encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Seed too short: expected at least 16 bytes, got {0}")]
    SeedTooShort(usize),

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Invalid derivation path root: {0}")]
    InvalidPathRoot(String),

    #[error("Private derivation requires a private key")]
    PrivateDerivationUnavailable,

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Version byte mismatch: expected {expected:#04x}, got {actual:#04x}")]
    VersionMismatch { expected: u8, actual: u8 },

    #[error("Invalid checksum")]
    ChecksumInvalid,

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

impl From<std::num::ParseIntError> for CryptoError {
    fn from(e: std::num::ParseIntError) -> Self {
        CryptoError::InvalidPath(e.to_string())
    }
}
