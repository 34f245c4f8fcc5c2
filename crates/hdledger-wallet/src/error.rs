use crate::ledger::LookupError;
use hdledger_crypto::CryptoError;
use thiserror::Error;

/// Errors that can occur in discovery, selection and wallet encoding.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalletError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Malformed wallet envelope: {0}")]
    MalformedWalletEnvelope(String),

    #[error("Ledger lookup failed for {account_id}: {reason}")]
    LedgerLookupFailure {
        account_id: String,
        reason: LookupError,
    },

    #[error("Insufficient funds: requested {requested}, found {available}")]
    InsufficientFunds { requested: u32, available: u64 },

    #[error("Scan horizon exceeded on branch {branch} (limit {limit})")]
    HorizonExceeded { branch: String, limit: u32 },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Scan deadline exceeded")]
    DeadlineExceeded,

    #[error("Index {0} is outside the storable range")]
    IndexOutOfRange(u32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, WalletError>;
